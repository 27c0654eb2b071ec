use std::path::Path;

use common::{
    bench::{Record, Table},
    config::Settings,
    plot::{
        COMBINED_SIZE, ChartSpec, ChartStyle, Legend, Marker, Plot, Series, YScale, draw_chart,
        draw_text_panel, render_single,
    },
    stats::GroupStats,
};
use eyre::{Context, Result};
use itertools::{Itertools, MinMaxResult};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Efficiency axis is pinned so super-linear runs stay visible above the
/// 100% line.
pub const EFFICIENCY_AXIS: (f64, f64) = (0.0, 110.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Standalone image
    Full,
    /// One panel of the combined image
    Panel,
}

impl Layout {
    fn series_label(&self, dataset: &str) -> String {
        match self {
            Layout::Full => format!("Dataset {dataset}"),
            Layout::Panel => dataset.to_owned(),
        }
    }

    fn title(&self, name: &str, bench_title: &str) -> String {
        match self {
            Layout::Full => format!("{name} ({bench_title})"),
            Layout::Panel => name.to_owned(),
        }
    }

    fn threads_label(&self) -> &'static str {
        match self {
            Layout::Full => "Number of threads",
            Layout::Panel => "Threads",
        }
    }
}

fn max_threads(table: &Table) -> f64 {
    table.max_threads().unwrap_or(1) as f64
}

fn threads_range(table: &Table) -> (f64, f64) {
    (0.0, max_threads(table) + 1.0)
}

/// One series per dataset, points ordered by thread count
fn dataset_series(
    table: &Table,
    layout: Layout,
    marker: Marker,
    value: fn(&Record) -> f64,
    keep: fn(&Record) -> bool,
) -> Vec<Series> {
    table
        .groups()
        .iter()
        .map(|group| Series {
            label: layout.series_label(group.dataset),
            points: group
                .sorted_by_threads()
                .into_iter()
                .filter(|r| keep(r))
                .map(|r| (r.threads as f64, value(r)))
                .collect(),
            marker: Some(marker),
        })
        .collect()
}

pub fn speedup_chart(table: &Table, layout: Layout, bench_title: &str) -> ChartSpec {
    let max_threads = max_threads(table);
    let max_speedup = table
        .records()
        .iter()
        .map(|r| r.speedup)
        .fold(max_threads, f64::max);

    let mut series = dataset_series(table, layout, Marker::Circle, |r| r.speedup, |_| true);
    let ideal = match layout {
        Layout::Full => "Ideal speedup",
        Layout::Panel => "Ideal",
    };
    series.push(Series::reference(
        ideal,
        vec![(1.0, 1.0), (max_threads, max_threads)],
    ));

    ChartSpec {
        title: layout.title("Speedup vs Threads", bench_title),
        x_label: layout.threads_label().to_owned(),
        y_label: "Speedup".to_owned(),
        x_range: threads_range(table),
        y_range: (0.0, max_speedup * 1.1),
        y_scale: YScale::Linear,
        legend: Legend::UpperLeft,
        series,
    }
}

pub fn efficiency_chart(table: &Table, layout: Layout, bench_title: &str) -> ChartSpec {
    let (x_min, x_max) = threads_range(table);
    let mut series = dataset_series(table, layout, Marker::Square, |r| r.efficiency, |_| true);
    let ideal = match layout {
        Layout::Full => "Ideal efficiency",
        Layout::Panel => "Ideal",
    };
    series.push(Series::reference(ideal, vec![(x_min, 100.0), (x_max, 100.0)]));

    ChartSpec {
        title: layout.title("Efficiency vs Threads", bench_title),
        x_label: layout.threads_label().to_owned(),
        y_label: "Efficiency (%)".to_owned(),
        x_range: (x_min, x_max),
        y_range: EFFICIENCY_AXIS,
        y_scale: YScale::Linear,
        legend: Legend::LowerLeft,
        series,
    }
}

/// Times are drawn on a log axis, so non-positive times are left out
pub fn execution_time_chart(table: &Table, layout: Layout, bench_title: &str) -> ChartSpec {
    let y_range = match table
        .records()
        .iter()
        .map(|r| r.time_ms)
        .filter(|t| *t > 0.0)
        .minmax_by(|a, b| a.total_cmp(b))
    {
        MinMaxResult::NoElements => (1.0, 10.0),
        MinMaxResult::OneElement(t) => (t / 2.0, t * 2.0),
        MinMaxResult::MinMax(min, max) => (min / 1.5, max * 1.5),
    };

    let y_label = match layout {
        Layout::Full => "Execution time (ms)",
        Layout::Panel => "Time (ms)",
    };

    ChartSpec {
        title: layout.title("Execution Time vs Threads", bench_title),
        x_label: layout.threads_label().to_owned(),
        y_label: y_label.to_owned(),
        x_range: threads_range(table),
        y_range,
        y_scale: YScale::Log,
        legend: Legend::UpperLeft,
        series: dataset_series(table, layout, Marker::Triangle, |r| r.time_ms, |r| {
            r.time_ms > 0.0
        }),
    }
}

/// Text of the summary panel, datasets in order of first appearance
pub fn summary_lines(table: &Table) -> Result<Vec<String>> {
    let mut lines = vec!["Performance Summary".to_owned(), "=".repeat(40), String::new()];
    for group in table.groups() {
        let stats = GroupStats::compute(&group)?;
        lines.push(format!("Dataset: {}", group.dataset));
        lines.push(format!(
            "  Best speedup: {:.2}x ({} threads)",
            stats.max_speedup, stats.max_speedup_threads
        ));
        lines.push(format!("  Best efficiency: {:.1}%", stats.max_efficiency));
        lines.push(String::new());
    }
    Ok(lines)
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SpeedupPlot;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EfficiencyPlot;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ExecutionTimePlot;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CombinedPlot;

#[typetag::serde]
impl Plot for SpeedupPlot {
    fn filename(&self) -> &'static str {
        "speedup_plot.png"
    }

    fn render(
        &self,
        table: &Table,
        settings: &Settings,
        filepath: &Path,
    ) -> Result<Vec<ChartSpec>> {
        let spec = speedup_chart(table, Layout::Full, &settings.title);
        render_single(&spec, filepath)?;
        Ok(vec![spec])
    }
}

#[typetag::serde]
impl Plot for EfficiencyPlot {
    fn filename(&self) -> &'static str {
        "efficiency_plot.png"
    }

    fn render(
        &self,
        table: &Table,
        settings: &Settings,
        filepath: &Path,
    ) -> Result<Vec<ChartSpec>> {
        let spec = efficiency_chart(table, Layout::Full, &settings.title);
        render_single(&spec, filepath)?;
        Ok(vec![spec])
    }
}

#[typetag::serde]
impl Plot for ExecutionTimePlot {
    fn filename(&self) -> &'static str {
        "execution_time_plot.png"
    }

    fn render(
        &self,
        table: &Table,
        settings: &Settings,
        filepath: &Path,
    ) -> Result<Vec<ChartSpec>> {
        let spec = execution_time_chart(table, Layout::Full, &settings.title);
        render_single(&spec, filepath)?;
        Ok(vec![spec])
    }
}

#[typetag::serde]
impl Plot for CombinedPlot {
    fn filename(&self) -> &'static str {
        "combined_analysis.png"
    }

    fn render(
        &self,
        table: &Table,
        settings: &Settings,
        filepath: &Path,
    ) -> Result<Vec<ChartSpec>> {
        let specs = vec![
            speedup_chart(table, Layout::Panel, &settings.title),
            efficiency_chart(table, Layout::Panel, &settings.title),
            execution_time_chart(table, Layout::Panel, &settings.title),
        ];
        let summary = summary_lines(table)?;

        let root = BitMapBackend::new(filepath, COMBINED_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(
            &format!("{} - Performance Analysis", settings.title),
            ("sans-serif", 36),
        )?;
        let panels = root.split_evenly((2, 2));
        for (panel, spec) in panels.iter().zip(&specs) {
            draw_chart(panel, spec, ChartStyle::PANEL)?;
        }
        draw_text_panel(&panels[3], &summary, ChartStyle::PANEL)?;
        root.present()
            .with_context(|| format!("Write chart {}", filepath.display()))?;
        debug!("Combined panel drawn with {} charts", specs.len());

        Ok(specs)
    }
}

/// The four charts written on a default run
pub fn default_plots() -> Vec<Box<dyn Plot>> {
    vec![
        Box::new(SpeedupPlot),
        Box::new(EfficiencyPlot),
        Box::new(ExecutionTimePlot),
        Box::new(CombinedPlot),
    ]
}
