use core::fmt::Debug;
use std::{
    fs,
    path::{Path, PathBuf},
};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result};
use plotters::{coord::Shift, prelude::*, series::DashedLineSeries};
use serde::Serialize;
use tracing::debug;

use crate::{bench::Table, config::Settings};

pub const CHART_SIZE: (u32, u32) = (1200, 720);
pub const COMBINED_SIZE: (u32, u32) = (1680, 1200);

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone {
    /// File name of the produced image, ie. `speedup_plot.png`
    fn filename(&self) -> &'static str;
    /// Draws the chart into `filepath`
    ///
    /// Returns the charts that were drawn so their data can be dumped
    /// alongside the image.
    fn render(&self, table: &Table, settings: &Settings, filepath: &Path) -> Result<Vec<ChartSpec>>;
}
clone_trait_object!(Plot);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum YScale {
    Linear,
    Log,
}

/// Corner the legend box is anchored to, chosen per chart to stay clear of
/// the data at the highest thread counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Legend {
    UpperLeft,
    LowerLeft,
}

impl From<Legend> for SeriesLabelPosition {
    fn from(legend: Legend) -> Self {
        match legend {
            Legend::UpperLeft => SeriesLabelPosition::UpperLeft,
            Legend::LowerLeft => SeriesLabelPosition::LowerLeft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    /// `None` for reference lines, which are drawn dashed
    pub marker: Option<Marker>,
}

/// Everything needed to draw one set of axes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub y_scale: YScale,
    pub legend: Legend,
    pub series: Vec<Series>,
}

impl Series {
    pub fn reference(label: &str, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.to_owned(),
            points,
            marker: None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.marker.is_none()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChartStyle {
    pub caption_size: u32,
    pub label_size: u32,
    pub margin: u32,
    pub marker_size: i32,
}

impl ChartStyle {
    pub const FULL: ChartStyle = ChartStyle {
        caption_size: 30,
        label_size: 20,
        margin: 20,
        marker_size: 6,
    };
    pub const PANEL: ChartStyle = ChartStyle {
        caption_size: 24,
        label_size: 16,
        margin: 12,
        marker_size: 4,
    };
}

macro_rules! draw_contents {
    ($chart:expr, $spec:expr, $style:expr) => {{
        $chart
            .configure_mesh()
            .x_desc($spec.x_label.as_str())
            .y_desc($spec.y_label.as_str())
            .axis_desc_style(("sans-serif", $style.label_size))
            .bold_line_style(BLACK.mix(0.15))
            .light_line_style(BLACK.mix(0.05))
            .draw()?;

        let mut color_idx = 0;
        for series in &$spec.series {
            let points = series.points.clone();
            match series.marker {
                None => {
                    let color = BLACK.mix(0.5);
                    $chart
                        .draw_series(DashedLineSeries::new(
                            points,
                            10,
                            6,
                            color.stroke_width(2),
                        ))?
                        .label(series.label.as_str())
                        .legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        });
                }
                Some(marker) => {
                    let color = Palette99::pick(color_idx).to_rgba();
                    color_idx += 1;
                    let size = $style.marker_size;
                    match marker {
                        Marker::Circle => {
                            $chart.draw_series(
                                points.iter().map(|&p| Circle::new(p, size, color.filled())),
                            )?;
                        }
                        Marker::Square => {
                            $chart.draw_series(points.iter().map(|&p| {
                                EmptyElement::at(p)
                                    + Rectangle::new([(-size, -size), (size, size)], color.filled())
                            }))?;
                        }
                        Marker::Triangle => {
                            $chart.draw_series(
                                points
                                    .iter()
                                    .map(|&p| TriangleMarker::new(p, size + 1, color.filled())),
                            )?;
                        }
                    }
                    $chart
                        .draw_series(LineSeries::new(points, color.stroke_width(2)))?
                        .label(series.label.as_str())
                        .legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                        });
                }
            }
        }

        $chart
            .configure_series_labels()
            .position($spec.legend.into())
            .label_font(("sans-serif", $style.label_size))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }};
}

/// Draws a single chart onto `area`
pub fn draw_chart<DB>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    style: ChartStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    builder
        .caption(spec.title.as_str(), ("sans-serif", style.caption_size))
        .margin(style.margin)
        .x_label_area_size(style.label_size * 3)
        .y_label_area_size(style.label_size * 4);

    let x_range = spec.x_range.0..spec.x_range.1;
    let y_range = spec.y_range.0..spec.y_range.1;
    match spec.y_scale {
        YScale::Linear => {
            let mut chart = builder.build_cartesian_2d(x_range, y_range)?;
            draw_contents!(chart, spec, style);
        }
        YScale::Log => {
            let mut chart = builder.build_cartesian_2d(x_range, y_range.log_scale())?;
            draw_contents!(chart, spec, style);
        }
    }
    Ok(())
}

/// Draws monospaced lines of text on a shaded box, used for summary panels
pub fn draw_text_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    lines: &[String],
    style: ChartStyle,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, height) = area.dim_in_pixel();
    let (w, h) = (width as i32, height as i32);
    let wheat = RGBColor(245, 222, 179);
    area.draw(&Rectangle::new(
        [(w / 10 - 10, h / 10 - 10), (w - w / 10, h - h / 10)],
        wheat.mix(0.5).filled(),
    ))?;

    let line_height = style.label_size as i32 + 6;
    for (i, line) in lines.iter().enumerate() {
        area.draw(&Text::new(
            line.as_str(),
            (w / 10, h / 10 + i as i32 * line_height),
            ("monospace", style.label_size).into_font().color(&BLACK),
        ))?;
    }
    Ok(())
}

/// Renders a single chart to a PNG
pub fn render_single(spec: &ChartSpec, filepath: &Path) -> Result<()> {
    let root = BitMapBackend::new(filepath, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    draw_chart(&root, spec, ChartStyle::FULL)?;
    root.present()
        .with_context(|| format!("Write chart {}", filepath.display()))?;
    Ok(())
}

pub fn write_plot_data(plot_dir: &Path, filename: &str, specs: &[ChartSpec]) -> Result<PathBuf> {
    let plot_data_dir = plot_dir.join("plot_data");
    if !plot_data_dir.exists() {
        fs::create_dir_all(&plot_data_dir)?;
    }
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let data_path = plot_data_dir.join(format!("{stem}.json"));
    fs::write(&data_path, serde_json::to_string_pretty(specs)?)?;
    Ok(data_path)
}

/// Runs every configured plot in order, calling `on_saved` after each image
/// is written
pub fn plot(
    plots: &[Box<dyn Plot>],
    table: &Table,
    settings: &Settings,
    mut on_saved: impl FnMut(&Path),
) -> Result<Vec<PathBuf>> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(Vec::new());
    }

    let mut written = Vec::with_capacity(plots.len());
    for plot in plots {
        let filepath = settings.output_dir.join(plot.filename());
        debug!("Rendering {}", filepath.display());
        let specs = plot
            .render(table, settings, &filepath)
            .with_context(|| format!("Render {}", plot.filename()))?;
        if settings.dump_plot_data {
            let data_path = write_plot_data(&settings.output_dir, plot.filename(), &specs)?;
            debug!("Plot data written to {}", data_path.display());
        }
        on_saved(&filepath);
        written.push(filepath);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ChartSpec {
        ChartSpec {
            title: "Speedup".to_owned(),
            x_label: "Threads".to_owned(),
            y_label: "Speedup".to_owned(),
            x_range: (0.0, 4.2),
            y_range: (0.0, 4.4),
            y_scale: YScale::Linear,
            legend: Legend::UpperLeft,
            series: vec![
                Series {
                    label: "Dataset a".to_owned(),
                    points: vec![(1.0, 1.0), (4.0, 3.3)],
                    marker: Some(Marker::Circle),
                },
                Series::reference("Ideal speedup", vec![(1.0, 1.0), (4.0, 4.0)]),
            ],
        }
    }

    #[test]
    fn reference_series_have_no_marker() {
        let spec = spec();
        assert!(!spec.series[0].is_reference());
        assert!(spec.series[1].is_reference());
    }

    #[test]
    fn legend_maps_to_plotters_corner() {
        assert!(matches!(
            SeriesLabelPosition::from(Legend::UpperLeft),
            SeriesLabelPosition::UpperLeft
        ));
        assert!(matches!(
            SeriesLabelPosition::from(Legend::LowerLeft),
            SeriesLabelPosition::LowerLeft
        ));
    }

    #[test]
    fn single_chart_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("speedup_plot.png");
        render_single(&spec(), &filepath).unwrap();
        assert!(fs::metadata(&filepath).unwrap().len() > 0);
    }

    #[test]
    fn plot_data_lands_next_to_charts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plot_data(dir.path(), "speedup_plot.png", &[spec()]).unwrap();
        assert_eq!(path, dir.path().join("plot_data").join("speedup_plot.json"));

        let dumped: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(dumped[0]["title"], "Speedup");
        assert_eq!(dumped[0]["series"][1]["marker"], serde_json::Value::Null);
        assert_eq!(dumped[0]["y_scale"], "Linear");
        assert_eq!(dumped[0]["legend"], "UpperLeft");
    }

    #[test]
    fn no_plots_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let written = plot(&[], &Table::default(), &settings, |_| {}).unwrap();
        assert!(written.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
