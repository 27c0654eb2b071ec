use std::fs;

use eyre::{Context, Result};
use tracing::debug;

use crate::{
    bench::Table,
    config::{Settings, Thresholds},
    stats::GroupStats,
};

const RULE_WIDTH: usize = 60;

fn rule(c: char) -> String {
    c.to_string().repeat(RULE_WIDTH)
}

/// Builds the text report. Identical tables give byte-identical reports.
pub fn render_report(table: &Table, title: &str, thresholds: &Thresholds) -> Result<String> {
    let mut report = vec![
        rule('='),
        format!("PERFORMANCE REPORT - {title}"),
        rule('='),
        String::new(),
    ];

    for group in table.groups() {
        let stats = GroupStats::compute(&group)?;

        report.push(format!("\n{}", rule('=')));
        report.push(format!("Dataset: {}", group.dataset.to_uppercase()));
        report.push(rule('='));
        report.push(String::new());
        report.push(format!(
            "{:<10} {:<15} {:<12} {:<12}",
            "Threads", "Time (ms)", "Speedup", "Efficiency"
        ));
        report.push(rule('-'));

        for record in group.sorted_by_threads() {
            report.push(format!(
                "{:<10} {:<15.2} {:<12.2} {:<12.1}%",
                record.threads, record.time_ms, record.speedup, record.efficiency
            ));
        }

        report.push(String::new());
        report.push("Statistics:".to_owned());
        report.push(format!(
            "  • Best speedup: {:.2}x ({} threads)",
            stats.max_speedup, stats.max_speedup_threads
        ));
        report.push(format!(
            "  • Best efficiency: {:.1}% ({} threads)",
            stats.max_efficiency, stats.max_efficiency_threads
        ));
        report.push(format!("  • Serial time: {:.2} ms", stats.serial_time));
        report.push(format!(
            "  • Parallel time (max threads): {:.2} ms",
            stats.min_parallel_time
        ));

        report.push(String::new());
        report.push("Scalability analysis:".to_owned());
        report.push(format!("  • {}", stats.scalability(thresholds)));
        report.push(format!("  • {}", stats.retention(thresholds)));
    }

    report.push(String::new());
    report.push(rule('='));
    report.push("END OF REPORT".to_owned());
    report.push(rule('='));

    Ok(report.join("\n"))
}

/// Writes the report next to the charts and returns its contents
pub fn write_report(table: &Table, settings: &Settings) -> Result<String> {
    let report = render_report(table, &settings.title, &settings.thresholds)?;
    let path = settings.report_path();
    fs::write(&path, &report).with_context(|| format!("Write report {}", path.display()))?;
    debug!("Report written to {}", path.display());
    Ok(report)
}
