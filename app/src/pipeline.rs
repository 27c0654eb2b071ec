use std::{fs::create_dir_all, path::PathBuf};

use common::{
    bench::{Table, load_table},
    config::Settings,
    plot::plot,
    report::write_report,
};
use eyre::{Context, Result};
use tracing::{debug, info};

const BANNER_WIDTH: usize = 60;

/// Files produced by a run
#[derive(Debug)]
pub struct Outcome {
    pub records: usize,
    pub charts: Vec<PathBuf>,
    pub report_path: PathBuf,
    pub report: String,
}

impl Outcome {
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.charts.iter().chain(std::iter::once(&self.report_path))
    }
}

fn banner(text: &str) {
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("{text}");
    println!("{}", "=".repeat(BANNER_WIDTH));
}

/// Loads the table, then draws the charts and writes the report.
///
/// A missing input fails with [`common::bench::LoadError::FileNotFound`]
/// before anything is written.
pub fn run(settings: &Settings, skip_plot: bool) -> Result<Outcome> {
    banner(&format!("{} - Results Analysis", settings.title));
    println!();

    println!("Loading results...");
    let table: Table = load_table(&settings.input)?;
    println!("✓ {} records loaded", table.len());
    println!();
    info!(
        "Loaded {} records in {} datasets",
        table.len(),
        table.groups().len()
    );

    create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "Create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let charts = if skip_plot {
        debug!("Skipping plots");
        Vec::new()
    } else {
        println!("Generating charts...");
        let charts = plot(&settings.plots, &table, settings, |path| {
            println!("✓ Chart saved: {}", path.display())
        })?;
        println!();
        charts
    };

    println!("Generating report...");
    let report = write_report(&table, settings)?;
    let report_path = settings.report_path();
    println!("✓ Report saved: {}", report_path.display());
    println!("\n{report}");
    println!();

    banner("Analysis complete!");
    println!();

    let outcome = Outcome {
        records: table.len(),
        charts,
        report_path,
        report,
    };
    println!("Generated files:");
    for file in outcome.files() {
        println!("  • {}", file.display());
    }
    Ok(outcome)
}
