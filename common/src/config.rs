use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::plot::Plot;

pub const DEFAULT_TITLE: &str = "K-means 1D - OpenMP";
pub const DEFAULT_INPUT: &str = "results/benchmarks/speedup_results.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "results/benchmarks";

/// Fraction of the ideal (linear) speedup at the highest thread count
pub const DEFAULT_EXCELLENT_SCALING: f64 = 0.9;
pub const DEFAULT_GOOD_SCALING: f64 = 0.7;
pub const DEFAULT_MODERATE_SCALING: f64 = 0.5;

/// Efficiency percentage at the highest thread count
pub const DEFAULT_EFFICIENCY_MAINTAINED: f64 = 70.0;
pub const DEFAULT_EFFICIENCY_REASONABLE: f64 = 50.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Benchmark name used in chart and report titles
    pub title: String,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Write the plotted series to `<output_dir>/plot_data/*.json`
    pub dump_plot_data: bool,
    pub thresholds: Thresholds,
    pub plots: Vec<Box<dyn Plot>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub excellent: f64,
    pub good: f64,
    pub moderate: f64,
    pub efficiency_maintained: f64,
    pub efficiency_reasonable: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            excellent: DEFAULT_EXCELLENT_SCALING,
            good: DEFAULT_GOOD_SCALING,
            moderate: DEFAULT_MODERATE_SCALING,
            efficiency_maintained: DEFAULT_EFFICIENCY_MAINTAINED,
            efficiency_reasonable: DEFAULT_EFFICIENCY_REASONABLE,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dump_plot_data: false,
            thresholds: Thresholds::default(),
            plots: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yml::from_str(yaml).context("Parse settings")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Read config file {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("performance_report.txt")
    }
}
