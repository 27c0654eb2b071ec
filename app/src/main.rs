use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use common::{bench::LoadError, config::Settings};
use eyre::{Result, eyre};
use scaling_report::pipeline;
use tracing::{debug, error};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const MODULES: &[&str] = &["common", "scaling_basic"];

/// Charts and a text report from a thread-scaling benchmark CSV
#[derive(Parser)]
struct Cli {
    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Benchmark CSV, overrides the settings file
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Where charts and the report are written, overrides the settings file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Do not generate plots
    #[arg(long, default_value_t = false)]
    skip_plot: bool,
    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(short, long)]
    log: Vec<String>,
}

fn init_tracing(args: &Cli) -> Result<Option<WorkerGuard>> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let mut env_filter = EnvFilter::new(format!("scaling_report={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let filename = path
                .file_name()
                .ok_or_else(|| eyre!("Invalid log file {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."));
            let file_appender = tracing_appender::rolling::never(dir, filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            (
                Some(layer().with_writer(non_blocking).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn load_settings(args: &Cli) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(input) = &args.input {
        settings.input = input.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        settings.output_dir = output_dir.clone();
    }
    if settings.plots.is_empty() {
        settings.plots = scaling_basic::default_plots();
    }
    Ok(settings)
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    // dropped on every return path so buffered file logs are flushed
    let _guard = init_tracing(&args)?;
    let settings = load_settings(&args)?;
    debug!(
        "input={} output_dir={} plots={}",
        settings.input.display(),
        settings.output_dir.display(),
        settings.plots.len()
    );

    if let Err(err) = pipeline::run(&settings, args.skip_plot) {
        if let Some(LoadError::FileNotFound(path)) = err.downcast_ref::<LoadError>() {
            println!("ERROR: File {} not found!", path.display());
            println!("Run './run_tests.sh' first to generate the results.");
            return Ok(ExitCode::FAILURE);
        }
        error!("{err:#?}");
        return Err(err);
    }

    Ok(ExitCode::SUCCESS)
}
