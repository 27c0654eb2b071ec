use std::fs;

use common::{bench::LoadError, config::Settings};
use scaling_basic::default_plots;
use scaling_report::pipeline::run;

const CSV: &str = "Dataset,Threads,Time_ms,Speedup,Efficiency
small,1,1000.0,1.0,100.0
small,2,520.0,1.92,96.0
small,4,300.0,3.33,83.3
large,1,8000.0,1.0,100.0
large,2,4100.0,1.95,97.5
large,4,2300.0,3.48,87.0
large,8,1600.0,5.0,62.5
";

fn settings(dir: &std::path::Path) -> Settings {
    Settings {
        input: dir.join("speedup_results.csv"),
        output_dir: dir.join("out"),
        ..Default::default()
    }
}

#[test]
fn missing_input_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());

    let err = run(&settings, false).unwrap_err();
    match err.downcast_ref::<LoadError>() {
        Some(LoadError::FileNotFound(path)) => assert_eq!(path, &settings.input),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!settings.output_dir.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn report_is_identical_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::write(&settings.input, CSV).unwrap();

    let first = run(&settings, true).unwrap();
    let first_bytes = fs::read(&first.report_path).unwrap();
    let second = run(&settings, true).unwrap();
    let second_bytes = fs::read(&second.report_path).unwrap();

    assert_eq!(first.records, 7);
    assert!(first.charts.is_empty());
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(first.report.as_bytes(), first_bytes.as_slice());
    assert_eq!(
        first.report_path,
        settings.output_dir.join("performance_report.txt")
    );
}

#[test]
fn report_covers_each_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::write(&settings.input, CSV).unwrap();

    let outcome = run(&settings, true).unwrap();
    let small = outcome.report.find("Dataset: SMALL").unwrap();
    let large = outcome.report.find("Dataset: LARGE").unwrap();
    assert!(small < large);
    assert!(outcome.report.contains("  • Best speedup: 5.00x (8 threads)"));
    assert!(outcome.report.contains("  • Moderate scalability"));
    assert!(outcome.report.contains("  • Reasonable efficiency with many threads"));
    assert_eq!(outcome.files().count(), 1);
}

#[test]
fn missing_serial_baseline_fails() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    fs::write(
        &settings.input,
        "Dataset,Threads,Time_ms,Speedup,Efficiency\nx,2,10.0,1.9,95.0\n",
    )
    .unwrap();

    let err = run(&settings, true).unwrap_err();
    assert!(format!("{err}").contains("serial"));
}

#[test]
fn default_run_writes_all_five_files() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        plots: default_plots(),
        ..settings(dir.path())
    };
    fs::write(&settings.input, CSV).unwrap();

    let outcome = run(&settings, false).unwrap();
    let expected = [
        "speedup_plot.png",
        "efficiency_plot.png",
        "execution_time_plot.png",
        "combined_analysis.png",
        "performance_report.txt",
    ]
    .map(|name| settings.output_dir.join(name));

    assert_eq!(outcome.files().cloned().collect::<Vec<_>>(), expected);
    for file in &expected {
        assert!(fs::metadata(file).unwrap().len() > 0, "{} is empty", file.display());
    }
}
