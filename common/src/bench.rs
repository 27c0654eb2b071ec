use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File {} not found", .0.display())]
    FileNotFound(PathBuf),
    /// Also carries read failures, the csv reader owns the file handle
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A single measurement produced by the benchmark runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Dataset")]
    pub dataset: String,
    #[serde(rename = "Threads")]
    pub threads: u32,
    #[serde(rename = "Time_ms")]
    pub time_ms: f64,
    #[serde(rename = "Speedup")]
    pub speedup: f64,
    /// Percentage, may exceed 100 for super-linear runs
    #[serde(rename = "Efficiency")]
    pub efficiency: f64,
}

/// All records of a run, in the order they were read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
}

/// Records sharing a dataset label, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub dataset: &'a str,
    pub records: Vec<&'a Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_threads(&self) -> Option<u32> {
        self.records.iter().map(|r| r.threads).max()
    }

    /// Groups the records by dataset. Groups come out in order of first
    /// appearance of their label.
    pub fn groups(&self) -> Vec<Group<'_>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<Group<'_>> = Vec::new();
        for record in &self.records {
            let idx = *index.entry(record.dataset.as_str()).or_insert_with(|| {
                groups.push(Group {
                    dataset: &record.dataset,
                    records: Vec::new(),
                });
                groups.len() - 1
            });
            groups[idx].records.push(record);
        }
        groups
    }
}

impl Group<'_> {
    /// Stable sort, records with equal thread counts keep their input order
    pub fn sorted_by_threads(&self) -> Vec<&Record> {
        let mut sorted = self.records.clone();
        sorted.sort_by_key(|r| r.threads);
        sorted
    }
}

pub fn load_table(path: &Path) -> Result<Table, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let records = reader
        .deserialize::<Record>()
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(Table::new(records))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use super::*;

    pub(crate) fn record(
        dataset: &str,
        threads: u32,
        time_ms: f64,
        speedup: f64,
        eff: f64,
    ) -> Record {
        Record {
            dataset: dataset.to_owned(),
            threads,
            time_ms,
            speedup,
            efficiency: eff,
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        match load_table(&path) {
            Err(LoadError::FileNotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn loads_rows_in_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Dataset,Threads,Time_ms,Speedup,Efficiency").unwrap();
        writeln!(file, "small,1,1000.0,1.0,100.0").unwrap();
        writeln!(file, "small,4,300.0,3.33,83.3").unwrap();
        writeln!(file, "large, 2 ,520.5,1.92,96.0").unwrap();
        file.flush().unwrap();

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[1], record("small", 4, 300.0, 3.33, 83.3));
        assert_eq!(table.records()[2].threads, 2);
        assert_eq!(table.max_threads(), Some(4));
    }

    #[test]
    fn malformed_row_is_a_csv_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Dataset,Threads,Time_ms,Speedup,Efficiency").unwrap();
        writeln!(file, "small,many,1000.0,1.0,100.0").unwrap();
        file.flush().unwrap();

        assert!(matches!(load_table(file.path()), Err(LoadError::Csv(_))));
    }

    #[test]
    fn unreadable_path_is_a_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        match load_table(dir.path()) {
            Err(LoadError::Csv(err)) => assert!(err.is_io_error()),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn groups_follow_first_appearance() {
        let table = Table::new(vec![
            record("b", 1, 10.0, 1.0, 100.0),
            record("a", 1, 20.0, 1.0, 100.0),
            record("b", 2, 6.0, 1.6, 80.0),
        ]);
        let groups = table.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].dataset, "b");
        assert_eq!(groups[0].records.len(), 2);
        assert_eq!(groups[1].dataset, "a");
    }

    #[test]
    fn sort_is_stable() {
        let table = Table::new(vec![
            record("a", 4, 3.0, 3.0, 75.0),
            record("a", 1, 10.0, 1.0, 100.0),
            record("a", 4, 2.9, 3.1, 77.0),
        ]);
        let groups = table.groups();
        let sorted = groups[0].sorted_by_threads();
        assert_eq!(sorted[0].threads, 1);
        assert_eq!(sorted[1].time_ms, 3.0);
        assert_eq!(sorted[2].time_ms, 2.9);
    }
}
