use core::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{bench::Group, config::Thresholds};

#[derive(Error, Debug, PartialEq)]
pub enum StatsError {
    #[error("Dataset {0} has no records")]
    EmptyGroup(String),
    #[error("Dataset {0} has no single-thread (serial) record")]
    MissingSerialBaseline(String),
}

/// Summary of one dataset's scaling run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub max_speedup: f64,
    pub max_speedup_threads: u32,
    pub max_efficiency: f64,
    pub max_efficiency_threads: u32,
    /// Time of the threads == 1 record
    pub serial_time: f64,
    /// Smallest time across every record of the group
    pub min_parallel_time: f64,
    pub max_threads: u32,
    /// Efficiency at the highest thread count
    pub last_efficiency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scalability {
    Excellent,
    Good,
    Moderate,
    Limited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Retention {
    Maintained,
    Reasonable,
    SignificantLoss,
}

impl GroupStats {
    /// Maxima keep the first record reaching them, in input order.
    pub fn compute(group: &Group<'_>) -> Result<Self, StatsError> {
        let first = group
            .records
            .first()
            .ok_or_else(|| StatsError::EmptyGroup(group.dataset.to_owned()))?;

        let serial_time = group
            .records
            .iter()
            .find(|r| r.threads == 1)
            .map(|r| r.time_ms)
            .ok_or_else(|| StatsError::MissingSerialBaseline(group.dataset.to_owned()))?;

        let mut stats = GroupStats {
            max_speedup: first.speedup,
            max_speedup_threads: first.threads,
            max_efficiency: first.efficiency,
            max_efficiency_threads: first.threads,
            serial_time,
            min_parallel_time: first.time_ms,
            max_threads: first.threads,
            last_efficiency: first.efficiency,
        };

        for record in group.records.iter().skip(1) {
            if record.speedup > stats.max_speedup {
                stats.max_speedup = record.speedup;
                stats.max_speedup_threads = record.threads;
            }
            if record.efficiency > stats.max_efficiency {
                stats.max_efficiency = record.efficiency;
                stats.max_efficiency_threads = record.threads;
            }
            if record.time_ms < stats.min_parallel_time {
                stats.min_parallel_time = record.time_ms;
            }
            stats.max_threads = stats.max_threads.max(record.threads);
        }

        if let Some(last) = group.sorted_by_threads().last() {
            stats.last_efficiency = last.efficiency;
        }

        Ok(stats)
    }

    pub fn scalability(&self, thresholds: &Thresholds) -> Scalability {
        classify_scalability(self.max_speedup, self.max_threads, thresholds)
    }

    pub fn retention(&self, thresholds: &Thresholds) -> Retention {
        classify_efficiency_retention(self.last_efficiency, thresholds)
    }
}

/// Compares the best speedup against fractions of the ideal linear speedup
/// at `max_threads`.
pub fn classify_scalability(
    max_speedup: f64,
    max_threads: u32,
    thresholds: &Thresholds,
) -> Scalability {
    let ideal = max_threads as f64;
    if max_speedup >= thresholds.excellent * ideal {
        Scalability::Excellent
    } else if max_speedup >= thresholds.good * ideal {
        Scalability::Good
    } else if max_speedup >= thresholds.moderate * ideal {
        Scalability::Moderate
    } else {
        Scalability::Limited
    }
}

pub fn classify_efficiency_retention(last_efficiency: f64, thresholds: &Thresholds) -> Retention {
    if last_efficiency > thresholds.efficiency_maintained {
        Retention::Maintained
    } else if last_efficiency > thresholds.efficiency_reasonable {
        Retention::Reasonable
    } else {
        Retention::SignificantLoss
    }
}

impl fmt::Display for Scalability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scalability::Excellent => "Excellent scalability (close to ideal)",
            Scalability::Good => "Good scalability",
            Scalability::Moderate => "Moderate scalability",
            Scalability::Limited => "Limited scalability",
        })
    }
}

impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Retention::Maintained => "Efficiency maintained even with many threads",
            Retention::Reasonable => "Reasonable efficiency with many threads",
            Retention::SignificantLoss => "Significant efficiency loss with many threads",
        })
    }
}
