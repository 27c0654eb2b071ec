pub mod bench;
pub mod config;
pub mod plot;
pub mod report;
pub mod stats;
