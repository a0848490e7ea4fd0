//! Output module for reporting on the index
//!
//! Statistics are shared by the `--stats` console report and the
//! `/api/statistics` endpoint.

pub mod stats;

pub use stats::{load_statistics, print_statistics, SiteStatistics, Statistics, TotalStatistics};
