//! Statistics, aggregation, and reporting for commit lifetimes.
//!
//! Folds lifetime observations into per-period buckets, computes median,
//! mean and mode per bucket, and renders the CSV and text reports.

pub mod aggregations;
pub mod reports;
pub mod stats;

pub use aggregations::{aggregate, Aggregator, DayBucket, SummaryRow, TOTAL_GROUP};
pub use reports::ReportGenerator;
pub use stats::Stats;
