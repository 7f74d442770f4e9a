//! Demo dashboard: synthetic metrics, aggregates and the small interactive
//! widgets.

pub mod series;
pub mod stats;
pub mod tools;

pub use series::{Category, DataPoint, Dataset, Metric, Selection, generate_dataset};
pub use stats::{MetricSummary, Overview};
pub use tools::{Operation, TextStats};
