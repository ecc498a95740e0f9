pub mod error;
pub mod parse;
pub mod pipeline;
pub mod results;
pub mod row;
pub mod stats;
pub mod summary;
pub mod tables;
pub mod validation;

pub use error::CompareError;
pub use pipeline::{run_comparison, summarize_outcome, ComparisonOutcome, ComparisonRequest};
pub use row::{Row, RowSequence};
