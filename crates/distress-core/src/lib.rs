pub mod error;
pub mod types;

pub mod explain;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod report;

pub use error::DistressError;
pub use types::*;

/// Standard result type for all distress-analysis operations
pub type DistressResult<T> = Result<T, DistressError>;
