use thiserror::Error;

#[derive(Debug, Error)]
pub enum DistressError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Model artifact error: {0}")]
    ArtifactError(String),

    #[error("Model artifact does not expose required capability: {0}")]
    MissingCapability(String),

    #[error("Feature vector mismatch in {context}: expected {expected} values, got {got}")]
    FeatureOrderMismatch {
        context: String,
        expected: usize,
        got: usize,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DistressError {
    fn from(e: serde_json::Error) -> Self {
        DistressError::SerializationError(e.to_string())
    }
}
