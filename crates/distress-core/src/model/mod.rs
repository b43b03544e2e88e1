pub mod artifact;
pub mod capabilities;
pub mod classify;
pub mod tier;

pub use artifact::{resolve_model_json, LinearExplainer, ModelArtifact, ResolvedModel, StandardScaler};
pub use capabilities::{Classifier, Explainer, Scaler};
pub use classify::{classify, classify_scaled, PredictionResult};
pub use tier::RiskTier;
