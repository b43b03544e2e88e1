//! Narrow capability interfaces over externally supplied, pre-fitted
//! artifacts.
//!
//! The engine never assumes a concrete model family. It only requires that
//! the loaded artifacts expose these operations, and every implementation
//! must be safe for concurrent read-only use: inference never mutates the
//! artifact.

use crate::DistressResult;

/// A fitted feature scaler.
pub trait Scaler: Send + Sync {
    /// Transform a canonically ordered feature vector into model space.
    fn transform(&self, features: &[f64]) -> DistressResult<Vec<f64>>;
}

/// A fitted binary distress classifier.
///
/// `predict` and `predict_proba` are separate capabilities: the binary label
/// may occasionally disagree with a naive probability threshold, and both
/// are reported to the caller without reconciliation. An artifact that
/// cannot produce probabilities returns `MissingCapability` from
/// `predict_proba`, which is a fatal configuration error.
pub trait Classifier: Send + Sync {
    /// Binary decision: 1 = distressed, 0 = healthy.
    fn predict(&self, features: &[f64]) -> DistressResult<u8>;

    /// Positive-class (distress) probability in [0, 1].
    fn predict_proba(&self, features: &[f64]) -> DistressResult<f64>;
}

/// A contribution explainer aligned with the canonical feature order.
pub trait Explainer: Send + Sync {
    /// Expected model output over the training background.
    fn baseline(&self) -> f64;

    /// Signed per-feature contributions for one scaled observation.
    /// Positive values push toward distress, negative away from it.
    fn contributions(&self, features: &[f64]) -> DistressResult<Vec<f64>>;
}
