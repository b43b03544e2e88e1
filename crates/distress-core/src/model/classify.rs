//! Classification step: scale the canonical feature vector and run the
//! fitted classifier.

use serde::{Deserialize, Serialize};

use super::capabilities::{Classifier, Scaler};
use super::tier::RiskTier;
use crate::features::FeatureVector;
use crate::DistressResult;

/// Outcome of one classification. Immutable; one per analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Model's binary decision: 1 = distressed, 0 = healthy.
    pub predicted_label: u8,
    /// Positive-class (distress) probability.
    pub probability: f64,
    pub risk_tier: RiskTier,
}

/// Run the classifier against an already scaled vector.
///
/// The label and probability come from separate model capabilities and may
/// disagree near the decision boundary; both are reported as-is. A missing
/// probability capability is a fatal configuration error.
pub fn classify_scaled(
    scaled: &[f64],
    classifier: &dyn Classifier,
) -> DistressResult<PredictionResult> {
    let predicted_label = classifier.predict(scaled)?;
    let probability = classifier.predict_proba(scaled)?;
    Ok(PredictionResult {
        predicted_label,
        probability,
        risk_tier: RiskTier::from_probability(probability),
    })
}

/// Scale and classify a canonical feature vector.
pub fn classify(
    features: &FeatureVector,
    scaler: &dyn Scaler,
    classifier: &dyn Classifier,
) -> DistressResult<PredictionResult> {
    let scaled = scaler.transform(features.values())?;
    classify_scaled(&scaled, classifier)
}
