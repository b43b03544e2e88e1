//! Model and scaler artifact handling.
//!
//! Artifacts arrive as JSON produced by the training pipeline's export step.
//! Two shapes are in circulation: the current export writes the estimator
//! object directly, while older runs wrapped it in a dict under a
//! `final_model` or `best_model` key. Both deserialize into
//! [`ModelArtifact`] and are resolved exactly once, at load time, into a
//! single capability-exposing [`ResolvedModel`]; the analysis pipeline never
//! sees the legacy shape.

use serde::{Deserialize, Serialize};

use super::capabilities::{Classifier, Explainer, Scaler};
use crate::{DistressError, DistressResult};

// ---------------------------------------------------------------------------
// Artifact shapes
// ---------------------------------------------------------------------------

/// Estimator parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorSpec {
    /// Logistic regression over scaled features.
    Logistic {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    /// Single-feature decision rule. Produces a label but no probability,
    /// so it cannot drive a full analysis on its own.
    Threshold { feature_index: usize, cutoff: f64 },
}

/// Legacy dict-wrapped export: the estimator sits under `final_model` or
/// `best_model`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WrappedModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_model: Option<EstimatorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_model: Option<EstimatorSpec>,
}

/// A model artifact in either supported shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelArtifact {
    RawEstimator(EstimatorSpec),
    WrappedDict(WrappedModel),
}

impl ModelArtifact {
    /// Resolve either shape into a single estimator handle. `final_model`
    /// wins over `best_model` when the legacy dict carries both.
    pub fn resolve(self) -> DistressResult<ResolvedModel> {
        let spec = match self {
            ModelArtifact::RawEstimator(spec) => spec,
            ModelArtifact::WrappedDict(wrapped) => wrapped
                .final_model
                .or(wrapped.best_model)
                .ok_or_else(|| {
                    DistressError::ArtifactError(
                        "dict-wrapped model artifact contains no estimator".into(),
                    )
                })?,
        };
        Ok(ResolvedModel { spec })
    }
}

/// Parse and resolve a model artifact from its JSON text.
pub fn resolve_model_json(json: &str) -> DistressResult<ResolvedModel> {
    let artifact: ModelArtifact = serde_json::from_str(json).map_err(|e| {
        DistressError::ArtifactError(format!("model artifact is not a recognised shape: {e}"))
    })?;
    artifact.resolve()
}

// ---------------------------------------------------------------------------
// Resolved model
// ---------------------------------------------------------------------------

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

fn check_width(context: &str, expected: usize, got: usize) -> DistressResult<()> {
    if expected != got {
        return Err(DistressError::FeatureOrderMismatch {
            context: context.into(),
            expected,
            got,
        });
    }
    Ok(())
}

/// The single capability handle produced by artifact resolution.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    spec: EstimatorSpec,
}

impl ResolvedModel {
    fn margin(coefficients: &[f64], intercept: f64, features: &[f64]) -> DistressResult<f64> {
        check_width("logistic estimator", coefficients.len(), features.len())?;
        let dot = coefficients
            .iter()
            .zip(features.iter())
            .map(|(c, x)| c * x)
            .sum::<f64>();
        Ok(dot + intercept)
    }

    /// Contribution explainer for the resolved estimator, when its family
    /// supports one. A `Threshold` estimator has no explainer; the caller
    /// degrades to a prediction without attribution.
    pub fn explainer(&self) -> Option<LinearExplainer> {
        match &self.spec {
            EstimatorSpec::Logistic {
                coefficients,
                intercept,
            } => Some(LinearExplainer {
                coefficients: coefficients.clone(),
                baseline: *intercept,
            }),
            EstimatorSpec::Threshold { .. } => None,
        }
    }
}

impl Classifier for ResolvedModel {
    fn predict(&self, features: &[f64]) -> DistressResult<u8> {
        match &self.spec {
            EstimatorSpec::Logistic {
                coefficients,
                intercept,
            } => Ok((Self::margin(coefficients, *intercept, features)? >= 0.0) as u8),
            EstimatorSpec::Threshold {
                feature_index,
                cutoff,
            } => {
                let value = features.get(*feature_index).copied().ok_or_else(|| {
                    DistressError::FeatureOrderMismatch {
                        context: "threshold estimator".into(),
                        expected: feature_index + 1,
                        got: features.len(),
                    }
                })?;
                Ok((value > *cutoff) as u8)
            }
        }
    }

    fn predict_proba(&self, features: &[f64]) -> DistressResult<f64> {
        match &self.spec {
            EstimatorSpec::Logistic {
                coefficients,
                intercept,
            } => Ok(sigmoid(Self::margin(coefficients, *intercept, features)?)),
            EstimatorSpec::Threshold { .. } => Err(DistressError::MissingCapability(
                "predict_proba (threshold estimator produces labels only)".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Linear explainer
// ---------------------------------------------------------------------------

/// Exact additive contributions for a linear-margin model over standardized
/// features: the scaled training mean is the zero vector, so each feature's
/// contribution is simply `coefficient * scaled_value` and the baseline is
/// the intercept.
#[derive(Debug, Clone)]
pub struct LinearExplainer {
    coefficients: Vec<f64>,
    baseline: f64,
}

impl Explainer for LinearExplainer {
    fn baseline(&self) -> f64 {
        self.baseline
    }

    fn contributions(&self, features: &[f64]) -> DistressResult<Vec<f64>> {
        check_width("linear explainer", self.coefficients.len(), features.len())?;
        Ok(self
            .coefficients
            .iter()
            .zip(features.iter())
            .map(|(c, x)| c * x)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Standard scaler
// ---------------------------------------------------------------------------

/// Fitted z-score scaler: `(x - mean) / scale` per feature. A zero scale
/// (constant training column) centres without dividing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn from_json(json: &str) -> DistressResult<Self> {
        let scaler: StandardScaler = serde_json::from_str(json).map_err(|e| {
            DistressError::ArtifactError(format!("scaler artifact is malformed: {e}"))
        })?;
        if scaler.mean.len() != scaler.scale.len() {
            return Err(DistressError::ArtifactError(format!(
                "scaler mean/scale widths differ: {} vs {}",
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        Ok(scaler)
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> DistressResult<Vec<f64>> {
        check_width("scaler", self.mean.len(), features.len())?;
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(x, (m, s))| {
                let centred = x - m;
                if *s > 0.0 {
                    centred / s
                } else {
                    centred
                }
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn logistic_json() -> String {
        r#"{"kind": "logistic", "coefficients": [1.0, -2.0, 0.5], "intercept": 0.25}"#.into()
    }

    #[test]
    fn test_raw_estimator_resolves() {
        let model = resolve_model_json(&logistic_json()).unwrap();
        let proba = model.predict_proba(&[0.0, 0.0, 0.0]).unwrap();
        assert!((proba - sigmoid(0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_wrapped_final_model_resolves() {
        let json = format!(r#"{{"final_model": {}}}"#, logistic_json());
        let model = resolve_model_json(&json).unwrap();
        assert_eq!(model.predict(&[1.0, 0.0, 0.0]).unwrap(), 1);
    }

    #[test]
    fn test_wrapped_best_model_resolves() {
        let json = format!(r#"{{"best_model": {}}}"#, logistic_json());
        let model = resolve_model_json(&json).unwrap();
        assert!(model.explainer().is_some());
    }

    #[test]
    fn test_empty_wrapper_is_an_artifact_error() {
        let err = resolve_model_json(r#"{"final_model": null, "best_model": null}"#).unwrap_err();
        assert!(matches!(err, DistressError::ArtifactError(_)), "{err:?}");
    }

    #[test]
    fn test_unrecognised_shape_is_an_artifact_error() {
        let err = resolve_model_json(r#"{"weights": [1, 2, 3]}"#).unwrap_err();
        assert!(matches!(err, DistressError::ArtifactError(_)), "{err:?}");
    }

    #[test]
    fn test_logistic_probability_and_label_agree_at_margin() {
        let model = resolve_model_json(&logistic_json()).unwrap();
        // margin = 1*1 - 2*0.5 + 0.5*(-0.5) + 0.25 = 0.0
        let x = [1.0, 0.5, -0.5];
        assert_eq!(model.predict(&x).unwrap(), 1);
        assert!((model.predict_proba(&x).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_estimator_lacks_probability_capability() {
        let model =
            resolve_model_json(r#"{"kind": "threshold", "feature_index": 1, "cutoff": 2.5}"#)
                .unwrap();
        assert_eq!(model.predict(&[0.0, 3.0]).unwrap(), 1);
        assert_eq!(model.predict(&[0.0, 2.0]).unwrap(), 0);
        let err = model.predict_proba(&[0.0, 3.0]).unwrap_err();
        assert!(matches!(err, DistressError::MissingCapability(_)), "{err:?}");
        assert!(model.explainer().is_none());
    }

    #[test]
    fn test_width_mismatch_is_fatal() {
        let model = resolve_model_json(&logistic_json()).unwrap();
        let err = model.predict_proba(&[1.0, 2.0]).unwrap_err();
        assert!(
            matches!(err, DistressError::FeatureOrderMismatch { .. }),
            "{err:?}"
        );
    }

    #[test]
    fn test_linear_explainer_contributions() {
        let model = resolve_model_json(&logistic_json()).unwrap();
        let explainer = model.explainer().unwrap();
        assert_eq!(explainer.baseline(), 0.25);
        let contributions = explainer.contributions(&[2.0, 1.0, -1.0]).unwrap();
        assert_eq!(contributions, vec![2.0, -2.0, -0.5]);
    }

    #[test]
    fn test_standard_scaler_transform() {
        let scaler = StandardScaler {
            mean: vec![10.0, 0.0, 5.0],
            scale: vec![2.0, 1.0, 0.0],
        };
        let scaled = scaler.transform(&[14.0, -3.0, 8.0]).unwrap();
        assert_eq!(scaled, vec![2.0, -3.0, 3.0]);
    }

    #[test]
    fn test_scaler_rejects_mismatched_artifact() {
        let err = StandardScaler::from_json(r#"{"mean": [1.0, 2.0], "scale": [1.0]}"#).unwrap_err();
        assert!(matches!(err, DistressError::ArtifactError(_)), "{err:?}");
    }

    #[test]
    fn test_scaler_rejects_wrong_width_input() {
        let scaler = StandardScaler {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
        };
        let err = scaler.transform(&[1.0]).unwrap_err();
        assert!(
            matches!(err, DistressError::FeatureOrderMismatch { .. }),
            "{err:?}"
        );
    }
}
