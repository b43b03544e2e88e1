//! The analysis pipeline: snapshot → features → prediction → attribution →
//! narrative.
//!
//! Each call is request-scoped and stateless; the only shared state is the
//! set of read-only artifact handles, which must not be mutated during
//! inference. Nothing here performs I/O — artifact loading and data
//! retrieval happen in external collaborators before this runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::explain::narrative::{self, Narrative, Subject};
use crate::explain::{attribute, Attribution};
use crate::features::{extract, FeatureCatalog, FeatureVector, RawSnapshot};
use crate::model::{classify_scaled, Classifier, Explainer, PredictionResult, Scaler};
use crate::types::{with_metadata, ComputationOutput};
use crate::DistressResult;

/// The externally supplied, pre-fitted artifact handles for one analysis.
/// All are read-only; the explainer is optional and its absence degrades
/// the narrative rather than failing the analysis.
pub struct ArtifactSet<'a> {
    pub scaler: &'a dyn Scaler,
    pub classifier: &'a dyn Classifier,
    pub explainer: Option<&'a dyn Explainer>,
}

/// Complete result of one analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub prediction: PredictionResult,
    /// How decisive the probability is: 1 at the extremes, 0 at the 50/50
    /// boundary.
    pub confidence: f64,
    pub features: FeatureVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Attribution>,
    pub narrative: Narrative,
}

/// Run the full pipeline for one snapshot.
///
/// Fatal errors are configuration problems only: a scaler/model width
/// mismatch or a classifier without probability support. Data sparsity
/// never errors, and an explainer failure downgrades to a prediction
/// without attribution, noted in the envelope warnings.
pub fn analyze(
    snapshot: &RawSnapshot,
    as_of: NaiveDate,
    artifacts: &ArtifactSet<'_>,
    catalog: &FeatureCatalog,
    subject: &Subject,
) -> DistressResult<ComputationOutput<AnalysisReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let features = extract(snapshot, as_of, catalog);
    let scaled = artifacts.scaler.transform(features.values())?;
    let prediction = classify_scaled(&scaled, artifacts.classifier)?;

    let attribution = match artifacts.explainer {
        Some(explainer) => match attribute(explainer, &scaled, catalog) {
            Ok(attribution) => Some(attribution),
            Err(e) => {
                warnings.push(format!("Factor analysis could not be generated: {e}"));
                None
            }
        },
        None => {
            warnings.push(
                "No contribution explainer is available for this model type; the narrative \
                 omits the factor analysis."
                    .to_string(),
            );
            None
        }
    };

    let narrative = narrative::compose(
        &prediction,
        &features,
        attribution.as_ref(),
        subject,
        catalog,
    );
    let confidence = 1.0 - (prediction.probability - 0.5).abs() * 2.0;

    let report = AnalysisReport {
        prediction,
        confidence,
        features,
        attribution,
        narrative,
    };

    let assumptions = serde_json::json!({
        "methodology": "Binary distress classification over the canonical feature vector",
        "tier_thresholds": {"critical": 0.7, "high": 0.5, "medium": 0.3},
        "feature_count": catalog.len(),
        "sparsity_policy": "missing statements, short history and zero denominators \
                            resolve to neutral defaults",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Financial distress risk scoring with per-feature attribution",
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}
