//! Per-feature and per-category contribution analysis.
//!
//! Contributions come from the externally supplied explainer, one signed
//! value per canonical feature. Category totals sum those values over the
//! fixed six-way partition, so the six totals always add up to the total
//! per-feature contribution with nothing counted twice.

use serde::{Deserialize, Serialize};

use crate::features::{FeatureCatalog, FeatureCategory};
use crate::model::Explainer;
use crate::{DistressError, DistressResult};

/// One feature's signed contribution, carrying its canonical position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub index: usize,
    pub feature: String,
    pub value: f64,
}

/// Aggregated contribution of one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryContribution {
    pub category: FeatureCategory,
    pub total: f64,
}

/// Full attribution for one prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribution {
    baseline: f64,
    contributions: Vec<FeatureContribution>,
    by_category: Vec<CategoryContribution>,
}

impl Attribution {
    /// Explainer output over the training background.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Per-feature contributions in canonical order.
    pub fn contributions(&self) -> &[FeatureContribution] {
        &self.contributions
    }

    /// Category totals in the fixed category order.
    pub fn by_category(&self) -> &[CategoryContribution] {
        &self.by_category
    }

    /// All contributions ranked by absolute value descending. The sort is
    /// stable, so exact ties keep canonical feature order.
    fn ranked(&self) -> Vec<FeatureContribution> {
        let mut ranked = self.contributions.clone();
        ranked.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
        ranked
    }

    /// Up to `n` strongest risk-raising contributions, largest first.
    pub fn top_positive(&self, n: usize) -> Vec<FeatureContribution> {
        self.ranked()
            .into_iter()
            .filter(|c| c.value > 0.0)
            .take(n)
            .collect()
    }

    /// Up to `n` strongest risk-reducing contributions, most negative first.
    pub fn top_negative(&self, n: usize) -> Vec<FeatureContribution> {
        self.ranked()
            .into_iter()
            .filter(|c| c.value < 0.0)
            .take(n)
            .collect()
    }

    /// The single largest contribution by magnitude, if any is non-zero.
    pub fn primary_driver(&self) -> Option<FeatureContribution> {
        self.ranked().into_iter().find(|c| c.value != 0.0)
    }
}

/// Compute the attribution for one scaled observation.
pub fn attribute(
    explainer: &dyn Explainer,
    scaled: &[f64],
    catalog: &FeatureCatalog,
) -> DistressResult<Attribution> {
    let raw = explainer.contributions(scaled)?;
    if raw.len() != catalog.len() {
        return Err(DistressError::FeatureOrderMismatch {
            context: "explainer contributions".into(),
            expected: catalog.len(),
            got: raw.len(),
        });
    }

    let contributions: Vec<FeatureContribution> = catalog
        .names()
        .iter()
        .zip(raw.iter())
        .enumerate()
        .map(|(index, (feature, value))| FeatureContribution {
            index,
            feature: feature.to_string(),
            value: *value,
        })
        .collect();

    let by_category = FeatureCategory::ALL
        .iter()
        .map(|category| {
            let total = contributions
                .iter()
                .filter(|c| catalog.category_of(&c.feature) == Some(*category))
                .map(|c| c.value)
                .sum();
            CategoryContribution {
                category: *category,
                total,
            }
        })
        .collect();

    Ok(Attribution {
        baseline: explainer.baseline(),
        contributions,
        by_category,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
