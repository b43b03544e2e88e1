//! Flat report export.
//!
//! The export collaborator (CSV download, external rendering) consumes a
//! single flat record: identifying fields, the prediction, then every
//! feature value under its display label, formatted to 4 decimal places.
//! Field order is part of the contract, so the record is an ordered list of
//! pairs rather than a map.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::features::{FeatureCatalog, FeatureVector};
use crate::model::PredictionResult;

/// Identifying fields for the analysed company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSubject {
    pub company: String,
    pub ticker: String,
    pub country: String,
    pub sector: String,
    /// Reader-facing period label, e.g. "1 Year".
    pub period: String,
}

/// One exported field. Name is the column header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportField {
    pub name: String,
    pub value: String,
}

/// The flat export record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatReport {
    pub fields: Vec<ReportField>,
}

impl FlatReport {
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

fn field(name: &str, value: impl Into<String>) -> ReportField {
    ReportField {
        name: name.to_string(),
        value: value.into(),
    }
}

/// Assemble the flat record for one analysis.
pub fn build_report(
    subject: &ReportSubject,
    date: NaiveDate,
    prediction: &PredictionResult,
    features: &FeatureVector,
    catalog: &FeatureCatalog,
) -> FlatReport {
    let mut fields = vec![
        field("Company", subject.company.clone()),
        field("Ticker", subject.ticker.clone()),
        field("Country", subject.country.clone()),
        field("Sector", subject.sector.clone()),
        field("Period", subject.period.clone()),
        field("Date", date.format("%Y-%m-%d").to_string()),
        field(
            "Result",
            if prediction.predicted_label == 1 {
                "Distressed"
            } else {
                "Healthy"
            },
        ),
        field("Probability", format!("{:.4}", prediction.probability)),
        field("Risk Level", prediction.risk_tier.to_string()),
    ];

    fields.extend(
        features
            .named(catalog)
            .map(|(name, value)| field(catalog.label(name), format!("{value:.4}"))),
    );

    FlatReport { fields }
}
