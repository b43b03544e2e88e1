use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use distress_core::features::{extract, FeatureCatalog, RawSnapshot};
use distress_core::DistressError;

use crate::input;

/// Arguments for standalone feature extraction
#[derive(Args)]
pub struct ExtractFeaturesArgs {
    /// Path to the snapshot JSON; piped stdin is used when omitted
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Analysis date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_extract_features(args: ExtractFeaturesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot: RawSnapshot = if let Some(ref path) = args.snapshot {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(DistressError::InsufficientData(
            "no snapshot data available for this request; pass --snapshot or pipe JSON via stdin"
                .into(),
        )
        .into());
    };

    let catalog = FeatureCatalog::standard();
    let as_of = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let features = extract(&snapshot, as_of, &catalog);

    let rows: Vec<Value> = features
        .named(&catalog)
        .map(|(name, value)| {
            serde_json::json!({
                "feature": name,
                "label": catalog.label(name),
                "value": value,
            })
        })
        .collect();

    Ok(serde_json::json!({ "results": rows }))
}
