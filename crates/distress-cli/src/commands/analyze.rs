use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use distress_core::explain::Subject;
use distress_core::features::{FeatureCatalog, RawSnapshot};
use distress_core::model::{resolve_model_json, Explainer, StandardScaler};
use distress_core::pipeline::{analyze, ArtifactSet};
use distress_core::report::{build_report, ReportSubject};
use distress_core::DistressError;

use crate::input;

/// Arguments for the full analysis pipeline
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the snapshot JSON (price history + statement frames);
    /// piped stdin is used when omitted
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Path to the model artifact JSON
    #[arg(long)]
    pub model: String,

    /// Path to the scaler artifact JSON
    #[arg(long)]
    pub scaler: String,

    /// Company display name
    #[arg(long, default_value = "the company")]
    pub company: String,

    /// Exchange ticker
    #[arg(long, default_value = "")]
    pub ticker: String,

    /// Listing country
    #[arg(long, default_value = "")]
    pub country: String,

    /// Industry sector
    #[arg(long, default_value = "")]
    pub sector: String,

    /// Reader-facing analysis period label
    #[arg(long, default_value = "1 Year")]
    pub period: String,

    /// Analysis date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Append the flat export record to the output
    #[arg(long)]
    pub report: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
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

    let model = resolve_model_json(&input::file::read_text(&args.model)?)?;
    let scaler = StandardScaler::from_json(&input::file::read_text(&args.scaler)?)?;
    let explainer = model.explainer();

    let artifacts = ArtifactSet {
        scaler: &scaler,
        classifier: &model,
        explainer: explainer.as_ref().map(|e| e as &dyn Explainer),
    };

    let catalog = FeatureCatalog::standard();
    let as_of = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let subject = Subject {
        name: args.company.clone(),
        period: args.period.clone(),
    };

    let output = analyze(&snapshot, as_of, &artifacts, &catalog, &subject)?;

    let mut value = serde_json::to_value(&output)?;
    if args.report {
        let report_subject = ReportSubject {
            company: args.company,
            ticker: args.ticker,
            country: args.country,
            sector: args.sector,
            period: args.period,
        };
        let flat = build_report(
            &report_subject,
            as_of,
            &output.result.prediction,
            &output.result.features,
            &catalog,
        );
        value["export"] = serde_json::to_value(&flat)?;
    }

    Ok(value)
}
