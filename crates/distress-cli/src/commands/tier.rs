use clap::Args;
use serde_json::Value;

use distress_core::model::RiskTier;
use distress_core::DistressError;

/// Arguments for the tier lookup
#[derive(Args)]
pub struct TierArgs {
    /// Distress probability in [0, 1]
    #[arg(long)]
    pub probability: f64,
}

pub fn run_tier(args: TierArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&args.probability) {
        return Err(DistressError::InvalidInput {
            field: "probability".into(),
            reason: "Must be between 0 and 1.".into(),
        }
        .into());
    }
    let tier = RiskTier::from_probability(args.probability);
    Ok(serde_json::json!({
        "result": {
            "probability": args.probability,
            "risk_tier": tier.to_string(),
            "description": tier.description(),
        }
    }))
}
