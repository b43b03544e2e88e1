//! Risk tier policy.
//!
//! Probability is discretized by fixed policy thresholds. These are
//! reporting constants chosen for the product, not values derived from the
//! model, and the lower bound of each band is closed: exactly 0.70 is
//! already Critical.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

/// Ordered decision table: first threshold at or below the probability wins.
const TIER_FLOORS: [(f64, RiskTier); 3] = [
    (0.7, RiskTier::Critical),
    (0.5, RiskTier::High),
    (0.3, RiskTier::Medium),
];

impl RiskTier {
    pub fn from_probability(probability: f64) -> RiskTier {
        TIER_FLOORS
            .iter()
            .find(|(floor, _)| probability >= *floor)
            .map(|(_, tier)| *tier)
            .unwrap_or(RiskTier::Low)
    }

    /// Short reader-facing description used in assessment summaries.
    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Low => "No significant concern.",
            RiskTier::Medium => "Some signals to monitor.",
            RiskTier::High => "Requires close attention.",
            RiskTier::Critical => "Immediate action needed.",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Low => write!(f, "Low"),
            RiskTier::Medium => write!(f, "Medium"),
            RiskTier::High => write!(f, "High"),
            RiskTier::Critical => write!(f, "Critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_lower_bounds() {
        assert_eq!(RiskTier::from_probability(0.7), RiskTier::Critical);
        assert_eq!(RiskTier::from_probability(0.5), RiskTier::High);
        assert_eq!(RiskTier::from_probability(0.3), RiskTier::Medium);
        assert_eq!(RiskTier::from_probability(0.29999), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(1.0), RiskTier::Critical);
    }

    #[test]
    fn test_tier_is_monotone_in_probability() {
        let grid: Vec<f64> = (0..=1000).map(|i| i as f64 / 1000.0).collect();
        for pair in grid.windows(2) {
            let lower = RiskTier::from_probability(pair[0]);
            let upper = RiskTier::from_probability(pair[1]);
            assert!(lower <= upper, "tier({}) > tier({})", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_display_names() {
        assert_eq!(RiskTier::Critical.to_string(), "Critical");
        assert_eq!(RiskTier::Low.to_string(), "Low");
    }
}
