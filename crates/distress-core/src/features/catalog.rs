//! Canonical feature catalog.
//!
//! The feature list, display labels, and category partition are frozen
//! configuration data shared with the externally trained classifier. The
//! model was fitted against this exact name set in this exact order, so the
//! catalog is the contract boundary: reordering or renaming anything here
//! invalidates every supplied model artifact.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of features the classifier was trained on.
pub const FEATURE_COUNT: usize = 45;

/// Canonical feature order. Matches the training pipeline's selected-feature
/// list exactly; consumed positionally by scaler and classifier artifacts.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Market_Cap_USD",
    "Low",
    "Volume",
    "Daily_Return_%",
    "Price_Range_%",
    "ROA_%",
    "Equity_Ratio",
    "Asset_Turnover",
    "OCF_to_Debt",
    "Altman_Z_Score",
    "Death_Cross",
    "True_Range",
    "RSI_14",
    "US_10Y",
    "Oil_Volatility_20D",
    "Oil_Below_60",
    "Oil_Below_40",
    "Brent_Change_%",
    "VIX_Change_%",
    "Very_High_VIX",
    "Strong_Dollar",
    "SAR_USD",
    "KWD_USD",
    "QAR_USD_Volatility_20D",
    "BHD_USD_Volatility_20D",
    "Gulf_Crisis_End",
    "Is_Month_End",
    "Very_High_Governance_Risk",
    "Has_Controversy",
    "Poor_Governance",
    "Operating Cf_M",
    "Free Cf_M",
    "Debt_to_Equity",
    "ROE_%",
    "Net_Profit_Margin_%",
    "Volatility_20",
    "ROC_20",
    "Egypt_FX_Crisis",
    "EGP_USD_Change_%",
    "Pandemic_Recession",
    "Environment_Score",
    "Social_Score",
    "Young_Company",
    "Low_Institutional_Ownership",
    "Month_x",
];

/// Fixed categories used for attribution aggregation only; never consulted
/// by the classifier itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureCategory {
    FinancialHealth,
    MarketPrice,
    OilGlobalMacro,
    RegionalFactors,
    GovernanceEsg,
    Timing,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 6] = [
        FeatureCategory::FinancialHealth,
        FeatureCategory::MarketPrice,
        FeatureCategory::OilGlobalMacro,
        FeatureCategory::RegionalFactors,
        FeatureCategory::GovernanceEsg,
        FeatureCategory::Timing,
    ];

    /// Features belonging to this category. The six member lists partition
    /// the canonical list: every feature appears in exactly one.
    pub fn members(&self) -> &'static [&'static str] {
        match self {
            FeatureCategory::FinancialHealth => &[
                "ROA_%",
                "Equity_Ratio",
                "Asset_Turnover",
                "OCF_to_Debt",
                "Altman_Z_Score",
                "Operating Cf_M",
                "Free Cf_M",
                "Debt_to_Equity",
                "ROE_%",
                "Net_Profit_Margin_%",
            ],
            FeatureCategory::MarketPrice => &[
                "Market_Cap_USD",
                "Low",
                "Volume",
                "Daily_Return_%",
                "Price_Range_%",
                "True_Range",
                "Volatility_20",
                "ROC_20",
                "Death_Cross",
                "RSI_14",
            ],
            FeatureCategory::OilGlobalMacro => &[
                "Oil_Volatility_20D",
                "Oil_Below_60",
                "Oil_Below_40",
                "Brent_Change_%",
                "US_10Y",
                "VIX_Change_%",
                "Very_High_VIX",
                "Strong_Dollar",
            ],
            FeatureCategory::RegionalFactors => &[
                "SAR_USD",
                "KWD_USD",
                "QAR_USD_Volatility_20D",
                "BHD_USD_Volatility_20D",
                "Gulf_Crisis_End",
                "Egypt_FX_Crisis",
                "EGP_USD_Change_%",
                "Pandemic_Recession",
            ],
            FeatureCategory::GovernanceEsg => &[
                "Very_High_Governance_Risk",
                "Has_Controversy",
                "Poor_Governance",
                "Environment_Score",
                "Social_Score",
                "Young_Company",
                "Low_Institutional_Ownership",
            ],
            FeatureCategory::Timing => &["Is_Month_End", "Month_x"],
        }
    }
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureCategory::FinancialHealth => write!(f, "Financial Health"),
            FeatureCategory::MarketPrice => write!(f, "Market & Price"),
            FeatureCategory::OilGlobalMacro => write!(f, "Oil & Global Macro"),
            FeatureCategory::RegionalFactors => write!(f, "Regional Factors"),
            FeatureCategory::GovernanceEsg => write!(f, "Governance & ESG"),
            FeatureCategory::Timing => write!(f, "Timing"),
        }
    }
}

/// Human-readable label for a canonical feature name, used in narratives
/// and exported reports.
pub fn feature_label(name: &str) -> &str {
    match name {
        "Market_Cap_USD" => "Company Size (Market Value)",
        "Low" => "Daily Low Price",
        "Volume" => "Trading Activity (Volume)",
        "Daily_Return_%" => "Daily Price Change",
        "Price_Range_%" => "Daily Price Spread",
        "ROA_%" => "Return on Assets",
        "Equity_Ratio" => "Equity Ratio",
        "Asset_Turnover" => "Asset Efficiency",
        "OCF_to_Debt" => "Cash Flow vs Debt Coverage",
        "Altman_Z_Score" => "Financial Health Score",
        "Death_Cross" => "Bearish Price Signal",
        "True_Range" => "Daily Price Volatility",
        "RSI_14" => "Price Momentum",
        "US_10Y" => "US Interest Rate",
        "Oil_Volatility_20D" => "Oil Price Stability",
        "Oil_Below_60" => "Low Oil Price Indicator",
        "Oil_Below_40" => "Very Low Oil Price Indicator",
        "Brent_Change_%" => "Oil Price Change",
        "VIX_Change_%" => "Market Uncertainty Change",
        "Very_High_VIX" => "Extreme Market Uncertainty",
        "Strong_Dollar" => "Strong US Dollar",
        "SAR_USD" => "Saudi Riyal Rate",
        "KWD_USD" => "Kuwaiti Dinar Rate",
        "QAR_USD_Volatility_20D" => "Qatar Riyal Stability",
        "BHD_USD_Volatility_20D" => "Bahraini Dinar Stability",
        "Gulf_Crisis_End" => "Post-Gulf Crisis Period",
        "Is_Month_End" => "Month-End Period",
        "Very_High_Governance_Risk" => "High Governance Risk",
        "Has_Controversy" => "Company Controversy",
        "Poor_Governance" => "Governance Concerns",
        "Operating Cf_M" => "Operating Cash Flow",
        "Free Cf_M" => "Free Cash Flow",
        "Debt_to_Equity" => "Debt Relative to Equity",
        "ROE_%" => "Return on Equity",
        "Net_Profit_Margin_%" => "Net Profit Margin",
        "Volatility_20" => "Price Stability (20-Day)",
        "ROC_20" => "Price Trend (20-Day)",
        "Egypt_FX_Crisis" => "Egypt Currency Pressure",
        "EGP_USD_Change_%" => "Egyptian Pound Change",
        "Pandemic_Recession" => "Pandemic Period",
        "Environment_Score" => "Environmental Score",
        "Social_Score" => "Social Score",
        "Young_Company" => "Early-Stage Company",
        "Low_Institutional_Ownership" => "Low Institutional Ownership",
        "Month_x" => "Month of Year",
        other => other,
    }
}

/// Resolved catalog handle: the canonical order plus reverse lookups.
///
/// Built once at startup and passed explicitly to the extractor and the
/// attribution engine rather than consulted as ambient global state.
#[derive(Debug, Clone)]
pub struct FeatureCatalog {
    index: HashMap<&'static str, usize>,
    category: HashMap<&'static str, FeatureCategory>,
}

impl FeatureCatalog {
    pub fn standard() -> Self {
        let index = FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, i))
            .collect();
        let mut category = HashMap::with_capacity(FEATURE_COUNT);
        for cat in FeatureCategory::ALL {
            for name in cat.members() {
                category.insert(*name, cat);
            }
        }
        FeatureCatalog { index, category }
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    /// Canonical position of a feature name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn label<'a>(&self, name: &'a str) -> &'a str {
        feature_label(name)
    }

    pub fn category_of(&self, name: &str) -> Option<FeatureCategory> {
        self.category.get(name).copied()
    }
}

impl Default for FeatureCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_partition_is_exhaustive_and_disjoint() {
        let mut seen: HashMap<&str, FeatureCategory> = HashMap::new();
        for cat in FeatureCategory::ALL {
            for name in cat.members() {
                let prev = seen.insert(name, cat);
                assert!(
                    prev.is_none(),
                    "{name} appears in both {:?} and {cat:?}",
                    prev.unwrap()
                );
            }
        }
        assert_eq!(seen.len(), FEATURE_COUNT);
        for name in FEATURE_NAMES {
            assert!(seen.contains_key(name), "{name} not assigned a category");
        }
    }

    #[test]
    fn test_catalog_index_matches_canonical_order() {
        let catalog = FeatureCatalog::standard();
        for (i, name) in FEATURE_NAMES.iter().enumerate() {
            assert_eq!(catalog.index_of(name), Some(i));
        }
        assert_eq!(catalog.index_of("Not_A_Feature"), None);
    }

    #[test]
    fn test_every_feature_has_a_distinct_label() {
        let mut labels = std::collections::HashSet::new();
        for name in FEATURE_NAMES {
            let label = feature_label(name);
            assert_ne!(label, name, "{name} is missing a display label");
            assert!(labels.insert(label), "duplicate label {label}");
        }
    }

    #[test]
    fn test_category_lookup() {
        let catalog = FeatureCatalog::standard();
        assert_eq!(
            catalog.category_of("Altman_Z_Score"),
            Some(FeatureCategory::FinancialHealth)
        );
        assert_eq!(
            catalog.category_of("RSI_14"),
            Some(FeatureCategory::MarketPrice)
        );
        assert_eq!(
            catalog.category_of("Month_x"),
            Some(FeatureCategory::Timing)
        );
        assert_eq!(catalog.category_of("unknown"), None);
    }
}
