//! Feature derivation from a raw snapshot.
//!
//! `extract` is total: every data-sparsity condition (empty statements,
//! short price history, zero denominators) resolves to a documented neutral
//! default, never an error. Statement ratios are computed in `Decimal` and
//! converted to `f64` once, when the vector is composed for the model
//! boundary.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::catalog::FeatureCatalog;
use super::snapshot::*;
use super::technicals;
use crate::types::Money;
use crate::{DistressError, DistressResult};

// Altman Z-Score coefficients (original public-company variant)
const Z_COEFF_WORKING_CAPITAL: Decimal = dec!(1.2);
const Z_COEFF_RETAINED_EARNINGS: Decimal = dec!(1.4);
const Z_COEFF_EBIT: Decimal = dec!(3.3);
const Z_COEFF_EQUITY_TO_DEBT: Decimal = dec!(0.6);
const Z_COEFF_REVENUE: Decimal = dec!(1.0);

/// Neutral default for ESG-style 0-100 scores when no provider data exists.
const ESG_NEUTRAL: f64 = 50.0;

/// Day of month from which the month-end calendar flag is set.
const MONTH_END_FROM_DAY: u32 = 25;

const MILLION: Decimal = dec!(1_000_000);

/// Ordered feature values aligned 1:1 with the canonical catalog.
///
/// Constructed once per analysis and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn from_values(values: Vec<f64>, catalog: &FeatureCatalog) -> DistressResult<Self> {
        if values.len() != catalog.len() {
            return Err(DistressError::FeatureOrderMismatch {
                context: "feature vector construction".into(),
                expected: catalog.len(),
                got: values.len(),
            });
        }
        Ok(FeatureVector { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature, if the name is canonical.
    pub fn get(&self, catalog: &FeatureCatalog, name: &str) -> Option<f64> {
        catalog.index_of(name).map(|i| self.values[i])
    }

    /// (name, value) pairs in canonical order.
    pub fn named<'a>(
        &'a self,
        catalog: &'a FeatureCatalog,
    ) -> impl Iterator<Item = (&'static str, f64)> + 'a {
        catalog
            .names()
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (*name, *value))
    }
}

// ---------------------------------------------------------------------------
// Statement resolution
// ---------------------------------------------------------------------------

/// Line items resolved from the snapshot with the provider fallback chains
/// applied. All values default to zero when no source carries them.
struct Fundamentals {
    assets: Money,
    equity: Money,
    current_assets: Money,
    current_liabilities: Money,
    retained_earnings: Money,
    debt: Money,
    net_income: Money,
    revenue: Money,
    ebit: Money,
    operating_cash_flow: Money,
    free_cash_flow: Money,
}

fn resolve_fundamentals(snapshot: &RawSnapshot) -> Fundamentals {
    let bs = &snapshot.balance_sheet;
    let inc = &snapshot.income;
    let cf = &snapshot.cash_flow;
    let info = &snapshot.info;

    let assets = bs
        .line(LINE_TOTAL_ASSETS)
        .or(info.total_assets)
        .unwrap_or(Decimal::ZERO);
    let equity = bs
        .line(LINE_TOTAL_EQUITY)
        .or(info.total_stockholder_equity)
        .unwrap_or(Decimal::ZERO);

    // A reported aggregate debt line wins; otherwise rebuild it from the
    // long-term and short/long-term components.
    let debt = match bs.line(LINE_TOTAL_DEBT) {
        Some(total) if !total.is_zero() => total,
        _ => bs.line_or_zero(LINE_LONG_TERM_DEBT) + bs.line_or_zero(LINE_SHORT_LONG_TERM_DEBT),
    };

    let operating_cash_flow = cf.line_or_zero(LINE_OPERATING_CASH_FLOW);
    let capex = cf.line_or_zero(LINE_CAPEX);

    // A reported free-cash-flow line is used as-is, zero included; the
    // OCF-minus-capex approximation applies only when the line is absent.
    let free_cash_flow = match cf.line(LINE_FREE_CASH_FLOW) {
        Some(reported) => reported,
        None if !operating_cash_flow.is_zero() => operating_cash_flow - capex.abs(),
        None => Decimal::ZERO,
    };

    Fundamentals {
        assets,
        equity,
        current_assets: bs.line_or_zero(LINE_CURRENT_ASSETS),
        current_liabilities: bs.line_or_zero(LINE_CURRENT_LIABILITIES),
        retained_earnings: bs.line_or_zero(LINE_RETAINED_EARNINGS),
        debt,
        net_income: inc.line_or_zero(LINE_NET_INCOME),
        revenue: inc.line_or_zero(LINE_TOTAL_REVENUE),
        ebit: inc.line_or_zero(LINE_EBIT),
        operating_cash_flow,
        free_cash_flow,
    }
}

// ---------------------------------------------------------------------------
// Ratio helpers
// ---------------------------------------------------------------------------

/// Zero-guard division: a non-positive denominator yields 0, not an error.
fn ratio_or_zero(numerator: Money, denominator: Money) -> Decimal {
    if denominator > Decimal::ZERO {
        numerator / denominator
    } else {
        Decimal::ZERO
    }
}

fn pct_or_zero(numerator: Money, denominator: Money) -> Decimal {
    ratio_or_zero(numerator, denominator) * dec!(100)
}

fn altman_z_score(f: &Fundamentals) -> Decimal {
    if f.assets <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let working_capital = f.current_assets - f.current_liabilities;
    let equity_to_debt = if f.debt > Decimal::ZERO {
        Z_COEFF_EQUITY_TO_DEBT * f.equity / f.debt
    } else {
        Decimal::ZERO
    };
    Z_COEFF_WORKING_CAPITAL * working_capital / f.assets
        + Z_COEFF_RETAINED_EARNINGS * f.retained_earnings / f.assets
        + Z_COEFF_EBIT * f.ebit / f.assets
        + equity_to_debt
        + Z_COEFF_REVENUE * f.revenue / f.assets
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Force any non-finite artifact of f64 arithmetic back to the neutral 0.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Derive the canonical feature vector from a raw snapshot.
///
/// Pure and total given identical inputs; `as_of` affects only the calendar
/// features. Macro, regional, and governance features have no source in the
/// snapshot and are pinned to their neutral defaults — the degraded-mode
/// contract when those external feeds are not wired in.
pub fn extract(snapshot: &RawSnapshot, as_of: NaiveDate, catalog: &FeatureCatalog) -> FeatureVector {
    let f = resolve_fundamentals(snapshot);
    let closes = snapshot.closes();

    let mut values: BTreeMap<&'static str, f64> = BTreeMap::new();

    // Market & price
    values.insert(
        "Market_Cap_USD",
        to_f64(snapshot.info.market_cap.unwrap_or(Decimal::ZERO)),
    );
    values.insert(
        "Low",
        snapshot.history.last().map(|c| c.low).unwrap_or(0.0),
    );
    values.insert("Volume", technicals::mean_volume(&snapshot.history));
    values.insert("Daily_Return_%", technicals::latest_daily_return_pct(&closes));
    values.insert(
        "Price_Range_%",
        technicals::latest_price_range_pct(&snapshot.history),
    );
    values.insert("True_Range", technicals::true_range(&snapshot.history));
    values.insert("Death_Cross", technicals::bearish_crossover(&closes));
    values.insert("RSI_14", technicals::rsi_14(&closes));
    values.insert("Volatility_20", technicals::annualized_volatility_20(&closes));
    values.insert("ROC_20", technicals::rate_of_change_20(&closes));

    // Financial health
    values.insert("ROA_%", to_f64(pct_or_zero(f.net_income, f.assets)));
    values.insert("Equity_Ratio", to_f64(ratio_or_zero(f.equity, f.assets)));
    values.insert("Asset_Turnover", to_f64(ratio_or_zero(f.revenue, f.assets)));
    values.insert(
        "OCF_to_Debt",
        to_f64(ratio_or_zero(f.operating_cash_flow, f.debt)),
    );
    values.insert("Altman_Z_Score", to_f64(altman_z_score(&f)));
    values.insert("Debt_to_Equity", to_f64(ratio_or_zero(f.debt, f.equity)));
    values.insert("ROE_%", to_f64(pct_or_zero(f.net_income, f.equity)));
    values.insert(
        "Net_Profit_Margin_%",
        to_f64(pct_or_zero(f.net_income, f.revenue)),
    );
    values.insert("Operating Cf_M", to_f64(f.operating_cash_flow / MILLION));
    values.insert("Free Cf_M", to_f64(f.free_cash_flow / MILLION));

    // Governance & ESG neutral defaults
    values.insert("Environment_Score", ESG_NEUTRAL);
    values.insert("Social_Score", ESG_NEUTRAL);

    // Calendar
    values.insert(
        "Is_Month_End",
        if as_of.day() >= MONTH_END_FROM_DAY { 1.0 } else { 0.0 },
    );
    values.insert("Month_x", f64::from(as_of.month()));

    // Remaining macro/regional/governance features have no snapshot source
    // and stay at 0 via the catalog-order composition below.
    let composed = catalog
        .names()
        .iter()
        .map(|name| finite_or_zero(values.get(name).copied().unwrap_or(0.0)))
        .collect();

    FeatureVector { values: composed }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn candle(day: u32, close: f64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(day as u64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10_000.0,
        }
    }

    fn sample_snapshot() -> RawSnapshot {
        RawSnapshot {
            history: (0..30).map(|i| candle(i, 100.0 + i as f64 * 0.2)).collect(),
            balance_sheet: StatementFrame::from([
                (LINE_TOTAL_ASSETS, dec!(1000)),
                (LINE_TOTAL_EQUITY, dec!(400)),
                (LINE_TOTAL_DEBT, dec!(300)),
                (LINE_CURRENT_ASSETS, dec!(500)),
                (LINE_CURRENT_LIABILITIES, dec!(200)),
                (LINE_RETAINED_EARNINGS, dec!(100)),
            ]),
            income: StatementFrame::from([
                (LINE_NET_INCOME, dec!(50)),
                (LINE_TOTAL_REVENUE, dec!(900)),
                (LINE_EBIT, dec!(150)),
            ]),
            cash_flow: StatementFrame::from([
                (LINE_OPERATING_CASH_FLOW, dec!(80)),
                (LINE_CAPEX, dec!(-30)),
            ]),
            info: CompanyInfo {
                market_cap: Some(dec!(2_500_000)),
                ..CompanyInfo::default()
            },
        }
    }

    #[test]
    fn test_extract_produces_full_canonical_vector() {
        let catalog = FeatureCatalog::standard();
        let features = extract(&sample_snapshot(), as_of(), &catalog);
        assert_eq!(features.len(), catalog.len());
        for (name, value) in features.named(&catalog) {
            assert!(value.is_finite(), "{name} is not finite: {value}");
        }
    }

    #[test]
    fn test_extract_is_idempotent() {
        let catalog = FeatureCatalog::standard();
        let snapshot = sample_snapshot();
        let first = extract(&snapshot, as_of(), &catalog);
        let second = extract(&snapshot, as_of(), &catalog);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reference_company_ratios() {
        let catalog = FeatureCatalog::standard();
        let features = extract(&sample_snapshot(), as_of(), &catalog);

        assert_eq!(features.get(&catalog, "Equity_Ratio"), Some(0.4));
        assert_eq!(features.get(&catalog, "ROA_%"), Some(5.0));
        assert_eq!(features.get(&catalog, "ROE_%"), Some(12.5));
        assert_eq!(features.get(&catalog, "Asset_Turnover"), Some(0.9));
        assert_eq!(features.get(&catalog, "Debt_to_Equity"), Some(0.75));
        let ocf_to_debt = features.get(&catalog, "OCF_to_Debt").unwrap();
        assert!((ocf_to_debt - 80.0 / 300.0).abs() < 1e-9);

        // Z = 1.2*0.3 + 1.4*0.1 + 3.3*0.15 + 0.6*(400/300) + 1.0*0.9 = 2.695
        let z = features.get(&catalog, "Altman_Z_Score").unwrap();
        assert!((z - 2.695).abs() < 1e-9, "got {z}");
    }

    #[test]
    fn test_zero_assets_zero_guards() {
        let catalog = FeatureCatalog::standard();
        let mut snapshot = sample_snapshot();
        snapshot.balance_sheet = StatementFrame::from([
            (LINE_TOTAL_ASSETS, dec!(0)),
            (LINE_TOTAL_EQUITY, dec!(400)),
            (LINE_TOTAL_DEBT, dec!(300)),
        ]);
        let features = extract(&snapshot, as_of(), &catalog);

        assert_eq!(features.get(&catalog, "Asset_Turnover"), Some(0.0));
        assert_eq!(features.get(&catalog, "Equity_Ratio"), Some(0.0));
        assert_eq!(features.get(&catalog, "ROA_%"), Some(0.0));
        assert_eq!(features.get(&catalog, "Altman_Z_Score"), Some(0.0));
    }

    #[test]
    fn test_zero_equity_and_zero_debt_guards() {
        let catalog = FeatureCatalog::standard();
        let mut snapshot = sample_snapshot();
        snapshot.balance_sheet = StatementFrame::from([
            (LINE_TOTAL_ASSETS, dec!(1000)),
            (LINE_TOTAL_EQUITY, dec!(0)),
            (LINE_TOTAL_DEBT, dec!(0)),
        ]);
        let features = extract(&snapshot, as_of(), &catalog);

        assert_eq!(features.get(&catalog, "Debt_to_Equity"), Some(0.0));
        assert_eq!(features.get(&catalog, "ROE_%"), Some(0.0));
        assert_eq!(features.get(&catalog, "OCF_to_Debt"), Some(0.0));
    }

    #[test]
    fn test_empty_statements_degrade_to_zero_ratios() {
        let catalog = FeatureCatalog::standard();
        let snapshot = RawSnapshot {
            history: (0..5).map(|i| candle(i, 50.0)).collect(),
            balance_sheet: StatementFrame::empty(),
            income: StatementFrame::empty(),
            cash_flow: StatementFrame::empty(),
            info: CompanyInfo::default(),
        };
        let features = extract(&snapshot, as_of(), &catalog);

        assert_eq!(features.len(), catalog.len());
        for name in [
            "ROA_%",
            "Equity_Ratio",
            "Asset_Turnover",
            "OCF_to_Debt",
            "Altman_Z_Score",
            "Debt_to_Equity",
            "ROE_%",
            "Net_Profit_Margin_%",
            "Operating Cf_M",
            "Free Cf_M",
        ] {
            assert_eq!(features.get(&catalog, name), Some(0.0), "{name}");
        }
        for (name, value) in features.named(&catalog) {
            assert!(value.is_finite(), "{name} is not finite");
        }
    }

    #[test]
    fn test_info_fallback_for_assets_and_equity() {
        let catalog = FeatureCatalog::standard();
        let mut snapshot = sample_snapshot();
        snapshot.balance_sheet = StatementFrame::empty();
        snapshot.info.total_assets = Some(dec!(2000));
        snapshot.info.total_stockholder_equity = Some(dec!(500));
        let features = extract(&snapshot, as_of(), &catalog);

        assert_eq!(features.get(&catalog, "Equity_Ratio"), Some(0.25));
        assert_eq!(features.get(&catalog, "ROA_%"), Some(2.5));
    }

    #[test]
    fn test_debt_falls_back_to_component_lines() {
        let catalog = FeatureCatalog::standard();
        let mut snapshot = sample_snapshot();
        snapshot.balance_sheet = StatementFrame::from([
            (LINE_TOTAL_ASSETS, dec!(1000)),
            (LINE_TOTAL_EQUITY, dec!(400)),
            (LINE_TOTAL_DEBT, dec!(0)),
            (LINE_LONG_TERM_DEBT, dec!(180)),
            (LINE_SHORT_LONG_TERM_DEBT, dec!(20)),
        ]);
        let features = extract(&snapshot, as_of(), &catalog);
        assert_eq!(features.get(&catalog, "Debt_to_Equity"), Some(0.5));
    }

    #[test]
    fn test_reported_zero_fcf_is_not_approximated() {
        let catalog = FeatureCatalog::standard();
        let mut snapshot = sample_snapshot();
        snapshot.cash_flow = StatementFrame::from([
            (LINE_OPERATING_CASH_FLOW, dec!(80_000_000)),
            (LINE_CAPEX, dec!(-30_000_000)),
            (LINE_FREE_CASH_FLOW, dec!(0)),
        ]);
        let features = extract(&snapshot, as_of(), &catalog);
        // The reported zero stands; no OCF - |capex| fallback
        assert_eq!(features.get(&catalog, "Free Cf_M"), Some(0.0));
    }

    #[test]
    fn test_absent_fcf_uses_ocf_minus_capex() {
        let catalog = FeatureCatalog::standard();
        let mut snapshot = sample_snapshot();
        snapshot.cash_flow = StatementFrame::from([
            (LINE_OPERATING_CASH_FLOW, dec!(80_000_000)),
            (LINE_CAPEX, dec!(-30_000_000)),
        ]);
        let features = extract(&snapshot, as_of(), &catalog);
        assert_eq!(features.get(&catalog, "Free Cf_M"), Some(50.0));
        assert_eq!(features.get(&catalog, "Operating Cf_M"), Some(80.0));
    }

    #[test]
    fn test_calendar_features() {
        let catalog = FeatureCatalog::standard();
        let snapshot = sample_snapshot();

        let mid_month = NaiveDate::from_ymd_opt(2024, 3, 12).unwrap();
        let features = extract(&snapshot, mid_month, &catalog);
        assert_eq!(features.get(&catalog, "Is_Month_End"), Some(0.0));
        assert_eq!(features.get(&catalog, "Month_x"), Some(3.0));

        let month_end = NaiveDate::from_ymd_opt(2024, 11, 27).unwrap();
        let features = extract(&snapshot, month_end, &catalog);
        assert_eq!(features.get(&catalog, "Is_Month_End"), Some(1.0));
        assert_eq!(features.get(&catalog, "Month_x"), Some(11.0));
    }

    #[test]
    fn test_neutral_defaults_for_external_feeds() {
        let catalog = FeatureCatalog::standard();
        let features = extract(&sample_snapshot(), as_of(), &catalog);

        assert_eq!(features.get(&catalog, "Environment_Score"), Some(50.0));
        assert_eq!(features.get(&catalog, "Social_Score"), Some(50.0));
        for name in [
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
            "Egypt_FX_Crisis",
            "EGP_USD_Change_%",
            "Pandemic_Recession",
            "Very_High_Governance_Risk",
            "Has_Controversy",
            "Poor_Governance",
            "Young_Company",
            "Low_Institutional_Ownership",
        ] {
            assert_eq!(features.get(&catalog, name), Some(0.0), "{name}");
        }
    }

    #[test]
    fn test_empty_history_is_safe() {
        let catalog = FeatureCatalog::standard();
        let snapshot = RawSnapshot {
            history: Vec::new(),
            balance_sheet: StatementFrame::empty(),
            income: StatementFrame::empty(),
            cash_flow: StatementFrame::empty(),
            info: CompanyInfo::default(),
        };
        let features = extract(&snapshot, as_of(), &catalog);
        assert_eq!(features.get(&catalog, "RSI_14"), Some(50.0));
        assert_eq!(features.get(&catalog, "Low"), Some(0.0));
        assert_eq!(features.get(&catalog, "Volume"), Some(0.0));
    }
}
