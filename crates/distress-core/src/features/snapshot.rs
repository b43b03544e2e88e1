//! Raw market and fundamental data snapshot.
//!
//! The snapshot is produced by an external data-retrieval collaborator and
//! is read-only to the engine. Statement frames carry the most recent
//! reporting period only; an upstream statement with zero columns arrives
//! here as an empty frame and every line item reads as absent.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Money;

// Balance sheet line items
pub const LINE_TOTAL_ASSETS: &str = "Total Assets";
pub const LINE_TOTAL_EQUITY: &str = "Total Stockholder Equity";
pub const LINE_CURRENT_ASSETS: &str = "Current Assets";
pub const LINE_CURRENT_LIABILITIES: &str = "Current Liabilities";
pub const LINE_RETAINED_EARNINGS: &str = "Retained Earnings";
pub const LINE_TOTAL_DEBT: &str = "Total Debt";
pub const LINE_LONG_TERM_DEBT: &str = "Long Term Debt";
pub const LINE_SHORT_LONG_TERM_DEBT: &str = "Short Long Term Debt";

// Income statement line items
pub const LINE_NET_INCOME: &str = "Net Income";
pub const LINE_TOTAL_REVENUE: &str = "Total Revenue";
pub const LINE_EBIT: &str = "EBIT";

// Cash flow statement line items
pub const LINE_OPERATING_CASH_FLOW: &str = "Total Cash From Operating Activities";
pub const LINE_CAPEX: &str = "Capital Expenditures";
pub const LINE_FREE_CASH_FLOW: &str = "Free Cash Flow";

/// One daily price/volume bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Most-recent-period column of one financial statement.
///
/// `line` distinguishes a reported zero from an absent line item; callers
/// that do not care use `line_or_zero`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementFrame {
    items: BTreeMap<String, Money>,
}

impl StatementFrame {
    pub fn new(items: BTreeMap<String, Money>) -> Self {
        StatementFrame { items }
    }

    /// Empty frame: the upstream statement had zero reporting columns.
    pub fn empty() -> Self {
        StatementFrame::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line(&self, name: &str) -> Option<Money> {
        self.items.get(name).copied()
    }

    pub fn line_or_zero(&self, name: &str) -> Money {
        self.line(name).unwrap_or(Decimal::ZERO)
    }
}

impl<const N: usize> From<[(&str, Money); N]> for StatementFrame {
    fn from(entries: [(&str, Money); N]) -> Self {
        StatementFrame {
            items: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// Descriptive company information. Used as a fallback when balance sheet
/// line items are absent, matching the upstream data provider's field names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_stockholder_equity: Option<Money>,
}

/// Raw input to the analysis pipeline: price history plus the latest column
/// of each financial statement. Owned by the caller; the engine only reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    /// Ordered daily OHLCV series, oldest first.
    pub history: Vec<Candle>,
    #[serde(default)]
    pub balance_sheet: StatementFrame,
    #[serde(default)]
    pub income: StatementFrame,
    #[serde(default)]
    pub cash_flow: StatementFrame,
    #[serde(default)]
    pub info: CompanyInfo,
}

impl RawSnapshot {
    pub fn closes(&self) -> Vec<f64> {
        self.history.iter().map(|c| c.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_distinguishes_absent_from_zero() {
        let frame = StatementFrame::from([(LINE_FREE_CASH_FLOW, dec!(0))]);
        assert_eq!(frame.line(LINE_FREE_CASH_FLOW), Some(dec!(0)));
        assert_eq!(frame.line(LINE_CAPEX), None);
        assert_eq!(frame.line_or_zero(LINE_CAPEX), dec!(0));
    }

    #[test]
    fn test_empty_frame_reads_all_lines_as_absent() {
        let frame = StatementFrame::empty();
        assert!(frame.is_empty());
        assert_eq!(frame.line(LINE_TOTAL_ASSETS), None);
    }

    #[test]
    fn test_snapshot_deserializes_with_missing_statements() {
        let snapshot: RawSnapshot = serde_json::from_str(
            r#"{"history": [{"date": "2024-03-01", "open": 10.0, "high": 11.0,
                "low": 9.5, "close": 10.5, "volume": 1000.0}]}"#,
        )
        .unwrap();
        assert!(snapshot.balance_sheet.is_empty());
        assert!(snapshot.info.market_cap.is_none());
        assert_eq!(snapshot.history.len(), 1);
    }
}
