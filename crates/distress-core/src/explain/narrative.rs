//! Tier-driven assessment narrative.
//!
//! Every sentence is selected from pre-authored variants by an explicit
//! decision table: an ordered list of (predicate, sentence) rows evaluated
//! top to bottom, first match wins. There is no free text generation, so
//! identical inputs always render the identical narrative.

use serde::{Deserialize, Serialize};

use super::attribution::Attribution;
use crate::features::{FeatureCatalog, FeatureVector};
use crate::model::{PredictionResult, RiskTier};

// Indicator thresholds shared by the narratives and the signal chips.
const HEALTH_SAFE: f64 = 2.99;
const HEALTH_DISTRESS: f64 = 1.81;
const ROE_STRONG: f64 = 15.0;
const ROE_MODERATE: f64 = 5.0;
const DEBT_LOW: f64 = 1.0;
const DEBT_HIGH: f64 = 2.5;
const EQUITY_THIN: f64 = 0.3;
const VOL_EXTREME: f64 = 60.0;
const VOL_ELEVATED: f64 = 30.0;
const VOL_CALM: f64 = 20.0;
const MOMENTUM_STEEP_DECLINE: f64 = -10.0;
const RSI_LOW: f64 = 35.0;
const RSI_HIGH: f64 = 65.0;

const DEGRADED_DRIVER_NOTICE: &str = "Detailed factor analysis is not available for this model \
     type; the assessment above is based on the computed indicators alone.";

/// Severity class of a signal chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChipTone {
    Good,
    Caution,
    Risk,
}

/// Short labeled badge summarising one indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalChip {
    pub label: String,
    pub tone: ChipTone,
}

/// Identifying fields interpolated into the narrative text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    /// Reader-facing period label, e.g. "1 Year".
    pub period: String,
}

/// Structured assessment text for one prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub tier: RiskTier,
    pub headline: String,
    pub summary: String,
    pub financial_health: String,
    pub market_behaviour: String,
    /// False when the explainer was unavailable and `driver` carries the
    /// degraded notice instead of the factor analysis.
    pub explanation_available: bool,
    pub driver: Vec<String>,
    pub chips: Vec<SignalChip>,
    pub actions: Vec<String>,
}

// ---------------------------------------------------------------------------
// Indicator readout
// ---------------------------------------------------------------------------

/// The indicator values the narrative branches on, read once from the
/// feature vector.
struct Indicators {
    health_score: f64,
    roe: f64,
    net_margin: f64,
    debt_to_equity: f64,
    equity_ratio: f64,
    ocf_m: f64,
    fcf_m: f64,
    rsi: f64,
    volatility: f64,
    momentum: f64,
    bearish: bool,
}

impl Indicators {
    fn read(features: &FeatureVector, catalog: &FeatureCatalog) -> Indicators {
        let get = |name: &str, default: f64| features.get(catalog, name).unwrap_or(default);
        Indicators {
            health_score: get("Altman_Z_Score", 0.0),
            roe: get("ROE_%", 0.0),
            net_margin: get("Net_Profit_Margin_%", 0.0),
            debt_to_equity: get("Debt_to_Equity", 0.0),
            equity_ratio: get("Equity_Ratio", 0.0),
            ocf_m: get("Operating Cf_M", 0.0),
            fcf_m: get("Free Cf_M", 0.0),
            rsi: get("RSI_14", 50.0),
            volatility: get("Volatility_20", 0.0),
            momentum: get("ROC_20", 0.0),
            bearish: get("Death_Cross", 0.0) == 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Decision tables
// ---------------------------------------------------------------------------

/// One row of a decision table.
struct Rule {
    when: fn(&Indicators) -> bool,
    say: fn(&Indicators) -> String,
}

fn rule(when: fn(&Indicators) -> bool, say: fn(&Indicators) -> String) -> Rule {
    Rule { when, say }
}

/// Evaluate one table top-to-bottom; the first matching row speaks.
fn first_match(table: &[Rule], ind: &Indicators) -> String {
    table
        .iter()
        .find(|r| (r.when)(ind))
        .map(|r| (r.say)(ind))
        .unwrap_or_default()
}

/// A paragraph is a sequence of tables, one sentence each; empty sentences
/// (a table whose rows all declined) are dropped.
fn paragraph(tables: &[Vec<Rule>], ind: &Indicators) -> String {
    tables
        .iter()
        .map(|t| first_match(t, ind))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn money_m(value: f64) -> String {
    format!("${value:.0}M")
}

// --- Critical tier ----------------------------------------------------------

fn critical_financial() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(
                |i| i.health_score <= HEALTH_DISTRESS,
                |i| {
                    format!(
                        "The overall financial health score stands at {:.2} — placing it in a \
                         zone historically associated with serious financial stress.",
                        i.health_score
                    )
                },
            ),
            rule(|_| true, |i| {
                format!(
                    "The overall financial health score stands at {:.2} — sitting in an \
                     uncertain middle zone where risk is elevated.",
                    i.health_score
                )
            }),
        ],
        vec![
            rule(|i| i.roe < 0.0, |i| {
                format!(
                    "Return on equity of {:.1}% against a net profit margin of {:.1}% signals \
                     the company is eroding shareholder value.",
                    i.roe, i.net_margin
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Return on equity of {:.1}% against a net profit margin of {:.1}% reflects \
                     fragile profitability with no buffer for setbacks.",
                    i.roe, i.net_margin
                )
            }),
        ],
        vec![
            rule(|i| i.ocf_m <= 0.0, |i| {
                format!(
                    "Cash generation from operations is {} — the company is burning through \
                     cash, which is not sustainable.",
                    money_m(i.ocf_m)
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Cash generation from operations is {} — positive but insufficient to \
                     offset the other distress signals.",
                    money_m(i.ocf_m)
                )
            }),
        ],
        vec![
            rule(|i| i.debt_to_equity > DEBT_HIGH, |i| {
                format!(
                    "Debt stands at {:.2}x equity, making it highly dependent on external \
                     financing.",
                    i.debt_to_equity
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Debt stands at {:.2}x equity, adding financial pressure to an already \
                     stressed picture.",
                    i.debt_to_equity
                )
            }),
        ],
    ]
}

fn critical_market() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(|i| i.volatility > VOL_EXTREME, |i| {
                format!(
                    "Market behaviour supports the concern. Annualised price volatility of \
                     {:.1}% indicates extreme instability.",
                    i.volatility
                )
            }),
            rule(|i| i.volatility > VOL_ELEVATED, |i| {
                format!(
                    "Market behaviour supports the concern. Annualised price volatility of \
                     {:.1}% reflects elevated price behaviour.",
                    i.volatility
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Market behaviour supports the concern. Annualised price volatility of \
                     {:.1}% is moderate but consistent with underlying stress.",
                    i.volatility
                )
            }),
        ],
        vec![rule(
            |i| i.bearish,
            |_| "A bearish price signal is currently active.".to_string(),
        )],
        vec![
            rule(|i| i.momentum < MOMENTUM_STEEP_DECLINE, |i| {
                format!(
                    "Short-term price momentum stands at {:.1}% over the past month, pointing \
                     to accelerating deterioration.",
                    i.momentum
                )
            }),
            rule(|i| i.momentum < 0.0, |i| {
                format!(
                    "Short-term price momentum stands at {:.1}% over the past month, showing \
                     continued price decline.",
                    i.momentum
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Short-term price momentum stands at {:.1}% over the past month, showing \
                     some resilience despite the broader stress signals.",
                    i.momentum
                )
            }),
        ],
    ]
}

// --- High tier --------------------------------------------------------------

fn high_financial() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(|i| i.health_score <= HEALTH_DISTRESS, |i| {
                format!(
                    "The financial health score of {:.2} is in the distress zone, indicating \
                     structural weaknesses.",
                    i.health_score
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "The financial health score of {:.2} sits in an uncertain range — \
                     concerning alongside other signals.",
                    i.health_score
                )
            }),
        ],
        vec![
            rule(|i| i.roe < ROE_MODERATE, |i| {
                format!(
                    "Return on equity of {:.1}% and net profit margin of {:.1}% indicate \
                     declining earnings quality.",
                    i.roe, i.net_margin
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Return on equity of {:.1}% and net profit margin of {:.1}% indicate \
                     profitability that has weakened but not collapsed.",
                    i.roe, i.net_margin
                )
            }),
        ],
        vec![
            rule(|i| i.ocf_m < 0.0, |i| {
                format!(
                    "Operating cash generation of {} — insufficient to service debt or invest \
                     at the required level.",
                    money_m(i.ocf_m)
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Operating cash generation of {} — positive, but the combination with \
                     higher debt still raises concern.",
                    money_m(i.ocf_m)
                )
            }),
        ],
        vec![
            rule(|i| i.equity_ratio < EQUITY_THIN, |i| {
                format!(
                    "Equity ratio of {:.2} suggests limited financial flexibility.",
                    i.equity_ratio
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Equity ratio of {:.2} suggests a moderate equity base.",
                    i.equity_ratio
                )
            }),
        ],
    ]
}

fn high_market() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(|i| i.volatility > VOL_ELEVATED, |i| {
                format!(
                    "Market signals are broadly consistent with the financial picture. \
                     Volatility of {:.1}% is elevated.",
                    i.volatility
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Market signals are broadly consistent with the financial picture. \
                     Volatility of {:.1}% is moderate.",
                    i.volatility
                )
            }),
        ],
        vec![
            rule(|i| i.bearish, |_| "A bearish price signal is active.".to_string()),
            rule(|_| true, |_| {
                "No major bearish price signals are currently active.".to_string()
            }),
        ],
        vec![
            rule(|i| i.momentum < 0.0, |i| {
                format!(
                    "Price momentum over the past month is {:.1}%, indicating continued \
                     downward pressure.",
                    i.momentum
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Price momentum over the past month is {:.1}%, showing some near-term \
                     stability.",
                    i.momentum
                )
            }),
        ],
    ]
}

// --- Medium tier ------------------------------------------------------------

fn medium_financial() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(|i| i.health_score > HEALTH_SAFE, |i| {
                format!(
                    "The financial health score of {:.2} is comfortably above the safe \
                     threshold.",
                    i.health_score
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "The financial health score of {:.2} sits in an intermediate range — no \
                     immediate red flags but some stress to watch.",
                    i.health_score
                )
            }),
        ],
        vec![
            rule(
                |i| (ROE_MODERATE..=ROE_STRONG).contains(&i.roe),
                |i| {
                    format!(
                        "Return on equity of {:.1}% with net profit margin of {:.1}% are \
                         adequate but not strong enough to cushion against any earnings shock.",
                        i.roe, i.net_margin
                    )
                },
            ),
            rule(|_| true, |i| {
                format!(
                    "Return on equity of {:.1}% with net profit margin of {:.1}% are on the \
                     weaker side.",
                    i.roe, i.net_margin
                )
            }),
        ],
        vec![
            rule(|i| i.ocf_m > 0.0 && i.fcf_m > 0.0, |i| {
                format!(
                    "Operating cash flow of {} and free cash flow of {} are both positive — \
                     providing some financial headroom.",
                    money_m(i.ocf_m),
                    money_m(i.fcf_m)
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Operating cash flow of {} and free cash flow of {} are under some \
                     pressure, worth watching.",
                    money_m(i.ocf_m),
                    money_m(i.fcf_m)
                )
            }),
        ],
    ]
}

fn medium_market() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(|i| i.volatility > VOL_ELEVATED, |i| {
                format!(
                    "Market signals are mixed. Price volatility of {:.1}% is elevated.",
                    i.volatility
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Market signals are mixed. Price volatility of {:.1}% is contained.",
                    i.volatility
                )
            }),
        ],
        vec![
            rule(|i| i.momentum < 0.0, |i| {
                format!(
                    "Price momentum over the past month is {:.1}%, showing a modest downward \
                     drift.",
                    i.momentum
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Price momentum over the past month is {:.1}%, showing positive momentum.",
                    i.momentum
                )
            }),
        ],
        vec![
            rule(
                |i| !i.bearish,
                |_| "No bearish price signals are currently active.".to_string(),
            ),
            rule(|_| true, |_| "A bearish price signal has appeared.".to_string()),
        ],
    ]
}

// --- Low tier ---------------------------------------------------------------

fn low_financial() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(|i| i.health_score > HEALTH_SAFE, |i| {
                format!(
                    "The financial health score of {:.2} is comfortably above the safe \
                     threshold, reflecting a robust balance sheet.",
                    i.health_score
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "The financial health score of {:.2} is positive and does not raise any \
                     concerns.",
                    i.health_score
                )
            }),
        ],
        vec![
            rule(|i| i.roe > ROE_STRONG, |i| {
                format!(
                    "Return on equity of {:.1}% reflects strong returns for shareholders.",
                    i.roe
                )
            }),
            rule(|_| true, |i| {
                format!("Return on equity of {:.1}% reflects healthy profitability.", i.roe)
            }),
        ],
        vec![rule(|_| true, |i| {
            format!(
                "Net profit margin of {:.1}% demonstrates solid earnings performance.",
                i.net_margin
            )
        })],
        vec![rule(|_| true, |i| {
            format!(
                "Operating cash flow of {} and free cash flow of {} confirm the company is \
                 generating real cash — a key sign of sustainable financial strength.",
                money_m(i.ocf_m),
                money_m(i.fcf_m)
            )
        })],
        vec![
            rule(|i| i.debt_to_equity < DEBT_LOW, |i| {
                format!(
                    "With debt at {:.2}x equity, the balance sheet is conservatively \
                     positioned.",
                    i.debt_to_equity
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "With debt at {:.2}x equity, the balance sheet is in a manageable position.",
                    i.debt_to_equity
                )
            }),
        ],
    ]
}

fn low_market() -> Vec<Vec<Rule>> {
    vec![
        vec![
            rule(|i| i.volatility < VOL_CALM, |i| {
                format!(
                    "Market signals are broadly positive. Price volatility of {:.1}% is low, \
                     consistent with stable investor sentiment.",
                    i.volatility
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Market signals are broadly positive. Price volatility of {:.1}% is \
                     moderate and not a concern given the underlying fundamentals.",
                    i.volatility
                )
            }),
        ],
        vec![
            rule(
                |i| !i.bearish,
                |_| "No bearish price signals are active.".to_string(),
            ),
            rule(|_| true, |_| {
                "A bearish price signal has technically appeared, but is not corroborated by \
                 the fundamentals — likely short-term noise."
                    .to_string()
            }),
        ],
        vec![
            rule(|i| i.momentum > 0.0, |i| {
                format!(
                    "Price momentum over the past month is {:.1}%, showing positive near-term \
                     performance.",
                    i.momentum
                )
            }),
            rule(|_| true, |i| {
                format!(
                    "Price momentum over the past month is {:.1}%, showing mild softness which \
                     is not unusual for a financially healthy company.",
                    i.momentum
                )
            }),
        ],
    ]
}

// ---------------------------------------------------------------------------
// Tier templates
// ---------------------------------------------------------------------------

fn headline(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Critical => "Critical Risk — Immediate Attention Required",
        RiskTier::High => "High Risk — Close Monitoring Recommended",
        RiskTier::Medium => "Moderate Risk — Worth Monitoring",
        RiskTier::Low => "Low Risk — Financially Sound",
    }
}

fn summary(tier: RiskTier, probability: f64, subject: &Subject) -> String {
    let pct = format!("{:.1}%", probability * 100.0);
    let name = &subject.name;
    let period = &subject.period;
    match tier {
        RiskTier::Critical => format!(
            "The analysis assigns a {pct} probability of financial distress to {name} over \
             the {period} period. This is the highest severity classification, indicating \
             serious financial strain that requires prompt action."
        ),
        RiskTier::High => format!(
            "{name} has been flagged as financially distressed, with a {pct} probability of \
             distress over the {period} period. This signals meaningful financial weakness \
             that warrants close and proactive attention."
        ),
        RiskTier::Medium => format!(
            "{name} is not currently classified as distressed, but the analysis assigns a \
             {pct} probability of distress over the {period} period. The company appears \
             stable today, but early-warning signals recommend ongoing observation."
        ),
        RiskTier::Low => format!(
            "{name} is in good financial health. The analysis assigns only a {pct} \
             probability of distress over the {period} period — placing it firmly in the \
             low-risk category."
        ),
    }
}

fn actions(tier: RiskTier) -> Vec<String> {
    let list: &[&str] = match tier {
        RiskTier::Critical => &[
            "Review the company's cash position and near-term financial obligations immediately.",
            "Assess whether outstanding debts can be refinanced or renegotiated before maturity.",
            "Examine whether operational cost reductions could restore positive cash generation.",
            "Increase monitoring frequency significantly until the risk picture improves.",
            "Consider whether the current level of exposure to this company is appropriate.",
        ],
        RiskTier::High => &[
            "Conduct a detailed cash flow and liquidity review covering the next 12 months.",
            "Identify and review any debt covenants or obligations with approaching deadlines.",
            "Assess operational efficiency — where can costs be reduced or working capital improved?",
            "Monitor the next quarterly results closely for early signs of improvement.",
            "Review whether the current level of exposure is appropriate given the risk profile.",
        ],
        RiskTier::Medium => &[
            "Continue monitoring on a monthly basis.",
            "Track the next earnings release for any signs of deterioration.",
            "Stay aware of broader sector conditions — particularly oil prices and regional economic shifts.",
            "No immediate action required, but flag as a company to watch.",
        ],
        RiskTier::Low => &[
            "No immediate action required — the company is in good financial standing.",
            "Continue with standard periodic monitoring.",
            "This company can serve as a useful benchmark for peer comparisons within the sector.",
            "Keep an eye on broader macro conditions (oil prices, interest rates, regional currency moves).",
        ],
    };
    list.iter().map(|s| s.to_string()).collect()
}

fn financial_tables(tier: RiskTier) -> Vec<Vec<Rule>> {
    match tier {
        RiskTier::Critical => critical_financial(),
        RiskTier::High => high_financial(),
        RiskTier::Medium => medium_financial(),
        RiskTier::Low => low_financial(),
    }
}

fn market_tables(tier: RiskTier) -> Vec<Vec<Rule>> {
    match tier {
        RiskTier::Critical => critical_market(),
        RiskTier::High => high_market(),
        RiskTier::Medium => medium_market(),
        RiskTier::Low => low_market(),
    }
}

// ---------------------------------------------------------------------------
// Signal chips
// ---------------------------------------------------------------------------

fn chip(tone: ChipTone, label: String) -> SignalChip {
    SignalChip { label, tone }
}

/// Build the six indicator badges. Independent of the tier narrative; the
/// bearish-signal chip only appears while the signal is active.
fn build_chips(ind: &Indicators) -> Vec<SignalChip> {
    let mut chips = Vec::with_capacity(6);

    let z = ind.health_score;
    chips.push(if z > HEALTH_SAFE {
        chip(ChipTone::Good, format!("Financial Health Score: {z:.2} — Strong"))
    } else if z > HEALTH_DISTRESS {
        chip(ChipTone::Caution, format!("Financial Health Score: {z:.2} — Caution"))
    } else {
        chip(ChipTone::Risk, format!("Financial Health Score: {z:.2} — Weak"))
    });

    let roe = ind.roe;
    chips.push(if roe > ROE_STRONG {
        chip(ChipTone::Good, format!("Return on Equity: {roe:.1}% — Strong"))
    } else if roe > ROE_MODERATE {
        chip(ChipTone::Caution, format!("Return on Equity: {roe:.1}% — Moderate"))
    } else {
        chip(ChipTone::Risk, format!("Return on Equity: {roe:.1}% — Low"))
    });

    let de = ind.debt_to_equity;
    chips.push(if de < DEBT_LOW {
        chip(ChipTone::Good, format!("Debt Level: {de:.2}x — Low"))
    } else if de < DEBT_HIGH {
        chip(ChipTone::Caution, format!("Debt Level: {de:.2}x — Moderate"))
    } else {
        chip(ChipTone::Risk, format!("Debt Level: {de:.2}x — High"))
    });

    chips.push(if ind.ocf_m > 0.0 {
        chip(ChipTone::Good, format!("Cash Generation: +{}", money_m(ind.ocf_m)))
    } else {
        chip(ChipTone::Risk, format!("Cash Generation: {}", money_m(ind.ocf_m)))
    });

    if ind.bearish {
        chips.push(chip(ChipTone::Risk, "Bearish Price Signal Active".to_string()));
    }

    let rsi = ind.rsi;
    chips.push(if rsi < RSI_LOW {
        chip(ChipTone::Caution, format!("Price Momentum: {rsi:.0} — Low"))
    } else if rsi > RSI_HIGH {
        chip(ChipTone::Caution, format!("Price Momentum: {rsi:.0} — Elevated"))
    } else {
        chip(ChipTone::Good, format!("Price Momentum: {rsi:.0} — Stable"))
    });

    chips
}

// ---------------------------------------------------------------------------
// Attribution driver paragraphs
// ---------------------------------------------------------------------------

fn label_list(contributions: &[super::attribution::FeatureContribution], catalog: &FeatureCatalog) -> String {
    contributions
        .iter()
        .map(|c| catalog.label(&c.feature).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn driver_paragraphs(
    predicted_label: u8,
    attribution: &Attribution,
    catalog: &FeatureCatalog,
) -> Vec<String> {
    let top = attribution
        .primary_driver()
        .map(|c| catalog.label(&c.feature).to_string())
        .unwrap_or_else(|| "an unknown factor".to_string());

    let positives = attribution.top_positive(3);
    let pos = if positives.is_empty() {
        "no strong positive contributors".to_string()
    } else {
        label_list(&positives, catalog)
    };

    let negatives = attribution.top_negative(3);
    let neg = if negatives.is_empty() {
        "no strong negative contributors".to_string()
    } else {
        label_list(&negatives, catalog)
    };

    if predicted_label == 1 {
        vec![
            format!(
                "The model reached its distress classification primarily because of {top}, \
                 which had the single largest influence on the outcome."
            ),
            format!(
                "The factors most strongly raising the distress signal are: {pos}. These \
                 indicate areas of financial or market stress weighted heavily by the model."
            ),
            format!(
                "On the positive side, the following factors are working in the company's \
                 favour and reducing the risk score: {neg}. Without these, the assessed risk \
                 would be even higher."
            ),
        ]
    } else {
        vec![
            format!(
                "The model classified this company as financially healthy, with {top} being \
                 the most influential factor in that conclusion."
            ),
            format!(
                "The factors most strongly supporting the healthy classification are: {neg}. \
                 These reflect positive financial and market signals the model found \
                 reassuring."
            ),
            format!(
                "Some factors do introduce minor risk into the picture: {pos}. However, these \
                 are outweighed by the positive signals and do not change the overall outcome."
            ),
        ]
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Render the full narrative for one prediction.
///
/// Total and deterministic. When `attribution` is absent the summary,
/// financial, and market paragraphs still render; only the driver section
/// degrades to a notice.
pub fn compose(
    prediction: &PredictionResult,
    features: &FeatureVector,
    attribution: Option<&Attribution>,
    subject: &Subject,
    catalog: &FeatureCatalog,
) -> Narrative {
    let ind = Indicators::read(features, catalog);
    let tier = prediction.risk_tier;

    let (explanation_available, driver) = match attribution {
        Some(attribution) => (
            true,
            driver_paragraphs(prediction.predicted_label, attribution, catalog),
        ),
        None => (false, vec![DEGRADED_DRIVER_NOTICE.to_string()]),
    };

    Narrative {
        tier,
        headline: headline(tier).to_string(),
        summary: summary(tier, prediction.probability, subject),
        financial_health: paragraph(&financial_tables(tier), &ind),
        market_behaviour: paragraph(&market_tables(tier), &ind),
        explanation_available,
        driver,
        chips: build_chips(&ind),
        actions: actions(tier),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::attribution::attribute;
    use crate::features::FEATURE_COUNT;
    use crate::model::Explainer;
    use crate::DistressResult;

    fn subject() -> Subject {
        Subject {
            name: "Test Industrial".to_string(),
            period: "1 Year".to_string(),
        }
    }

    fn prediction(label: u8, probability: f64) -> PredictionResult {
        PredictionResult {
            predicted_label: label,
            probability,
            risk_tier: RiskTier::from_probability(probability),
        }
    }

    fn features_with(overrides: &[(&str, f64)]) -> FeatureVector {
        let catalog = FeatureCatalog::standard();
        let mut values = vec![0.0; FEATURE_COUNT];
        for (name, value) in overrides {
            values[catalog.index_of(name).unwrap()] = *value;
        }
        FeatureVector::from_values(values, &catalog).unwrap()
    }

    struct FixedExplainer(Vec<f64>);

    impl Explainer for FixedExplainer {
        fn baseline(&self) -> f64 {
            0.0
        }

        fn contributions(&self, _features: &[f64]) -> DistressResult<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_each_tier_selects_its_template() {
        let catalog = FeatureCatalog::standard();
        let features = features_with(&[]);
        let cases = [
            (0.1, "Low Risk"),
            (0.35, "Moderate Risk"),
            (0.55, "High Risk"),
            (0.8, "Critical Risk"),
        ];
        for (p, expected) in cases {
            let n = compose(&prediction(1, p), &features, None, &subject(), &catalog);
            assert!(n.headline.starts_with(expected), "p={p}: {}", n.headline);
        }
    }

    #[test]
    fn test_summary_interpolates_subject_and_probability() {
        let catalog = FeatureCatalog::standard();
        let features = features_with(&[]);
        let n = compose(&prediction(1, 0.62), &features, None, &subject(), &catalog);
        assert!(n.summary.contains("Test Industrial"), "{}", n.summary);
        assert!(n.summary.contains("62.0%"), "{}", n.summary);
        assert!(n.summary.contains("1 Year"), "{}", n.summary);
    }

    #[test]
    fn test_critical_financial_branches_on_health_score() {
        let catalog = FeatureCatalog::standard();
        let distressed = features_with(&[("Altman_Z_Score", 1.2)]);
        let n = compose(&prediction(1, 0.85), &distressed, None, &subject(), &catalog);
        assert!(
            n.financial_health.contains("serious financial stress"),
            "{}",
            n.financial_health
        );

        let grey = features_with(&[("Altman_Z_Score", 2.2)]);
        let n = compose(&prediction(1, 0.85), &grey, None, &subject(), &catalog);
        assert!(
            n.financial_health.contains("uncertain middle zone"),
            "{}",
            n.financial_health
        );
    }

    #[test]
    fn test_market_paragraph_reports_bearish_signal_only_when_active() {
        let catalog = FeatureCatalog::standard();
        let bearish = features_with(&[("Death_Cross", 1.0)]);
        let n = compose(&prediction(1, 0.85), &bearish, None, &subject(), &catalog);
        assert!(
            n.market_behaviour.contains("bearish price signal is currently active"),
            "{}",
            n.market_behaviour
        );

        let calm = features_with(&[]);
        let n = compose(&prediction(1, 0.85), &calm, None, &subject(), &catalog);
        assert!(
            !n.market_behaviour.contains("bearish"),
            "{}",
            n.market_behaviour
        );
    }

    #[test]
    fn test_chips_cover_six_indicators() {
        let catalog = FeatureCatalog::standard();
        let features = features_with(&[
            ("Altman_Z_Score", 3.5),
            ("ROE_%", 18.0),
            ("Debt_to_Equity", 0.5),
            ("Operating Cf_M", 120.0),
            ("RSI_14", 50.0),
        ]);
        let n = compose(&prediction(0, 0.1), &features, None, &subject(), &catalog);
        assert_eq!(n.chips.len(), 5);
        assert!(n.chips.iter().all(|c| c.tone == ChipTone::Good), "{:?}", n.chips);

        let stressed = features_with(&[
            ("Altman_Z_Score", 1.0),
            ("ROE_%", -2.0),
            ("Debt_to_Equity", 3.0),
            ("Operating Cf_M", -15.0),
            ("Death_Cross", 1.0),
            ("RSI_14", 25.0),
        ]);
        let n = compose(&prediction(1, 0.8), &stressed, None, &subject(), &catalog);
        assert_eq!(n.chips.len(), 6);
        let risk_count = n.chips.iter().filter(|c| c.tone == ChipTone::Risk).count();
        assert_eq!(risk_count, 5, "{:?}", n.chips);
        assert_eq!(n.chips.last().unwrap().tone, ChipTone::Caution);
    }

    #[test]
    fn test_actions_are_fixed_per_tier() {
        let catalog = FeatureCatalog::standard();
        let features = features_with(&[]);
        let critical = compose(&prediction(1, 0.9), &features, None, &subject(), &catalog);
        assert_eq!(critical.actions.len(), 5);
        let low = compose(&prediction(0, 0.05), &features, None, &subject(), &catalog);
        assert_eq!(low.actions.len(), 4);
        assert!(low.actions[0].contains("No immediate action required"));
    }

    #[test]
    fn test_degraded_mode_replaces_driver_only() {
        let catalog = FeatureCatalog::standard();
        let features = features_with(&[]);
        let n = compose(&prediction(1, 0.62), &features, None, &subject(), &catalog);
        assert!(!n.explanation_available);
        assert_eq!(n.driver.len(), 1);
        assert!(n.driver[0].contains("not available"));
        assert!(!n.summary.is_empty());
        assert!(!n.financial_health.is_empty());
        assert!(!n.market_behaviour.is_empty());
    }

    #[test]
    fn test_driver_paragraphs_name_top_factors() {
        let catalog = FeatureCatalog::standard();
        let features = features_with(&[]);
        let mut contributions = vec![0.0; FEATURE_COUNT];
        let z_idx = catalog.index_of("Altman_Z_Score").unwrap();
        let rsi_idx = catalog.index_of("RSI_14").unwrap();
        contributions[z_idx] = 0.9;
        contributions[rsi_idx] = -0.4;
        let attribution = attribute(
            &FixedExplainer(contributions),
            &vec![0.0; FEATURE_COUNT],
            &catalog,
        )
        .unwrap();

        let n = compose(
            &prediction(1, 0.62),
            &features,
            Some(&attribution),
            &subject(),
            &catalog,
        );
        assert!(n.explanation_available);
        assert_eq!(n.driver.len(), 3);
        assert!(n.driver[0].contains("Financial Health Score"), "{}", n.driver[0]);
        assert!(n.driver[2].contains("Price Momentum"), "{}", n.driver[2]);

        let healthy = compose(
            &prediction(0, 0.1),
            &features,
            Some(&attribution),
            &subject(),
            &catalog,
        );
        assert!(healthy.driver[0].contains("financially healthy"), "{}", healthy.driver[0]);
    }
}
