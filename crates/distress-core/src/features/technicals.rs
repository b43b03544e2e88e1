//! Rolling market statistics derived from the daily price history.
//!
//! Every statistic has a minimum history requirement. When the window is not
//! covered the statistic evaluates to its neutral value (50 for RSI, 0 for
//! everything else) instead of erroring; short histories are an expected
//! input, not a failure.

use super::snapshot::Candle;

/// RSI averaging window (diffs, not closes).
pub const RSI_PERIOD: usize = 14;
/// Fast moving average window for the bearish-crossover flag.
pub const CROSSOVER_FAST: usize = 50;
/// Slow moving average window for the bearish-crossover flag.
pub const CROSSOVER_SLOW: usize = 200;
/// Return window for annualized volatility and rate of change.
pub const MOMENTUM_WINDOW: usize = 20;
/// Trading days per year, used to annualize daily return volatility.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

const RSI_NEUTRAL: f64 = 50.0;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Close-to-close percent changes, skipping pairs with a non-positive base.
fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// 14-period relative strength index over the most recent window.
///
/// Neutral 50 when the history is too short or the window has no losses
/// (undefined relative strength).
pub fn rsi_14(closes: &[f64]) -> f64 {
    if closes.len() < RSI_PERIOD + 1 {
        return RSI_NEUTRAL;
    }
    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let window = &diffs[diffs.len() - RSI_PERIOD..];
    let avg_gain = window.iter().filter(|d| **d > 0.0).sum::<f64>() / RSI_PERIOD as f64;
    let avg_loss = -window.iter().filter(|d| **d < 0.0).sum::<f64>() / RSI_PERIOD as f64;
    if avg_loss == 0.0 {
        return RSI_NEUTRAL;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// 1 when both the 50- and 200-period close averages exist and the fast
/// average sits below the slow one; 0 otherwise.
pub fn bearish_crossover(closes: &[f64]) -> f64 {
    if closes.len() < CROSSOVER_SLOW {
        return 0.0;
    }
    let fast = mean(&closes[closes.len() - CROSSOVER_FAST..]);
    let slow = mean(&closes[closes.len() - CROSSOVER_SLOW..]);
    if fast < slow {
        1.0
    } else {
        0.0
    }
}

/// Annualized volatility over the last 20 daily returns, in percent.
pub fn annualized_volatility_20(closes: &[f64]) -> f64 {
    let returns = daily_returns(closes);
    if returns.len() < MOMENTUM_WINDOW {
        return 0.0;
    }
    let window = &returns[returns.len() - MOMENTUM_WINDOW..];
    sample_std_dev(window) * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// 20-period rate of change, in percent.
pub fn rate_of_change_20(closes: &[f64]) -> f64 {
    if closes.len() <= MOMENTUM_WINDOW {
        return 0.0;
    }
    let reference = closes[closes.len() - 1 - MOMENTUM_WINDOW];
    if reference == 0.0 {
        return 0.0;
    }
    (closes[closes.len() - 1] - reference) / reference * 100.0
}

/// True range of the latest candle: the widest of the candle's own span and
/// its two gap distances from the prior close.
pub fn true_range(history: &[Candle]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let last = &history[history.len() - 1];
    let prev_close = history[history.len() - 2].close;
    (last.high - last.low)
        .max((last.high - prev_close).abs())
        .max((last.low - prev_close).abs())
}

/// Latest close-to-close percent change.
pub fn latest_daily_return_pct(closes: &[f64]) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let prev = closes[closes.len() - 2];
    if prev <= 0.0 {
        return 0.0;
    }
    (closes[closes.len() - 1] / prev - 1.0) * 100.0
}

/// Latest candle's high-low spread relative to its open, in percent.
pub fn latest_price_range_pct(history: &[Candle]) -> f64 {
    match history.last() {
        Some(last) if last.open > 0.0 => (last.high - last.low) / last.open * 100.0,
        _ => 0.0,
    }
}

/// Average daily volume over the full history.
pub fn mean_volume(history: &[Candle]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().map(|c| c.volume).sum::<f64>() / history.len() as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            open,
            high,
            low,
            close,
            volume: 1_000.0,
        }
    }

    #[test]
    fn test_rsi_short_history_is_neutral() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi_14(&closes), 50.0);
    }

    #[test]
    fn test_rsi_all_gains_is_neutral() {
        // No losing days leaves relative strength undefined
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi_14(&closes), 50.0);
    }

    #[test]
    fn test_rsi_mixed_window() {
        // Last 14 diffs: seven +2 days and seven -1 days
        // avg gain = 1.0, avg loss = 0.5, RS = 2, RSI = 100 - 100/3
        let mut closes = vec![100.0];
        for i in 0..14 {
            let diff = if i % 2 == 0 { 2.0 } else { -1.0 };
            closes.push(closes[closes.len() - 1] + diff);
        }
        let rsi = rsi_14(&closes);
        assert!((rsi - (100.0 - 100.0 / 3.0)).abs() < 1e-9, "got {rsi}");
    }

    #[test]
    fn test_bearish_crossover_requires_slow_window() {
        let declining: Vec<f64> = (0..199).map(|i| 400.0 - i as f64).collect();
        assert_eq!(bearish_crossover(&declining), 0.0);

        let declining: Vec<f64> = (0..200).map(|i| 400.0 - i as f64).collect();
        assert_eq!(bearish_crossover(&declining), 1.0);

        let rising: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        assert_eq!(bearish_crossover(&rising), 0.0);
    }

    #[test]
    fn test_volatility_flat_series_is_zero() {
        let closes = vec![50.0; 40];
        assert_eq!(annualized_volatility_20(&closes), 0.0);
    }

    #[test]
    fn test_volatility_short_history_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        // 19 returns < 20-return window
        assert_eq!(annualized_volatility_20(&closes), 0.0);
    }

    #[test]
    fn test_volatility_annualization() {
        // Alternate +1%/-1% style moves to get a known std-dev scale
        let mut closes = vec![100.0];
        for i in 0..25 {
            let factor = if i % 2 == 0 { 1.01 } else { 0.99 };
            closes.push(closes[closes.len() - 1] * factor);
        }
        let vol = annualized_volatility_20(&closes);
        assert!(vol > 0.0 && vol.is_finite());
        // Daily std-dev of ±1% alternation is ~1.03%, annualized ~16%
        assert!((10.0..25.0).contains(&vol), "got {vol}");
    }

    #[test]
    fn test_rate_of_change_20() {
        let mut closes = vec![100.0; 21];
        closes[0] = 100.0;
        *closes.last_mut().unwrap() = 110.0;
        assert!((rate_of_change_20(&closes) - 10.0).abs() < 1e-12);

        let short = vec![100.0; 20];
        assert_eq!(rate_of_change_20(&short), 0.0);
    }

    #[test]
    fn test_true_range_takes_widest_distance() {
        let history = vec![candle(99.0, 101.0, 98.0, 100.0), candle(100.0, 105.0, 95.0, 97.0)];
        // candle span 10, |high - prev close| = 5, |low - prev close| = 5
        assert_eq!(true_range(&history), 10.0);

        let gapped = vec![candle(99.0, 101.0, 98.0, 100.0), candle(112.0, 113.0, 111.0, 112.0)];
        // span 2, high gap 13, low gap 11
        assert_eq!(true_range(&gapped), 13.0);

        assert_eq!(true_range(&history[..1]), 0.0);
    }

    #[test]
    fn test_latest_daily_return_guards_zero_base() {
        assert_eq!(latest_daily_return_pct(&[0.0, 10.0]), 0.0);
        assert!((latest_daily_return_pct(&[100.0, 102.0]) - 2.0).abs() < 1e-12);
        assert_eq!(latest_daily_return_pct(&[100.0]), 0.0);
    }

    #[test]
    fn test_price_range_pct() {
        let history = vec![candle(100.0, 104.0, 98.0, 101.0)];
        assert!((latest_price_range_pct(&history) - 6.0).abs() < 1e-12);
        let zero_open = vec![candle(0.0, 104.0, 98.0, 101.0)];
        assert_eq!(latest_price_range_pct(&zero_open), 0.0);
    }
}
