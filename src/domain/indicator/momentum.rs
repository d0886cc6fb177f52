//! Momentum and the two rate-of-change variants.
//!
//! All three report 0 for the first `n` bars where no lookback exists.

use crate::domain::bar::Bar;

/// Average close change per bar over the last `n` bars.
pub fn momentum(bars: &[Bar], n: usize) -> Vec<f64> {
    lookback(bars, n, |cur, prev| (cur - prev) / n as f64)
}

/// Rate of change relative to the current close, in percent.
pub fn roc1(bars: &[Bar], n: usize) -> Vec<f64> {
    lookback(bars, n, |cur, prev| (cur - prev) / cur * 100.0)
}

/// Rate of change relative to the lookback close, in percent.
pub fn roc2(bars: &[Bar], n: usize) -> Vec<f64> {
    lookback(bars, n, |cur, prev| (cur - prev) / prev * 100.0)
}

fn lookback(bars: &[Bar], n: usize, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, b)| {
            if i < n {
                0.0
            } else {
                f(b.close, bars[i - n].close)
            }
        })
        .collect()
}
