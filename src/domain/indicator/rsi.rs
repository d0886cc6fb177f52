//! RSI built from EMAs of the open→close up/down magnitudes.
//!
//! Each bar contributes `close - open` to the up line when it closed up
//! and `open - close` to the down line when it closed down (zero
//! otherwise); both lines are EMA-smoothed and
//! `RSI = up / (up + down) * 100`.

use crate::domain::bar::Bar;

use super::ema_alpha;

/// RSI value reported when both smoothed magnitudes are zero.
pub const RSI_NEUTRAL: f64 = 50.0;

/// EMA of per-bar upward open→close magnitudes.
pub fn oc_up_ema(bars: &[Bar], alpha: f64) -> Vec<f64> {
    let magnitudes: Vec<f64> = bars
        .iter()
        .map(|b| if b.close > b.open { b.close - b.open } else { 0.0 })
        .collect();
    ema_alpha(&magnitudes, alpha)
}

/// EMA of per-bar downward open→close magnitudes.
pub fn oc_down_ema(bars: &[Bar], alpha: f64) -> Vec<f64> {
    let magnitudes: Vec<f64> = bars
        .iter()
        .map(|b| if b.open > b.close { b.open - b.close } else { 0.0 })
        .collect();
    ema_alpha(&magnitudes, alpha)
}

/// RSI from the two smoothed magnitude lines.
///
/// A flat stretch where both lines are zero reports [`RSI_NEUTRAL`]
/// instead of dividing zero by zero.
pub fn rsi(up_ema: &[f64], down_ema: &[f64]) -> Vec<f64> {
    up_ema
        .iter()
        .zip(down_ema)
        .map(|(&u, &d)| {
            if u + d == 0.0 {
                RSI_NEUTRAL
            } else {
                u / (u + d) * 100.0
            }
        })
        .collect()
}
