//! Directional movement family: TR, ATR, DM±, DI±, DX, ADX.

use crate::domain::bar::Bar;

use super::ema_alpha;

/// DX value reported while DI+ and DI− are both zero.
pub const DX_NEUTRAL: f64 = 30.0;

/// True range per bar. The first bar has no prior close, so its range
/// is simply high − low.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, b)| {
            if i == 0 {
                b.high - b.low
            } else {
                let prev_close = bars[i - 1].close;
                (b.high - b.low)
                    .max(b.high - prev_close)
                    .max(prev_close - b.low)
            }
        })
        .collect()
}

/// EMA-smoothed true range.
pub fn atr(true_range: &[f64], alpha: f64) -> Vec<f64> {
    ema_alpha(true_range, alpha)
}

/// Positive directional movement: the high advance when it exceeds the
/// low decline, zero otherwise (and zero on the first bar).
pub fn dm_plus(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, b)| {
            if i == 0 {
                return 0.0;
            }
            let hm = b.high - bars[i - 1].high;
            let lm = bars[i - 1].low - b.low;
            if hm > lm && hm > 0.0 { hm } else { 0.0 }
        })
        .collect()
}

/// Negative directional movement, mirror of [`dm_plus`].
pub fn dm_minus(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, b)| {
            if i == 0 {
                return 0.0;
            }
            let hm = b.high - bars[i - 1].high;
            let lm = bars[i - 1].low - b.low;
            if hm < lm && lm > 0.0 { lm } else { 0.0 }
        })
        .collect()
}

/// Directional indicator: smoothed DM as a percentage of ATR.
/// A zero-range stretch (ATR = 0) reports 0 rather than dividing by zero.
pub fn di(dm_ema: &[f64], atr: &[f64]) -> Vec<f64> {
    dm_ema
        .iter()
        .zip(atr)
        .map(|(&dm, &tr)| if tr == 0.0 { 0.0 } else { dm / tr * 100.0 })
        .collect()
}

/// Directional index from DI+ and DI−, with [`DX_NEUTRAL`] standing in
/// while both indicators are zero.
pub fn dx(di_plus: &[f64], di_minus: &[f64]) -> Vec<f64> {
    di_plus
        .iter()
        .zip(di_minus)
        .map(|(&p, &m)| {
            if p + m == 0.0 {
                DX_NEUTRAL
            } else {
                (p - m).abs() / (p + m) * 100.0
            }
        })
        .collect()
}

/// EMA-smoothed DX.
pub fn adx(dx: &[f64], alpha: f64) -> Vec<f64> {
    ema_alpha(dx, alpha)
}
