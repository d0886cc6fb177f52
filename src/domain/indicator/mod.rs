//! Technical indicator implementations.
//!
//! Batch functions operate over full bar slices and return one value per
//! bar, seeded at the first bar rather than carrying a warmup gap. The
//! streaming counterpart for the signal path is [`ema::EmaState`], which
//! the live pipeline advances one bar at a time.

pub mod bollinger;
pub mod directional;
pub mod ema;
pub mod macd;
pub mod momentum;
pub mod rsi;

pub use bollinger::{bollinger_bands, rms_error, BollingerBands};
pub use directional::{adx, atr, di, dm_minus, dm_plus, dx, true_range, DX_NEUTRAL};
pub use ema::{ema, ema_alpha, EmaState};
pub use macd::{macd_line, macd_signal};
pub use momentum::{momentum, roc1, roc2};
pub use rsi::{oc_down_ema, oc_up_ema, rsi, RSI_NEUTRAL};

/// Smoothing factor for an N-period EMA.
pub fn alpha(n: usize) -> f64 {
    2.0 / (n as f64 + 1.0)
}
