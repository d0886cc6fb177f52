#![allow(dead_code)]

use std::collections::HashSet;

use emasweep::domain::bar::{Bar, BarSeries};
use emasweep::domain::pipeline::EngineConfig;
use emasweep::domain::position::{BenefitTiming, PatternGate};
use emasweep::domain::sweep::SweepConfig;

/// Flat bar: open == close, one-minute spacing.
pub fn flat_bar(i: usize, close: f64) -> Bar {
    Bar {
        index: i,
        timestamp: i as i64 * 60,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
    }
}

pub fn flat_series(closes: &[f64]) -> BarSeries {
    BarSeries::from_bars(
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| flat_bar(i, c))
            .collect(),
    )
}

/// Gate that admits every golden pattern and no dead pattern, so a
/// leading dead cross cannot open a long.
pub fn golden_only(n_dec: usize) -> PatternGate {
    PatternGate::install((0..1u32 << n_dec).collect(), HashSet::new())
}

/// Tight sweep over the single pair (2, 3) with extremes disabled.
pub fn single_pair_config() -> SweepConfig {
    SweepConfig {
        n_ema_min: 2,
        n_ema_max: 3,
        base: EngineConfig {
            n_ema1: 2,
            n_ema2: 3,
            delta: 1000.0,
            timing: BenefitTiming::Worst,
            ..EngineConfig::default()
        },
    }
}

/// Closes that golden-cross once at bar 3, fill at bar 4 (entry 121),
/// dead-cross at bar 5 and settle at bar 6 (exit 59) for the (2, 3)
/// EMA pair: one realized short worth 62.
pub fn one_short_closes() -> Vec<f64> {
    vec![100.0, 90.0, 80.0, 120.0, 121.0, 60.0, 59.0, 58.0]
}

/// Bar CSV content for a flat-bar close sequence.
pub fn bars_csv(closes: &[f64]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for (i, c) in closes.iter().enumerate() {
        let minutes = 30 + i;
        out.push_str(&format!(
            "2024-01-15T{:02}:{:02}:00,{c},{c},{c},{c},1\n",
            9 + minutes / 60,
            minutes % 60,
        ));
    }
    out
}
