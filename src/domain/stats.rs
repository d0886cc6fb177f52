//! Per-pattern benefit statistics and box-plot datasets.
//!
//! Observations with `|x| > 100000` are treated as degenerate backtest
//! artifacts and dropped before aggregation; they still exist in the
//! cumulative ledger they came from.

use serde::{Deserialize, Serialize};

/// Magnitude above which a benefit observation is excluded from stats.
pub const OUTLIER_LIMIT: f64 = 100_000.0;

/// Summary of one pattern symbol's benefit observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternStat {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
}

/// Box-plot dataset for one pattern symbol, 1.5×IQR fence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxPlot {
    pub symbol: u32,
    pub outliers: Vec<f64>,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

impl PatternStat {
    /// Aggregate a pattern's observations, dropping degenerate values
    /// first. An empty (or fully degenerate) population is all zeros.
    pub fn from_observations(values: &[f64]) -> Self {
        let kept: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| v.abs() <= OUTLIER_LIMIT)
            .collect();
        if kept.is_empty() {
            return PatternStat::default();
        }

        let mean = kept.iter().sum::<f64>() / kept.len() as f64;
        let var = kept.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / kept.len() as f64;
        PatternStat {
            max: kept.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: kept.iter().copied().fold(f64::INFINITY, f64::min),
            mean,
            std: var.sqrt(),
            median: quantile(&sorted(&kept), 0.5),
        }
    }
}

impl BoxPlot {
    /// Quartiles, whiskers and outliers for one symbol's observations.
    /// Empty input produces the all-zero dataset.
    pub fn from_observations(symbol: u32, values: &[f64]) -> Self {
        if values.is_empty() {
            return BoxPlot {
                symbol,
                ..BoxPlot::default()
            };
        }

        let ordered = sorted(values);
        let q1 = quantile(&ordered, 0.25);
        let median = quantile(&ordered, 0.5);
        let q3 = quantile(&ordered, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let (inside, outliers): (Vec<f64>, Vec<f64>) = ordered
            .iter()
            .partition(|&&v| v >= lo_fence && v <= hi_fence);

        // the fences always admit the quartiles, so `inside` is nonempty
        let lower_whisker = inside.first().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);

        BoxPlot {
            symbol,
            outliers,
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
        }
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Quantile with linear interpolation between order statistics.
/// `ordered` must be sorted and nonempty.
fn quantile(ordered: &[f64], q: f64) -> f64 {
    let rank = q * (ordered.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        ordered[lo]
    } else {
        let frac = rank - lo as f64;
        ordered[lo] * (1.0 - frac) + ordered[hi] * frac
    }
}
