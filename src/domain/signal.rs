//! Cross and extreme signals derived from the two EMA lines.

use serde::{Deserialize, Serialize};

/// EMA1/EMA2 crossing event for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossSignal {
    Golden,
    Dead,
    None,
}

impl CrossSignal {
    pub fn as_i8(self) -> i8 {
        match self {
            CrossSignal::Golden => 1,
            CrossSignal::Dead => -1,
            CrossSignal::None => 0,
        }
    }
}

/// Local extreme of the EMA spread for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtremeSignal {
    Max,
    Min,
    None,
}

impl ExtremeSignal {
    pub fn as_i8(self) -> i8 {
        match self {
            ExtremeSignal::Max => 1,
            ExtremeSignal::Min => -1,
            ExtremeSignal::None => 0,
        }
    }
}

/// Cross detection between consecutive EMA samples.
///
/// The tie-break is deliberately asymmetric: equality counts as "above"
/// going into a dead cross and as "not yet above" going into a golden
/// cross, so a flat tie cannot fire both directions on adjacent bars.
pub fn detect_cross(ema1_prev: f64, ema1_cur: f64, ema2_prev: f64, ema2_cur: f64) -> CrossSignal {
    if ema1_prev >= ema2_prev && ema1_cur < ema2_cur {
        CrossSignal::Dead
    } else if ema1_prev < ema2_prev && ema1_cur >= ema2_cur {
        CrossSignal::Golden
    } else {
        CrossSignal::None
    }
}

/// Running state for extreme detection over the EMA spread.
///
/// Dormant until a position fill arms it through [`ExtremeDetector::seek_max`]
/// or [`ExtremeDetector::seek_min`]; disarmed again when a position closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeDetector {
    running_max: f64,
    running_min: f64,
    looking_for_max: Option<bool>,
}

impl Default for ExtremeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtremeDetector {
    pub fn new() -> Self {
        ExtremeDetector {
            running_max: f64::NEG_INFINITY,
            running_min: f64::INFINITY,
            looking_for_max: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.looking_for_max.is_some()
    }

    /// Arm after a short fill: the spread is expected to top out.
    pub fn seek_max(&mut self) {
        self.looking_for_max = Some(true);
    }

    /// Arm after a long fill: the spread is expected to bottom out.
    pub fn seek_min(&mut self) {
        self.looking_for_max = Some(false);
    }

    /// Disarm when the position closes to flat.
    pub fn disarm(&mut self) {
        self.looking_for_max = None;
        self.running_max = f64::NEG_INFINITY;
        self.running_min = f64::INFINITY;
    }

    /// Observe one spread sample (`diff = ema1 - ema2`).
    ///
    /// A reversal of more than `delta` away from the running extreme
    /// emits the extreme, flips the search direction, and reseeds the
    /// opposite running value at the current sample.
    pub fn step(&mut self, diff: f64, delta: f64) -> ExtremeSignal {
        self.running_max = self.running_max.max(diff);
        self.running_min = self.running_min.min(diff);

        match self.looking_for_max {
            None => ExtremeSignal::None,
            Some(true) if diff < self.running_max - delta => {
                self.looking_for_max = Some(false);
                self.running_min = diff;
                ExtremeSignal::Max
            }
            Some(false) if diff > self.running_min + delta => {
                self.looking_for_max = Some(true);
                self.running_max = diff;
                ExtremeSignal::Min
            }
            Some(_) => ExtremeSignal::None,
        }
    }
}
