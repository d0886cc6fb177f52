//! Exponential moving average, streaming and batch.
//!
//! The recurrence seeds at the first sample:
//!
//! ```text
//! ema[0] = x[0]
//! ema[i] = (1 - alpha) * ema[i-1] + alpha * x[i]
//! ```
//!
//! so every bar has a defined value from the start of the series.

use serde::{Deserialize, Serialize};

use super::alpha;

/// Streaming EMA state: one `f64` per line, advanced bar by bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmaState {
    value: Option<f64>,
    alpha: f64,
}

impl EmaState {
    pub fn new(n: usize) -> Self {
        EmaState {
            value: None,
            alpha: alpha(n),
        }
    }

    pub fn with_alpha(alpha: f64) -> Self {
        EmaState { value: None, alpha }
    }

    /// Current value, `None` before the first sample.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Fold one sample in and return the updated value.
    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            None => sample,
            Some(prev) => (1.0 - self.alpha) * prev + self.alpha * sample,
        };
        self.value = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Batch EMA over an N-period window.
pub fn ema(values: &[f64], n: usize) -> Vec<f64> {
    ema_alpha(values, alpha(n))
}

/// Batch EMA with an explicit smoothing factor.
pub fn ema_alpha(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut state = EmaState::with_alpha(alpha);
    values.iter().map(|&v| state.update(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn seeds_at_first_sample() {
        let out = ema(&[100.0, 100.0, 100.0], 5);
        assert_relative_eq!(out[0], 100.0);
        assert_relative_eq!(out[1], 100.0);
        assert_relative_eq!(out[2], 100.0);
    }

    #[test]
    fn follows_the_recurrence() {
        // alpha(1) = 1: the EMA tracks the input exactly
        let out = ema(&[1.0, 2.0, 3.0], 1);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);

        // alpha(3) = 0.5
        let out = ema(&[10.0, 20.0, 20.0], 3);
        assert_relative_eq!(out[0], 10.0);
        assert_relative_eq!(out[1], 15.0);
        assert_relative_eq!(out[2], 17.5);
    }

    #[test]
    fn streaming_matches_batch() {
        let samples = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let batch = ema(&samples, 4);

        let mut state = EmaState::new(4);
        for (i, &s) in samples.iter().enumerate() {
            assert_relative_eq!(state.update(s), batch[i]);
        }
    }

    #[test]
    fn reset_clears_history() {
        let mut state = EmaState::new(3);
        state.update(100.0);
        state.reset();
        assert_eq!(state.value(), None);
        assert_relative_eq!(state.update(7.0), 7.0);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(ema(&[], 5).is_empty());
    }
}
