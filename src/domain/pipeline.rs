//! The live signal pipeline: streaming EMAs, cross/extreme detection,
//! pattern classification, and the position simulator, advanced one
//! committed bar at a time.
//!
//! Per-bar step order matters and is fixed:
//!
//! 1. price and apply the order recorded on the previous bar
//! 2. advance the EMA, MACD and pattern series
//! 3. judge cross and extreme signals
//! 4. append this bar's ledger entries
//! 5. let the position react to the signals and record a new order
//!
//! An order recorded on the final bar of a series is never priced; its
//! fill would need a bar that does not exist yet.

use serde::{Deserialize, Serialize};

use super::bar::{Bar, BarSeries};
use super::error::EmasweepError;
use super::indicator::EmaState;
use super::pattern::{classify, oc_up_down};
use super::position::{BenefitTiming, DetectorCue, PatternGate, PendingOrder, PositionSim, PositionState};
use super::signal::{detect_cross, CrossSignal, ExtremeDetector, ExtremeSignal};

/// Tunable parameters of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fast EMA period.
    pub n_ema1: usize,
    /// Slow EMA period.
    pub n_ema2: usize,
    /// MACD signal-line EMA period.
    pub n_macd: usize,
    /// Extreme-detection noise threshold on the EMA spread.
    pub delta: f64,
    /// Pattern window length in bars.
    pub n_dec: usize,
    /// Fill-price policy.
    pub timing: BenefitTiming,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            n_ema1: 20,
            n_ema2: 21,
            n_macd: 14,
            delta: 10.0,
            n_dec: 5,
            timing: BenefitTiming::Worst,
        }
    }
}

impl EngineConfig {
    /// Reject zero periods and window lengths the rest of the domain
    /// cannot work with.
    pub fn validate(&self) -> Result<(), EmasweepError> {
        for (name, value) in [
            ("n_ema1", self.n_ema1),
            ("n_ema2", self.n_ema2),
            ("n_macd", self.n_macd),
        ] {
            if value == 0 {
                return Err(EmasweepError::OutOfRange {
                    name: name.into(),
                    value: 0,
                    min: 1,
                    max: i64::MAX,
                });
            }
        }
        if self.n_dec == 0 || self.n_dec > 16 {
            return Err(EmasweepError::OutOfRange {
                name: "n_dec".into(),
                value: self.n_dec as i64,
                min: 1,
                max: 17,
            });
        }
        Ok(())
    }
}

/// One live run of the signal chain over a bar sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    config: EngineConfig,
    ema1_state: EmaState,
    ema2_state: EmaState,
    macd_signal_state: EmaState,
    detector: ExtremeDetector,
    position: PositionSim,
    gate: PatternGate,
    pending: Option<PendingOrder>,

    ema1: Vec<f64>,
    ema2: Vec<f64>,
    macd: Vec<f64>,
    macd_signal: Vec<f64>,
    outcomes: Vec<u8>,
    patterns: Vec<u32>,
    cross: Vec<CrossSignal>,
    extreme: Vec<ExtremeSignal>,
}

impl Pipeline {
    pub fn new(config: EngineConfig, gate: PatternGate) -> Self {
        Pipeline {
            ema1_state: EmaState::new(config.n_ema1),
            ema2_state: EmaState::new(config.n_ema2),
            macd_signal_state: EmaState::new(config.n_macd),
            detector: ExtremeDetector::new(),
            position: PositionSim::new(config.timing),
            gate,
            pending: None,
            config,
            ema1: Vec::new(),
            ema2: Vec::new(),
            macd: Vec::new(),
            macd_signal: Vec::new(),
            outcomes: Vec::new(),
            patterns: Vec::new(),
            cross: Vec::new(),
            extreme: Vec::new(),
        }
    }

    /// Build a pipeline and replay a whole series through it.
    pub fn run(config: EngineConfig, gate: PatternGate, series: &BarSeries) -> Self {
        let mut pipeline = Pipeline::new(config, gate);
        for bar in series.bars() {
            pipeline.step(bar);
        }
        pipeline
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.ema1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema1.is_empty()
    }

    pub fn ema1(&self) -> &[f64] {
        &self.ema1
    }

    pub fn ema2(&self) -> &[f64] {
        &self.ema2
    }

    pub fn macd(&self) -> &[f64] {
        &self.macd
    }

    pub fn macd_signal(&self) -> &[f64] {
        &self.macd_signal
    }

    pub fn patterns(&self) -> &[u32] {
        &self.patterns
    }

    pub fn cross_signals(&self) -> &[CrossSignal] {
        &self.cross
    }

    pub fn extreme_signals(&self) -> &[ExtremeSignal] {
        &self.extreme
    }

    pub fn position_state(&self) -> PositionState {
        self.position.state()
    }

    pub fn cumulative_benefit(&self) -> &[f64] {
        self.position.cumulative()
    }

    pub fn per_event_benefit(&self) -> &[f64] {
        self.position.per_event()
    }

    pub fn final_benefit(&self) -> f64 {
        self.position.final_benefit()
    }

    /// Advance every derived series by one committed bar.
    pub fn step(&mut self, bar: &Bar) {
        if let Some(order) = self.pending.take() {
            match self.position.fill(order, bar) {
                DetectorCue::SeekMax => self.detector.seek_max(),
                DetectorCue::SeekMin => self.detector.seek_min(),
                DetectorCue::Disarm => self.detector.disarm(),
            }
        }

        let e1 = self.ema1_state.update(bar.close);
        let e2 = self.ema2_state.update(bar.close);
        self.ema1.push(e1);
        self.ema2.push(e2);
        let macd = e1 - e2;
        self.macd.push(macd);
        self.macd_signal.push(self.macd_signal_state.update(macd));

        self.outcomes.push(oc_up_down(bar.open, bar.close));
        // the window includes this bar, but the symbol stays 0 until a
        // full window of prior bars exists
        let pattern = if self.outcomes.len() > self.config.n_dec {
            classify(&self.outcomes, self.config.n_dec)
        } else {
            0
        };
        self.patterns.push(pattern);

        let n = self.ema1.len();
        let cross = if n < 2 {
            CrossSignal::None
        } else {
            detect_cross(self.ema1[n - 2], e1, self.ema2[n - 2], e2)
        };
        self.cross.push(cross);

        // the detector tracks the spread on every bar, but an extreme is
        // only reportable while a position is conceptually open
        let raw = self.detector.step(macd, self.config.delta);
        let extreme = if self.position.state() == PositionState::Wait {
            ExtremeSignal::None
        } else {
            raw
        };
        self.extreme.push(extreme);

        self.position.append_ledger();
        self.pending = self.position.observe(cross, extreme, pattern, &self.gate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn bar(open: f64, close: f64) -> Bar {
        Bar {
            index: 0,
            timestamp: 0,
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume: 1.0,
        }
    }

    fn series(closes: &[f64]) -> BarSeries {
        BarSeries::from_bars(closes.iter().map(|&c| bar(c, c)).collect())
    }

    /// Gate that admits every golden pattern and no dead pattern, so a
    /// leading dead cross cannot open a long.
    fn golden_only() -> PatternGate {
        PatternGate::install((0..32).collect(), HashSet::new())
    }

    fn config(n1: usize, n2: usize, delta: f64) -> EngineConfig {
        EngineConfig {
            n_ema1: n1,
            n_ema2: n2,
            delta,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn series_lengths_track_bar_count() {
        let s = series(&[10.0, 11.0, 12.0, 11.0]);
        let p = Pipeline::run(config(2, 3, 1.0), PatternGate::default(), &s);

        assert_eq!(p.len(), 4);
        assert_eq!(p.ema1().len(), 4);
        assert_eq!(p.macd_signal().len(), 4);
        assert_eq!(p.cross_signals().len(), 4);
        assert_eq!(p.extreme_signals().len(), 4);
        assert_eq!(p.cumulative_benefit().len(), 4);
        assert_eq!(p.per_event_benefit().len(), 4);
    }

    #[test]
    fn flat_series_stays_silent() {
        let s = series(&[10.0; 5]);
        let p = Pipeline::run(config(2, 3, 1.0), PatternGate::default(), &s);

        assert!(p.cross_signals().iter().all(|&c| c == CrossSignal::None));
        assert!(p.extreme_signals().iter().all(|&e| e == ExtremeSignal::None));
        assert!(p.cumulative_benefit().iter().all(|&b| b == 0.0));
        assert_eq!(p.position_state(), PositionState::Wait);
    }

    #[test]
    fn rising_series_never_dead_crosses_after_golden() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let p = Pipeline::run(config(2, 3, 1.0), PatternGate::default(), &series(&closes));

        let first_golden = p
            .cross_signals()
            .iter()
            .position(|&c| c == CrossSignal::Golden);
        if let Some(at) = first_golden {
            assert!(p.cross_signals()[at..]
                .iter()
                .all(|&c| c != CrossSignal::Dead));
        }
        assert!(!p.cross_signals().contains(&CrossSignal::Dead));
    }

    #[test]
    fn pattern_stays_zero_until_prior_bars_fill_the_window() {
        // every bar closes up, so a full window reads 0b111
        let s = BarSeries::from_bars((0..6).map(|_| bar(10.0, 11.0)).collect());
        let cfg = EngineConfig {
            n_dec: 3,
            ..config(2, 3, 1.0)
        };
        let p = Pipeline::run(cfg, PatternGate::default(), &s);

        assert_eq!(&p.patterns()[..3], &[0, 0, 0]);
        assert_eq!(&p.patterns()[3..], &[7, 7, 7]);
    }

    #[test]
    fn replay_is_idempotent() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 20.0 * ((i as f64) * 0.4).sin())
            .collect();
        let s = series(&closes);
        let cfg = config(3, 7, 0.5);

        let a = Pipeline::run(cfg, PatternGate::default(), &s);
        let b = Pipeline::run(cfg, PatternGate::default(), &s);
        assert_eq!(a, b);
    }

    #[test]
    fn fill_lags_the_signal_by_one_bar() {
        // force a golden cross, then watch the state: Ask on the cross
        // bar, Sell only after the next bar prices the order
        let closes = [100.0, 90.0, 80.0, 120.0, 121.0, 122.0];
        let s = series(&closes);
        let mut p = Pipeline::new(config(2, 5, 1000.0), golden_only());

        let mut saw_ask = false;
        for (i, bar) in s.bars().iter().enumerate() {
            p.step(bar);
            if p.cross_signals()[i] == CrossSignal::Golden {
                assert_eq!(p.position_state(), PositionState::Ask);
                saw_ask = true;
            } else if saw_ask {
                assert_eq!(p.position_state(), PositionState::Sell);
                break;
            }
        }
        assert!(saw_ask);
    }

    #[test]
    fn order_on_the_last_bar_is_never_priced() {
        // engineer a cross on the final bar: ledgers stay at zero
        let closes = [100.0, 90.0, 80.0, 120.0];
        let p = Pipeline::run(config(2, 5, 1000.0), golden_only(), &series(&closes));

        assert_eq!(*p.cross_signals().last().unwrap(), CrossSignal::Golden);
        assert_eq!(p.position_state(), PositionState::Ask);
        assert!(p.cumulative_benefit().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn empty_series_yields_empty_pipeline() {
        let p = Pipeline::run(EngineConfig::default(), PatternGate::default(), &BarSeries::new());
        assert!(p.is_empty());
        assert_eq!(p.final_benefit(), 0.0);
    }

    #[test]
    fn config_validation_rejects_zero_periods() {
        let cfg = EngineConfig {
            n_ema1: 0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(EngineConfig::default().validate().is_ok());
    }
}
