//! Analysis session facade: configuration, the live pipeline, cached
//! sweep results, and the two dataset views.
//!
//! Configuration setters only mark the live pipeline dirty; the replay
//! happens lazily on the next read so a burst of setter calls costs one
//! recompute. The sweep never touches the live pipeline — it builds its
//! own per-pair instances from the same bars.

use serde::{Deserialize, Serialize};

use super::bar::{Bar, BarSeries, Tick};
use super::error::EmasweepError;
use super::pattern::symbol_count;
use super::pipeline::{EngineConfig, Pipeline};
use super::position::{BenefitTiming, PatternGate, PositionState};
use super::stats::{BoxPlot, PatternStat};
use super::sweep::{run_sweep, CancelToken, SweepConfig, SweepOutcome};

/// Chart view: parallel arrays over one bar range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartDataset {
    pub timestamp: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub ema1: Vec<f64>,
    pub ema2: Vec<f64>,
    pub cross_signal: Vec<i8>,
    pub extreme_signal: Vec<i8>,
    pub cumulative_benefit: Vec<f64>,
}

/// Pattern view: the benefit map plus one sweep row's aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDataset {
    pub n_dec: usize,
    pub benefit_map: Vec<Vec<f64>>,
    pub patterns_dead: Vec<BoxPlot>,
    pub patterns_golden: Vec<BoxPlot>,
    pub stats_dead: Vec<PatternStat>,
    pub stats_golden: Vec<PatternStat>,
}

/// Persistable facade state: configuration and cached sweep results.
/// Bars are reloaded from their source, not embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub config: SweepConfig,
    pub th_dec: f64,
    pub gate: PatternGate,
    pub sweep: Option<SweepOutcome>,
}

/// Owner of the canonical bar series and the live pipeline.
#[derive(Debug)]
pub struct AnalysisSession {
    config: SweepConfig,
    th_dec: f64,
    gate: PatternGate,
    bars: BarSeries,
    live: Pipeline,
    dirty: bool,
    sweep: Option<SweepOutcome>,
}

impl AnalysisSession {
    pub fn new(config: SweepConfig) -> Result<Self, EmasweepError> {
        config.validate()?;
        Ok(AnalysisSession {
            live: Pipeline::new(config.base, PatternGate::default()),
            config,
            th_dec: 0.0,
            gate: PatternGate::default(),
            bars: BarSeries::new(),
            dirty: true,
            sweep: None,
        })
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn bars(&self) -> &BarSeries {
        &self.bars
    }

    pub fn sweep_results(&self) -> Option<&SweepOutcome> {
        self.sweep.as_ref()
    }

    pub fn gate(&self) -> &PatternGate {
        &self.gate
    }

    /// Replace the bar series wholesale.
    pub fn set_bars(&mut self, bars: BarSeries) {
        self.bars = bars;
        self.dirty = true;
    }

    /// Change the live EMA pair. Rejected before anything mutates if a
    /// period is invalid.
    pub fn set_ema_periods(&mut self, n_ema1: usize, n_ema2: usize) -> Result<(), EmasweepError> {
        let candidate = EngineConfig {
            n_ema1,
            n_ema2,
            ..self.config.base
        };
        candidate.validate()?;
        self.config.base = candidate;
        self.dirty = true;
        Ok(())
    }

    pub fn set_delta(&mut self, delta: f64) {
        self.config.base.delta = delta;
        self.dirty = true;
    }

    pub fn set_timing(&mut self, timing: BenefitTiming) {
        self.config.base.timing = timing;
        self.dirty = true;
    }

    /// Fold one tick into the series. A committed bar advances the live
    /// pipeline by exactly one step (when it is current); the tentative
    /// bar is never visible to derived series.
    pub fn apply_tick(&mut self, tick: &Tick) -> Option<Bar> {
        let committed = self.bars.apply_tick(tick)?;
        if !self.dirty {
            self.live.step(&committed);
        }
        Some(committed)
    }

    /// Current position state of the live pipeline.
    pub fn position_state(&mut self) -> PositionState {
        self.refresh_live();
        self.live.position_state()
    }

    /// Run the parameter sweep and cache its outcome. The live pipeline
    /// is left untouched.
    pub fn run_sweep(&mut self, cancel: &CancelToken) -> Result<&SweepOutcome, EmasweepError> {
        let outcome = run_sweep(&self.config, &self.bars, &self.gate, cancel)?;
        Ok(self.sweep.insert(outcome))
    }

    /// Chart view over `[start, end)`. `start` must address a committed
    /// bar; `end` is clamped to the series length.
    pub fn chart_dataset(
        &mut self,
        start: usize,
        end: Option<usize>,
    ) -> Result<ChartDataset, EmasweepError> {
        let len = self.bars.len();
        if start >= len {
            return Err(EmasweepError::OutOfRange {
                name: "start".into(),
                value: start as i64,
                min: 0,
                max: len as i64,
            });
        }
        let end = end.unwrap_or(len).min(len);
        self.refresh_live();
        let live = &self.live;
        let bars = &self.bars.bars()[start..end];

        Ok(ChartDataset {
            timestamp: bars.iter().map(|b| b.timestamp).collect(),
            open: bars.iter().map(|b| b.open).collect(),
            high: bars.iter().map(|b| b.high).collect(),
            low: bars.iter().map(|b| b.low).collect(),
            close: bars.iter().map(|b| b.close).collect(),
            volume: bars.iter().map(|b| b.volume).collect(),
            ema1: live.ema1()[start..end].to_vec(),
            ema2: live.ema2()[start..end].to_vec(),
            cross_signal: live.cross_signals()[start..end]
                .iter()
                .map(|c| c.as_i8())
                .collect(),
            extreme_signal: live.extreme_signals()[start..end]
                .iter()
                .map(|e| e.as_i8())
                .collect(),
            cumulative_benefit: live.cumulative_benefit()[start..end].to_vec(),
        })
    }

    /// Pattern view for the sweep row of fast period `n1`.
    pub fn pattern_dataset(&self, n1: usize) -> Result<PatternDataset, EmasweepError> {
        let sweep = self.sweep.as_ref().ok_or(EmasweepError::SweepMissing)?;
        let row = sweep.row(n1).ok_or_else(|| EmasweepError::OutOfRange {
            name: "n_ema1".into(),
            value: n1 as i64,
            min: self.config.n_ema_min as i64,
            max: self.config.n_ema_max as i64,
        })?;

        Ok(PatternDataset {
            n_dec: self.config.base.n_dec,
            benefit_map: sweep.benefit_map.clone(),
            patterns_dead: row.box_dead.clone(),
            patterns_golden: row.box_golden.clone(),
            stats_dead: row.stats_dead.clone(),
            stats_golden: row.stats_golden.clone(),
        })
    }

    /// Install pattern allow-lists from the cached sweep row of the
    /// current fast period: a pattern qualifies when its mean benefit
    /// exceeds `threshold`.
    pub fn register_patterns(&mut self, threshold: f64) -> Result<(), EmasweepError> {
        let sweep = self.sweep.as_ref().ok_or(EmasweepError::SweepMissing)?;
        let n1 = self.config.base.n_ema1;
        let row = sweep.row(n1).ok_or_else(|| EmasweepError::OutOfRange {
            name: "n_ema1".into(),
            value: n1 as i64,
            min: self.config.n_ema_min as i64,
            max: self.config.n_ema_max as i64,
        })?;

        let qualify = |stats: &[PatternStat]| {
            stats
                .iter()
                .enumerate()
                .filter(|(_, s)| s.mean > threshold)
                .map(|(i, _)| i as u32)
                .collect()
        };
        self.gate = PatternGate::install(qualify(&row.stats_golden), qualify(&row.stats_dead));
        self.th_dec = threshold;
        self.dirty = true;
        Ok(())
    }

    /// Clear the allow-lists; every pattern may open a position again.
    pub fn unregister_patterns(&mut self) {
        self.gate.clear();
        self.dirty = true;
    }

    /// Number of distinct pattern symbols under the current window.
    pub fn pattern_count(&self) -> usize {
        symbol_count(self.config.base.n_dec)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            config: self.config,
            th_dec: self.th_dec,
            gate: self.gate.clone(),
            sweep: self.sweep.clone(),
        }
    }

    /// Rebuild a session from a snapshot. Bars are not part of the
    /// snapshot; load them separately with [`AnalysisSession::set_bars`].
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, EmasweepError> {
        snapshot.config.validate()?;
        Ok(AnalysisSession {
            live: Pipeline::new(snapshot.config.base, snapshot.gate.clone()),
            config: snapshot.config,
            th_dec: snapshot.th_dec,
            gate: snapshot.gate,
            bars: BarSeries::new(),
            dirty: true,
            sweep: snapshot.sweep,
        })
    }

    /// Replay the live pipeline if any setter dirtied it.
    fn refresh_live(&mut self) {
        if self.dirty {
            self.live = Pipeline::run(self.config.base, self.gate.clone(), &self.bars);
            self.dirty = false;
        }
    }
}
