//! Parameter sweep over the (N1, N2) EMA-period grid.
//!
//! Every unordered pair with `n_ema_min <= N1 < N2 <= n_ema_max` gets
//! its own fresh pipeline replayed over the full series; pairs share no
//! mutable state and run in parallel. Cancellation is cooperative and
//! checked between pairs, never mid-pair, so a cancelled sweep still
//! returns every pair that finished plus `complete = false`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::bar::BarSeries;
use super::error::EmasweepError;
use super::pattern::symbol_count;
use super::pipeline::{EngineConfig, Pipeline};
use super::position::PatternGate;
use super::signal::CrossSignal;
use super::stats::{BoxPlot, PatternStat};

/// Shared flag for cancelling a sweep from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Sweep bounds plus the per-pair pipeline parameters. `base.n_ema1`
/// and `base.n_ema2` are overridden by each pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub n_ema_min: usize,
    pub n_ema_max: usize,
    pub base: EngineConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            n_ema_min: 1,
            n_ema_max: 30,
            base: EngineConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> Result<(), EmasweepError> {
        self.base.validate()?;
        if self.n_ema_min == 0 || self.n_ema_min >= self.n_ema_max {
            return Err(EmasweepError::OutOfRange {
                name: "n_ema_min".into(),
                value: self.n_ema_min as i64,
                min: 1,
                max: self.n_ema_max as i64,
            });
        }
        Ok(())
    }

    /// All unordered period pairs in the configured range.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        (self.n_ema_min..=self.n_ema_max)
            .flat_map(|n1| ((n1 + 1)..=self.n_ema_max).map(move |n2| (n1, n2)))
            .collect()
    }
}

/// Per-pattern aggregates for one fast period `n1`, pooled across all
/// of that row's `(n1, n2)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub n1: usize,
    pub stats_golden: Vec<PatternStat>,
    pub stats_dead: Vec<PatternStat>,
    pub box_golden: Vec<BoxPlot>,
    pub box_dead: Vec<BoxPlot>,
}

/// Everything a finished (or cancelled) sweep produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub config: SweepConfig,
    /// False when the sweep was cancelled before every pair ran.
    pub complete: bool,
    /// `benefit_map[n1][n2]` is only written for `n1 < n2` within the
    /// configured range; every other cell stays 0.
    pub benefit_map: Vec<Vec<f64>>,
    /// One row per `n1` in `[n_ema_min, n_ema_max)`.
    pub rows: Vec<SweepRow>,
}

impl SweepOutcome {
    pub fn row(&self, n1: usize) -> Option<&SweepRow> {
        if n1 < self.config.n_ema_min || n1 >= self.config.n_ema_max {
            return None;
        }
        self.rows.get(n1 - self.config.n_ema_min)
    }
}

/// Benefit observations of one pair, bucketed by pattern symbol.
struct PairResult {
    n1: usize,
    n2: usize,
    final_benefit: f64,
    golden: Vec<Vec<f64>>,
    dead: Vec<Vec<f64>>,
}

/// Run the full grid. The live pipeline is never touched: every pair
/// gets an independent replay of `series`.
pub fn run_sweep(
    config: &SweepConfig,
    series: &BarSeries,
    gate: &PatternGate,
    cancel: &CancelToken,
) -> Result<SweepOutcome, EmasweepError> {
    config.validate()?;

    let pairs = config.pairs();
    let results: Vec<PairResult> = pairs
        .par_iter()
        .filter_map(|&(n1, n2)| {
            if cancel.is_cancelled() {
                return None;
            }
            Some(evaluate_pair(config, series, gate, n1, n2))
        })
        .collect();

    let complete = results.len() == pairs.len();
    let symbols = symbol_count(config.base.n_dec);

    let mut benefit_map = vec![vec![0.0; config.n_ema_max + 1]; config.n_ema_max + 1];
    let mut pooled_golden =
        vec![vec![Vec::<f64>::new(); symbols]; config.n_ema_max - config.n_ema_min];
    let mut pooled_dead =
        vec![vec![Vec::<f64>::new(); symbols]; config.n_ema_max - config.n_ema_min];

    for result in results {
        benefit_map[result.n1][result.n2] = result.final_benefit;
        let row = result.n1 - config.n_ema_min;
        for (symbol, obs) in result.golden.into_iter().enumerate() {
            pooled_golden[row][symbol].extend(obs);
        }
        for (symbol, obs) in result.dead.into_iter().enumerate() {
            pooled_dead[row][symbol].extend(obs);
        }
    }

    let rows = pooled_golden
        .into_iter()
        .zip(pooled_dead)
        .enumerate()
        .map(|(i, (golden, dead))| SweepRow {
            n1: config.n_ema_min + i,
            stats_golden: golden.iter().map(|o| PatternStat::from_observations(o)).collect(),
            stats_dead: dead.iter().map(|o| PatternStat::from_observations(o)).collect(),
            box_golden: golden
                .iter()
                .enumerate()
                .map(|(s, o)| BoxPlot::from_observations(s as u32, o))
                .collect(),
            box_dead: dead
                .iter()
                .enumerate()
                .map(|(s, o)| BoxPlot::from_observations(s as u32, o))
                .collect(),
        })
        .collect();

    Ok(SweepOutcome {
        config: *config,
        complete,
        benefit_map,
        rows,
    })
}

fn evaluate_pair(
    config: &SweepConfig,
    series: &BarSeries,
    gate: &PatternGate,
    n1: usize,
    n2: usize,
) -> PairResult {
    let engine = EngineConfig {
        n_ema1: n1,
        n_ema2: n2,
        ..config.base
    };
    let pipeline = Pipeline::run(engine, gate.clone(), series);

    let symbols = symbol_count(config.base.n_dec);
    let mut golden = vec![Vec::new(); symbols];
    let mut dead = vec![Vec::new(); symbols];

    let per_event = pipeline.per_event_benefit();
    for (j, &cross) in pipeline.cross_signals().iter().enumerate() {
        if cross == CrossSignal::None {
            continue;
        }
        // attribute the next realized exit at or after the firing bar
        let benefit = per_event[j..]
            .iter()
            .copied()
            .find(|&v| v != 0.0)
            .unwrap_or(0.0);
        let symbol = pipeline.patterns()[j] as usize;
        match cross {
            CrossSignal::Golden => golden[symbol].push(benefit),
            CrossSignal::Dead => dead[symbol].push(benefit),
            CrossSignal::None => unreachable!(),
        }
    }

    PairResult {
        n1,
        n2,
        final_benefit: pipeline.final_benefit(),
        golden,
        dead,
    }
}
