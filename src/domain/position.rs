//! Single-position order simulation driven by cross/extreme signals.
//!
//! A golden cross opens a short, a dead cross opens a long. Entries and
//! exits never fill on the bar the signal fired: the order is held as a
//! one-bar placeholder state (`Ask`/`Bid`/`Con`) and priced off the next
//! bar. `Con` either closes the position to `Wait` (extreme exit) or
//! stops-and-reverses into the opposite side on the same fill bar
//! (re-cross exit).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::bar::Bar;
use super::signal::{CrossSignal, ExtremeSignal};

/// Order lifecycle state, evaluated once per bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Wait,
    Ask,
    Bid,
    Sell,
    Buy,
    Con,
}

/// Which bar price a fill uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenefitTiming {
    /// Worse of open/close for the fill side.
    #[default]
    Worst,
    /// Mean of open and close for either side.
    Mean,
    /// The bar's open for either side.
    Open,
}

impl BenefitTiming {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "worst" => Some(BenefitTiming::Worst),
            "mean" => Some(BenefitTiming::Mean),
            "open" => Some(BenefitTiming::Open),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BenefitTiming::Worst => "worst",
            BenefitTiming::Mean => "mean",
            BenefitTiming::Open => "open",
        }
    }
}

/// What pushed an open position into `Con`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConTrigger {
    /// Dead cross re-fired while short: stop-and-reverse into a long.
    DeadCross,
    /// Spread topped out while short: take profit, go flat.
    ExtremeMax,
    /// Golden cross re-fired while long: stop-and-reverse into a short.
    GoldenCross,
    /// Spread bottomed out while long: take profit, go flat.
    ExtremeMin,
}

/// An order recorded on one bar, priced and applied on the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingOrder {
    EnterShort,
    EnterLong,
    Settle(ConTrigger),
}

/// How a fill changed the extreme detector's arming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorCue {
    SeekMax,
    SeekMin,
    Disarm,
}

/// Allow-lists gating which pattern symbols may open a position.
/// An unset list allows every pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternGate {
    golden: Option<HashSet<u32>>,
    dead: Option<HashSet<u32>>,
}

impl PatternGate {
    pub fn install(golden: HashSet<u32>, dead: HashSet<u32>) -> Self {
        PatternGate {
            golden: Some(golden),
            dead: Some(dead),
        }
    }

    pub fn clear(&mut self) {
        self.golden = None;
        self.dead = None;
    }

    pub fn is_installed(&self) -> bool {
        self.golden.is_some() || self.dead.is_some()
    }

    pub fn allows_golden(&self, pattern: u32) -> bool {
        self.golden.as_ref().is_none_or(|set| set.contains(&pattern))
    }

    pub fn allows_dead(&self, pattern: u32) -> bool {
        self.dead.as_ref().is_none_or(|set| set.contains(&pattern))
    }
}

/// Position simulator with the two parallel ledgers.
///
/// `cumulative` copies its last value forward every bar and absorbs
/// realized P&L in place; `per_event` is zero except on the bar whose
/// order an exit was recorded against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSim {
    state: PositionState,
    entry_price: f64,
    stop_by_cross: bool,
    timing: BenefitTiming,
    cumulative: Vec<f64>,
    per_event: Vec<f64>,
}

impl PositionSim {
    pub fn new(timing: BenefitTiming) -> Self {
        PositionSim {
            state: PositionState::Wait,
            entry_price: 0.0,
            stop_by_cross: false,
            timing,
            cumulative: Vec::new(),
            per_event: Vec::new(),
        }
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn stop_by_cross(&self) -> bool {
        self.stop_by_cross
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn per_event(&self) -> &[f64] {
        &self.per_event
    }

    /// Final cumulative benefit, 0 for an empty run.
    pub fn final_benefit(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Append this bar's ledger entries: cumulative copies forward,
    /// per-event starts at zero.
    pub fn append_ledger(&mut self) {
        self.cumulative.push(self.final_benefit());
        self.per_event.push(0.0);
    }

    /// React to this bar's signals. Returns the order to price off the
    /// next bar, if the transition placed one.
    pub fn observe(
        &mut self,
        cross: CrossSignal,
        extreme: ExtremeSignal,
        pattern: u32,
        gate: &PatternGate,
    ) -> Option<PendingOrder> {
        match self.state {
            PositionState::Wait => match cross {
                CrossSignal::Golden if gate.allows_golden(pattern) => {
                    self.state = PositionState::Ask;
                    Some(PendingOrder::EnterShort)
                }
                CrossSignal::Dead if gate.allows_dead(pattern) => {
                    self.state = PositionState::Bid;
                    Some(PendingOrder::EnterLong)
                }
                _ => None,
            },
            PositionState::Sell => {
                // a re-cross outranks an extreme on the same bar
                if cross == CrossSignal::Dead {
                    self.state = PositionState::Con;
                    Some(PendingOrder::Settle(ConTrigger::DeadCross))
                } else if extreme == ExtremeSignal::Max {
                    self.state = PositionState::Con;
                    Some(PendingOrder::Settle(ConTrigger::ExtremeMax))
                } else {
                    None
                }
            }
            PositionState::Buy => {
                if cross == CrossSignal::Golden {
                    self.state = PositionState::Con;
                    Some(PendingOrder::Settle(ConTrigger::GoldenCross))
                } else if extreme == ExtremeSignal::Min {
                    self.state = PositionState::Con;
                    Some(PendingOrder::Settle(ConTrigger::ExtremeMin))
                } else {
                    None
                }
            }
            // placeholder states resolve through `fill` before the next
            // observe call
            PositionState::Ask | PositionState::Bid | PositionState::Con => None,
        }
    }

    /// Price and apply an order recorded on the previous bar. Realized
    /// P&L lands in that previous bar's ledger entries (the current
    /// last entries; this runs before `append_ledger` for `bar`).
    pub fn fill(&mut self, order: PendingOrder, bar: &Bar) -> DetectorCue {
        let (low_side, high_side) = fill_prices(bar, self.timing);

        match order {
            PendingOrder::EnterShort => {
                self.entry_price = low_side;
                self.state = PositionState::Sell;
                self.stop_by_cross = false;
                DetectorCue::SeekMax
            }
            PendingOrder::EnterLong => {
                self.entry_price = high_side;
                self.state = PositionState::Buy;
                self.stop_by_cross = false;
                DetectorCue::SeekMin
            }
            PendingOrder::Settle(ConTrigger::DeadCross) => {
                self.realize(self.entry_price - high_side);
                self.stop_by_cross = true;
                self.entry_price = high_side;
                self.state = PositionState::Buy;
                DetectorCue::SeekMin
            }
            PendingOrder::Settle(ConTrigger::ExtremeMax) => {
                self.realize(self.entry_price - high_side);
                self.close_flat()
            }
            PendingOrder::Settle(ConTrigger::GoldenCross) => {
                self.realize(low_side - self.entry_price);
                self.stop_by_cross = true;
                self.entry_price = low_side;
                self.state = PositionState::Sell;
                DetectorCue::SeekMax
            }
            PendingOrder::Settle(ConTrigger::ExtremeMin) => {
                self.realize(low_side - self.entry_price);
                self.close_flat()
            }
        }
    }

    fn realize(&mut self, profit: f64) {
        if let Some(last) = self.cumulative.last_mut() {
            *last += profit;
        }
        if let Some(last) = self.per_event.last_mut() {
            *last += profit;
        }
    }

    fn close_flat(&mut self) -> DetectorCue {
        self.entry_price = 0.0;
        self.state = PositionState::Wait;
        self.stop_by_cross = false;
        DetectorCue::Disarm
    }
}

/// The two candidate fill prices of a bar under a timing policy.
///
/// `low_side` prices short entries and long exits, `high_side` the
/// opposite; under `Worst` each side gets the worse of open/close.
fn fill_prices(bar: &Bar, timing: BenefitTiming) -> (f64, f64) {
    match timing {
        BenefitTiming::Worst => (bar.open.min(bar.close), bar.open.max(bar.close)),
        BenefitTiming::Mean => {
            let mid = (bar.open + bar.close) / 2.0;
            (mid, mid)
        }
        BenefitTiming::Open => (bar.open, bar.open),
    }
}
