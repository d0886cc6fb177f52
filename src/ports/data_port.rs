//! Market-data access port trait.

use crate::domain::bar::{BarSeries, Tick};
use crate::domain::error::EmasweepError;

pub trait DataPort {
    /// Load a series of committed bars from a named dataset.
    fn load_bars(&self, name: &str) -> Result<BarSeries, EmasweepError>;

    /// Load raw trade ticks from a named dataset, in feed order.
    fn load_ticks(&self, name: &str) -> Result<Vec<Tick>, EmasweepError>;
}
