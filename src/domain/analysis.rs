//! Batch indicator table over a whole bar series.
//!
//! One row per bar, one column per indicator, suitable for CSV export.
//! Smoothed lines (ATR, DM EMAs, ADX, the RSI magnitude EMAs) share the
//! fast EMA period; momentum/ROC lookback and the band window use it
//! too, so one `n_ema1` change re-parameterizes the whole table.

use super::bar::BarSeries;
use super::indicator::{
    adx, alpha, atr, bollinger_bands, di, dm_minus, dm_plus, dx, ema, macd_line, macd_signal,
    momentum, oc_down_ema, oc_up_ema, roc1, roc2, rsi, true_range,
};
use super::pattern::{classify, oc_up_down};
use super::pipeline::EngineConfig;

/// Column names in row order, the header of the exported table.
pub const COLUMNS: &[&str] = &[
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume",
    "oc_up_down",
    "dec",
    "ema1",
    "ema2",
    "macd",
    "macd_signal",
    "true_range",
    "atr",
    "dm_plus",
    "dm_minus",
    "dm_plus_ema",
    "dm_minus_ema",
    "di_plus",
    "di_minus",
    "dx",
    "adx",
    "std",
    "upper_band1",
    "upper_band2",
    "upper_band3",
    "lower_band1",
    "lower_band2",
    "lower_band3",
    "momentum",
    "roc1",
    "roc2",
    "ema_oc_up",
    "ema_oc_down",
    "rsi",
];

/// Parallel indicator columns, all the same length as the bar count.
#[derive(Debug, Clone, Default)]
pub struct IndicatorTable {
    pub timestamp: Vec<i64>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
    pub oc_up_down: Vec<u8>,
    pub dec: Vec<u32>,
    pub ema1: Vec<f64>,
    pub ema2: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub true_range: Vec<f64>,
    pub atr: Vec<f64>,
    pub dm_plus: Vec<f64>,
    pub dm_minus: Vec<f64>,
    pub dm_plus_ema: Vec<f64>,
    pub dm_minus_ema: Vec<f64>,
    pub di_plus: Vec<f64>,
    pub di_minus: Vec<f64>,
    pub dx: Vec<f64>,
    pub adx: Vec<f64>,
    pub std: Vec<f64>,
    pub upper_band1: Vec<f64>,
    pub upper_band2: Vec<f64>,
    pub upper_band3: Vec<f64>,
    pub lower_band1: Vec<f64>,
    pub lower_band2: Vec<f64>,
    pub lower_band3: Vec<f64>,
    pub momentum: Vec<f64>,
    pub roc1: Vec<f64>,
    pub roc2: Vec<f64>,
    pub ema_oc_up: Vec<f64>,
    pub ema_oc_down: Vec<f64>,
    pub rsi: Vec<f64>,
}

impl IndicatorTable {
    pub fn compute(series: &BarSeries, config: &EngineConfig) -> Self {
        let bars = series.bars();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let a_fast = alpha(config.n_ema1);

        let ema1 = ema(&closes, config.n_ema1);
        let ema2 = ema(&closes, config.n_ema2);
        let macd = macd_line(&ema1, &ema2);
        let macd_sig = macd_signal(&macd, config.n_macd);

        let tr = true_range(bars);
        let atr_line = atr(&tr, a_fast);
        let dmp = dm_plus(bars);
        let dmm = dm_minus(bars);
        let dmp_ema = ema(&dmp, config.n_ema1);
        let dmm_ema = ema(&dmm, config.n_ema1);
        let di_plus = di(&dmp_ema, &atr_line);
        let di_minus = di(&dmm_ema, &atr_line);
        let dx_line = dx(&di_plus, &di_minus);
        let adx_line = adx(&dx_line, a_fast);

        let bands = bollinger_bands(bars, &ema1, config.n_ema1);

        let up_ema = oc_up_ema(bars, a_fast);
        let down_ema = oc_down_ema(bars, a_fast);
        let rsi_line = rsi(&up_ema, &down_ema);

        let mut outcomes = Vec::with_capacity(bars.len());
        let mut dec = Vec::with_capacity(bars.len());
        for bar in bars {
            outcomes.push(oc_up_down(bar.open, bar.close));
            // the window includes this bar, but the symbol stays 0
            // until a full window of prior bars exists
            dec.push(if outcomes.len() > config.n_dec {
                classify(&outcomes, config.n_dec)
            } else {
                0
            });
        }

        IndicatorTable {
            timestamp: bars.iter().map(|b| b.timestamp).collect(),
            open: bars.iter().map(|b| b.open).collect(),
            high: bars.iter().map(|b| b.high).collect(),
            low: bars.iter().map(|b| b.low).collect(),
            close: closes,
            volume: bars.iter().map(|b| b.volume).collect(),
            oc_up_down: outcomes,
            dec,
            ema1,
            ema2,
            macd,
            macd_signal: macd_sig,
            true_range: tr,
            atr: atr_line,
            dm_plus: dmp,
            dm_minus: dmm,
            dm_plus_ema: dmp_ema,
            dm_minus_ema: dmm_ema,
            di_plus,
            di_minus,
            dx: dx_line,
            adx: adx_line,
            std: bands.std,
            upper_band1: bands.upper1,
            upper_band2: bands.upper2,
            upper_band3: bands.upper3,
            lower_band1: bands.lower1,
            lower_band2: bands.lower2,
            lower_band3: bands.lower3,
            momentum: momentum(bars, config.n_ema1),
            roc1: roc1(bars, config.n_ema1),
            roc2: roc2(bars, config.n_ema1),
            ema_oc_up: up_ema,
            ema_oc_down: down_ema,
            rsi: rsi_line,
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// One row in [`COLUMNS`] order, rendered as strings for export.
    pub fn row(&self, i: usize) -> Vec<String> {
        vec![
            self.timestamp[i].to_string(),
            self.open[i].to_string(),
            self.high[i].to_string(),
            self.low[i].to_string(),
            self.close[i].to_string(),
            self.volume[i].to_string(),
            self.oc_up_down[i].to_string(),
            self.dec[i].to_string(),
            self.ema1[i].to_string(),
            self.ema2[i].to_string(),
            self.macd[i].to_string(),
            self.macd_signal[i].to_string(),
            self.true_range[i].to_string(),
            self.atr[i].to_string(),
            self.dm_plus[i].to_string(),
            self.dm_minus[i].to_string(),
            self.dm_plus_ema[i].to_string(),
            self.dm_minus_ema[i].to_string(),
            self.di_plus[i].to_string(),
            self.di_minus[i].to_string(),
            self.dx[i].to_string(),
            self.adx[i].to_string(),
            self.std[i].to_string(),
            self.upper_band1[i].to_string(),
            self.upper_band2[i].to_string(),
            self.upper_band3[i].to_string(),
            self.lower_band1[i].to_string(),
            self.lower_band2[i].to_string(),
            self.lower_band3[i].to_string(),
            self.momentum[i].to_string(),
            self.roc1[i].to_string(),
            self.roc2[i].to_string(),
            self.ema_oc_up[i].to_string(),
            self.ema_oc_down[i].to_string(),
            self.rsi[i].to_string(),
        ]
    }
}
