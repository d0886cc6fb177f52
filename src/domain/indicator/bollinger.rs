//! Bands from the RMS error between close and a smoothed base line.
//!
//! Sigma per bar is the population standard deviation of
//! `close - base` over the trailing `n` bars (fewer while the series is
//! shorter than `n`); the bands sit at close ± 1, 2, 3 sigma.

use crate::domain::bar::Bar;

/// Per-bar sigma and the six bands around the close.
#[derive(Debug, Clone, Default)]
pub struct BollingerBands {
    pub std: Vec<f64>,
    pub upper1: Vec<f64>,
    pub upper2: Vec<f64>,
    pub upper3: Vec<f64>,
    pub lower1: Vec<f64>,
    pub lower2: Vec<f64>,
    pub lower3: Vec<f64>,
}

/// Trailing population standard deviation of `close - base`.
pub fn rms_error(closes: &[f64], base: &[f64], n: usize) -> Vec<f64> {
    (0..base.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(n.max(1));
            let diffs: Vec<f64> = closes[start..=i]
                .iter()
                .zip(&base[start..=i])
                .map(|(c, b)| c - b)
                .collect();
            population_std(&diffs)
        })
        .collect()
}

/// Bands at close ± 1, 2, 3 sigma of the trailing close-vs-base error.
pub fn bollinger_bands(bars: &[Bar], base: &[f64], n: usize) -> BollingerBands {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let sigma = rms_error(&closes, base, n);

    let mut bands = BollingerBands::default();
    for (c, s) in closes.iter().zip(&sigma) {
        bands.upper1.push(c + s);
        bands.upper2.push(c + 2.0 * s);
        bands.upper3.push(c + 3.0 * s);
        bands.lower1.push(c - s);
        bands.lower2.push(c - 2.0 * s);
        bands.lower3.push(c - 3.0 * s);
    }
    bands.std = sigma;
    bands
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .map(|&c| Bar {
                index: 0,
                timestamp: 0,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn single_sample_window_has_zero_sigma() {
        let sigma = rms_error(&[100.0, 101.0], &[99.0, 100.0], 1);
        assert_eq!(sigma, vec![0.0, 0.0]);
    }

    #[test]
    fn sigma_is_population_std_of_errors() {
        // errors are [1, 3]: mean 2, population std 1
        let sigma = rms_error(&[101.0, 103.0], &[100.0, 100.0], 2);
        assert_relative_eq!(sigma[1], 1.0);
    }

    #[test]
    fn short_history_uses_what_exists() {
        // at i = 1 only two errors exist even though n = 5
        let sigma = rms_error(&[101.0, 103.0], &[100.0, 100.0], 5);
        assert_relative_eq!(sigma[1], 1.0);
    }

    #[test]
    fn bands_are_centered_on_close() {
        let b = bars(&[101.0, 103.0]);
        let base = [100.0, 100.0];
        let bands = bollinger_bands(&b, &base, 2);

        assert_relative_eq!(bands.upper1[1], 104.0);
        assert_relative_eq!(bands.upper2[1], 105.0);
        assert_relative_eq!(bands.upper3[1], 106.0);
        assert_relative_eq!(bands.lower1[1], 102.0);
        assert_relative_eq!(bands.lower3[1], 100.0);
    }
}
