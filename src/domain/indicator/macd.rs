//! MACD line and signal line.
//!
//! MACD line = EMA(fast) − EMA(slow), elementwise over the two EMA
//! series; the signal line is an EMA of the MACD line.

use super::ema;

/// Elementwise difference of two EMA series of equal length.
pub fn macd_line(ema_fast: &[f64], ema_slow: &[f64]) -> Vec<f64> {
    ema_fast
        .iter()
        .zip(ema_slow)
        .map(|(f, s)| f - s)
        .collect()
}

/// N-period EMA of the MACD line.
pub fn macd_signal(macd: &[f64], n: usize) -> Vec<f64> {
    ema(macd, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_is_elementwise_difference() {
        let line = macd_line(&[3.0, 5.0, 7.0], &[1.0, 2.0, 3.0]);
        assert_eq!(line, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn signal_smooths_the_line() {
        // alpha(3) = 0.5
        let signal = macd_signal(&[2.0, 4.0, 4.0], 3);
        assert_relative_eq!(signal[0], 2.0);
        assert_relative_eq!(signal[1], 3.0);
        assert_relative_eq!(signal[2], 3.5);
    }

    #[test]
    fn identical_emas_give_zero_line() {
        let e = [10.0, 11.0, 12.0];
        let line = macd_line(&e, &e);
        assert!(line.iter().all(|&v| v == 0.0));
    }
}
