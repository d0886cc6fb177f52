//! Up/down-close outcomes and the pattern symbol encoding.
//!
//! A pattern symbol compresses the most recent `n_dec` up(1)/down(0)
//! close-vs-open outcomes into one integer, read oldest to newest with
//! the oldest outcome as the most significant bit.

/// 1 if the bar closed above its open, else 0.
pub fn oc_up_down(open: f64, close: f64) -> u8 {
    u8::from(close > open)
}

/// Encode the last `n_dec` outcomes as a decimal symbol.
///
/// Returns 0 while fewer than `n_dec` outcomes exist; symbols are only
/// meaningful once a full window of history has accumulated.
pub fn classify(outcomes: &[u8], n_dec: usize) -> u32 {
    if n_dec == 0 || outcomes.len() < n_dec {
        return 0;
    }
    outcomes[outcomes.len() - n_dec..]
        .iter()
        .fold(0u32, |acc, &bit| (acc << 1) | u32::from(bit))
}

/// Number of distinct symbols for a window of `n_dec` outcomes.
pub fn symbol_count(n_dec: usize) -> usize {
    1usize << n_dec
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn up_down_outcome() {
        assert_eq!(oc_up_down(100.0, 101.0), 1);
        assert_eq!(oc_up_down(100.0, 99.0), 0);
        // flat close counts as down
        assert_eq!(oc_up_down(100.0, 100.0), 0);
    }

    #[test]
    fn classify_needs_full_window() {
        assert_eq!(classify(&[], 3), 0);
        assert_eq!(classify(&[1], 3), 0);
        assert_eq!(classify(&[1, 0], 3), 0);
    }

    #[test]
    fn classify_msb_is_oldest() {
        // oldest → newest [1, 0, 1] reads as 0b101
        assert_eq!(classify(&[1, 0, 1], 3), 5);
        assert_eq!(classify(&[0, 1, 1], 3), 3);
        assert_eq!(classify(&[1, 1, 0], 3), 6);
    }

    #[test]
    fn classify_uses_most_recent_window() {
        // only the trailing n_dec outcomes matter
        assert_eq!(classify(&[0, 0, 0, 1, 0, 1], 3), 5);
    }

    #[test]
    fn symbol_counts() {
        assert_eq!(symbol_count(3), 8);
        assert_eq!(symbol_count(5), 32);
    }

    proptest! {
        #[test]
        fn classify_is_bounded(outcomes in prop::collection::vec(0u8..=1, 0..32), n_dec in 1usize..8) {
            let symbol = classify(&outcomes, n_dec);
            prop_assert!((symbol as usize) < symbol_count(n_dec));
        }
    }
}
