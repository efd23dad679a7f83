// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Trailing arithmetic mean over the last `window` prices:
//   SMA_i = (p_{i-w+1} + ... + p_i) / w
//
// The output is aligned index-for-index with the input.  The first `w - 1`
// entries have no full window behind them and are `None`, so a plotted line
// starts with a gap instead of a fake zero.
// =============================================================================

/// Compute the trailing SMA series for `prices` over `window` observations.
///
/// # Edge cases
/// - empty input => empty vec
/// - `window == 0` or `window > prices.len()` => every entry is `None`
pub fn simple_moving_average(prices: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; prices.len()];
    if window == 0 || prices.len() < window {
        return result;
    }

    let divisor = window as f64;
    for (offset, slice) in prices.windows(window).enumerate() {
        let mean = slice.iter().sum::<f64>() / divisor;
        if mean.is_finite() {
            result[offset + window - 1] = Some(mean);
        }
    }

    result
}

/// Compute one SMA series per `(label, window)` pair, preserving order.
pub fn moving_averages<'a>(
    prices: &[f64],
    windows: impl IntoIterator<Item = (&'a str, usize)>,
) -> Vec<(&'a str, Vec<Option<f64>>)> {
    windows
        .into_iter()
        .map(|(label, window)| (label, simple_moving_average(prices, window)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: [f64; 10] = [100.0, 102.0, 101.0, 105.0, 110.0, 108.0, 95.0, 90.0, 92.0, 98.0];

    #[test]
    fn sma_empty_input() {
        assert!(simple_moving_average(&[], 3).is_empty());
    }

    #[test]
    fn sma_window_zero_is_all_undefined() {
        let sma = simple_moving_average(&[1.0, 2.0, 3.0], 0);
        assert_eq!(sma.len(), 3);
        assert!(sma.iter().all(Option::is_none));
    }

    #[test]
    fn sma_window_longer_than_series_is_all_undefined() {
        let sma = simple_moving_average(&SCENARIO, 11);
        assert_eq!(sma.len(), SCENARIO.len());
        assert!(sma.iter().all(Option::is_none));
    }

    #[test]
    fn sma_window_equal_to_length() {
        let sma = simple_moving_average(&[2.0, 4.0, 6.0], 3);
        assert!(sma[..2].iter().all(Option::is_none));
        assert!((sma[2].unwrap() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sma_scenario_window_three() {
        let sma = simple_moving_average(&SCENARIO, 3);
        let expected = [
            None,
            None,
            Some(303.0 / 3.0),
            Some(308.0 / 3.0),
            Some(316.0 / 3.0),
            Some(323.0 / 3.0),
            Some(313.0 / 3.0),
            Some(293.0 / 3.0),
            Some(277.0 / 3.0),
            Some(280.0 / 3.0),
        ];
        assert_eq!(sma.len(), expected.len());
        for (i, (got, want)) in sma.iter().zip(expected.iter()).enumerate() {
            match (got, want) {
                (None, None) => {}
                (Some(g), Some(w)) => assert!((g - w).abs() < 1e-9, "index {i}: got {g}, want {w}"),
                _ => panic!("index {i}: got {got:?}, want {want:?}"),
            }
        }
        assert_eq!(sma[2], Some(101.0));
    }

    #[test]
    fn sma_window_one_is_identity() {
        let sma = simple_moving_average(&SCENARIO, 1);
        for (got, &p) in sma.iter().zip(SCENARIO.iter()) {
            assert_eq!(*got, Some(p));
        }
    }

    #[test]
    fn moving_average_set_keeps_order_and_labels() {
        let set = moving_averages(&SCENARIO, [("SMA_1", 2), ("LMA_1", 5)]);
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].0, "SMA_1");
        assert_eq!(set[1].0, "LMA_1");
        assert_eq!(set[0].1.iter().filter(|v| v.is_some()).count(), 9);
        assert_eq!(set[1].1.iter().filter(|v| v.is_some()).count(), 6);
    }
}
