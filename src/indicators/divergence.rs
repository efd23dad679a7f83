// =============================================================================
// Price / Moving-Average Divergence
// =============================================================================
//
// Two representations of the same deviation:
//   ratio      : price / MA       (reference line at 1.0)
//   difference : MA - price       (reference line at 0.0)
//
// Undefined moving-average entries stay undefined in the output.
// =============================================================================

use crate::types::DivergenceMode;

/// Compute the divergence of `prices` from `moving_average` in `mode`.
///
/// Both slices are index-aligned; extra entries in the longer slice are
/// ignored.  Ratio mode yields `None` where the average is zero.
pub fn divergence(
    prices: &[f64],
    moving_average: &[Option<f64>],
    mode: DivergenceMode,
) -> Vec<Option<f64>> {
    prices
        .iter()
        .zip(moving_average.iter())
        .map(|(&price, ma)| {
            let ma = (*ma)?;
            let value = match mode {
                DivergenceMode::Ratio => {
                    if ma == 0.0 {
                        return None;
                    }
                    price / ma
                }
                DivergenceMode::Difference => ma - price,
            };
            value.is_finite().then_some(value)
        })
        .collect()
}
