//! Quantiles with linear interpolation between order statistics.
//!
//! Uses the R type-7 definition (the default in most statistical software),
//! so medians and credible-interval endpoints match what the sampler's own
//! summaries report.

/// Quantile of `sorted` at probability `p` in [0,1].
///
/// `sorted` must be ascending and free of NaN. Returns NaN for empty input.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = p * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Quantile of unsorted samples; non-finite values are dropped first.
pub fn quantile(samples: &[f64], p: f64) -> f64 {
    let mut cleaned: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    cleaned.sort_by(f64::total_cmp);
    quantile_sorted(&cleaned, p)
}

/// Median of unsorted samples.
pub fn median(samples: &[f64]) -> f64 {
    quantile(samples, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn median_of_odd_count_is_middle_value() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn median_of_even_count_interpolates() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn endpoints_are_min_and_max() {
        let xs = [5.0, -1.0, 2.5, 0.0];
        assert_eq!(quantile(&xs, 0.0), -1.0);
        assert_eq!(quantile(&xs, 1.0), 5.0);
    }

    #[test]
    fn empty_input_is_nan() {
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn non_finite_values_are_dropped() {
        assert_eq!(median(&[1.0, f64::NAN, 3.0, f64::INFINITY, 2.0]), 2.0);
    }

    proptest! {
        #[test]
        fn quantile_is_within_sample_range(
            xs in proptest::collection::vec(-1e6f64..1e6, 1..200),
            p in 0.0f64..=1.0,
        ) {
            let q = quantile(&xs, p);
            let min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(q >= min - 1e-9 && q <= max + 1e-9);
        }

        #[test]
        fn quantile_is_monotone_in_p(
            xs in proptest::collection::vec(-1e6f64..1e6, 1..200),
            p1 in 0.0f64..=1.0,
            p2 in 0.0f64..=1.0,
        ) {
            let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
            prop_assert!(quantile(&xs, lo) <= quantile(&xs, hi) + 1e-9);
        }
    }
}
