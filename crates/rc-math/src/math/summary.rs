//! Posterior-sample summaries: mean, sd, median, credible intervals.

use super::quantile::quantile_sorted;
use serde::Serialize;

/// Point summary of a vector of posterior samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSummary {
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub median: f64,
    /// Lower endpoint of the equal-tailed credible interval.
    pub lower: f64,
    /// Upper endpoint of the equal-tailed credible interval.
    pub upper: f64,
}

/// Summarize samples with an equal-tailed credible interval of the given
/// mass (e.g. 0.95 gives the 2.5% and 97.5% quantiles).
///
/// Non-finite samples are dropped. Returns `None` when no finite samples
/// remain or the interval mass is outside (0,1].
pub fn summarize(samples: &[f64], interval_mass: f64) -> Option<SampleSummary> {
    if !(0.0..=1.0).contains(&interval_mass) || interval_mass == 0.0 {
        return None;
    }
    let mut cleaned: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.sort_by(f64::total_cmp);

    let n = cleaned.len();
    let mean = cleaned.iter().sum::<f64>() / n as f64;
    let sd = if n > 1 {
        let ss = cleaned.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let tail = (1.0 - interval_mass) / 2.0;

    Some(SampleSummary {
        n,
        mean,
        sd,
        median: quantile_sorted(&cleaned, 0.5),
        lower: quantile_sorted(&cleaned, tail),
        upper: quantile_sorted(&cleaned, 1.0 - tail),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn constant_samples_have_zero_sd() {
        let s = summarize(&[2.0, 2.0, 2.0, 2.0], 0.95).unwrap();
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.sd, 0.0);
        assert_eq!(s.lower, 2.0);
        assert_eq!(s.upper, 2.0);
    }

    #[test]
    fn known_mean_and_sd() {
        let s = summarize(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.95).unwrap();
        assert!((s.mean - 3.0).abs() < 1e-12);
        assert!((s.sd - (2.5f64).sqrt()).abs() < 1e-12);
        assert_eq!(s.median, 3.0);
    }

    #[test]
    fn empty_and_all_nan_yield_none() {
        assert!(summarize(&[], 0.95).is_none());
        assert!(summarize(&[f64::NAN, f64::NAN], 0.95).is_none());
    }

    #[test]
    fn rejects_zero_mass_interval() {
        assert!(summarize(&[1.0, 2.0], 0.0).is_none());
    }

    proptest! {
        #[test]
        fn interval_brackets_median(
            xs in proptest::collection::vec(-1e6f64..1e6, 2..300),
            mass in 0.5f64..=1.0,
        ) {
            let s = summarize(&xs, mass).unwrap();
            prop_assert!(s.lower <= s.median + 1e-9);
            prop_assert!(s.median <= s.upper + 1e-9);
        }

        #[test]
        fn wider_mass_gives_wider_interval(
            xs in proptest::collection::vec(-1e3f64..1e3, 5..300),
        ) {
            let narrow = summarize(&xs, 0.5).unwrap();
            let wide = summarize(&xs, 0.95).unwrap();
            prop_assert!(wide.lower <= narrow.lower + 1e-9);
            prop_assert!(wide.upper >= narrow.upper - 1e-9);
        }
    }
}
