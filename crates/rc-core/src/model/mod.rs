//! The hierarchical state-space stock-recruitment model specification.
//!
//! The model itself is sampled by an external MCMC engine; this module is
//! the typed contract that engine must honor, plus deterministic evaluators
//! for the pieces the projection core and posterior predictive checks reuse.
//!
//! Structure, per population j and year i (i >= SPIN_UP_YEARS):
//!
//! ```text
//! logpred[j,i]  = logY[j,i-4] + A[j] - B[j]*exp(logY[j,i-4]) + sum_c cov_eff[j,i,c]
//! cov_eff[j,i,c] = coef[j,c] * ((1-p[c])*covars0[j,i,c] + p[c]*covars1[j,i,c])
//! logpred2[j,i] = logpred[j,i] + phi[j]*logresid[j,i-1]
//! logY[j,i]   ~ Normal(logpred2[j,i], sigma_pe[j]^2)
//! logresid[j,i] = logY[j,i] - logpred[j,i]
//! logY0[j,i]  ~ Normal(logY[j,i], sigma_oe^2)        (observation)
//! ```
//!
//! The 4-year recruitment lag reflects the species' dominant age at return.

pub mod spec;
pub mod tracks;

pub use spec::{ModelSpec, PopulationDims, PriorBounds, SPIN_UP_YEARS};
pub use tracks::MixedCovariate;

use rc_common::{DrawId, Error, ParamSource, PopulationId, Result};

/// Covariate-effect sum for one population-year:
/// `sum_c coef[c] * blended_track_value[c]`.
///
/// `blended` holds the mixture-weighted covariate values, already evaluated
/// via [`MixedCovariate::blended`].
pub fn covariate_effect(coef: &[f64], blended: &[f64]) -> f64 {
    coef.iter().zip(blended).map(|(c, x)| c * x).sum()
}

/// Expected log abundance before autocorrelation:
/// `logY_lag + A - B*exp(logY_lag) + cov_effect`.
pub fn predicted_log_mean(log_y_lag: f64, a: f64, b: f64, cov_effect: f64) -> f64 {
    log_y_lag + a - b * log_y_lag.exp() + cov_effect
}

/// Fold the previous year's process residual into the expectation.
pub fn with_autocorrelation(logpred: f64, phi: f64, prev_resid: f64) -> f64 {
    logpred + phi * prev_resid
}

/// Carrying capacity K = A/B, defined only for B > 0.
pub fn carrying_capacity(
    a: f64,
    b: f64,
    population: PopulationId,
    draw: DrawId,
) -> Result<f64> {
    if b <= 0.0 || !b.is_finite() {
        return Err(Error::NonPositiveDensityDependence {
            population,
            source: ParamSource::Draw(draw),
            value: b,
        });
    }
    Ok(a / b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covariate_effect_is_dot_product() {
        let coef = [0.5, -0.2, 0.0];
        let blended = [1.0, 2.0, 99.0];
        assert!((covariate_effect(&coef, &blended) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn predicted_log_mean_matches_hand_calculation() {
        // logY_lag = ln(100), A = 1.0, B = 0.01: 100 spawners at replacement
        // scale should predict ln(100) + 1 - 1 = ln(100).
        let lag = 100.0f64.ln();
        let m = predicted_log_mean(lag, 1.0, 0.01, 0.0);
        assert!((m - lag).abs() < 1e-12);
    }

    #[test]
    fn autocorrelation_shifts_by_scaled_residual() {
        let m = with_autocorrelation(2.0, 0.5, -0.4);
        assert!((m - 1.8).abs() < 1e-12);
    }

    #[test]
    fn carrying_capacity_requires_positive_b() {
        let k = carrying_capacity(1.0, 0.01, PopulationId(0), DrawId(3)).unwrap();
        assert!((k - 100.0).abs() < 1e-12);
        let err = carrying_capacity(1.0, 0.0, PopulationId(0), DrawId(3)).unwrap_err();
        assert_eq!(err.code(), 20);
    }
}
