//! Mixed age-class covariate tracks.
//!
//! Several covariates act on a cohort either in its first year (age 0) or
//! its second (age 1), and the data cannot say which in advance. The model
//! carries both tracks and lets a per-covariate latent proportion p decide
//! how much of each contributes.

use serde::{Deserialize, Serialize};

/// A covariate's two parallel yearly series for one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedCovariate {
    /// Standardized values when the covariate acts at age 0.
    pub age0: Vec<f64>,
    /// Standardized values when the covariate acts at age 1.
    pub age1: Vec<f64>,
}

impl MixedCovariate {
    /// Blend the two tracks at year index `i` with mixture weight `p`
    /// (the weight on the age-1 track): `(1-p)*age0[i] + p*age1[i]`.
    ///
    /// Returns `None` when `i` is out of range for either track.
    pub fn blended(&self, p: f64, i: usize) -> Option<f64> {
        let x0 = self.age0.get(i)?;
        let x1 = self.age1.get(i)?;
        Some((1.0 - p) * x0 + p * x1)
    }

    /// Number of years covered by both tracks.
    pub fn years(&self) -> usize {
        self.age0.len().min(self.age1.len())
    }

    /// Tracks are well-formed when both series have the same length and
    /// every value is finite.
    pub fn is_well_formed(&self) -> bool {
        self.age0.len() == self.age1.len()
            && self.age0.iter().chain(&self.age1).all(|v| v.is_finite())
    }
}
