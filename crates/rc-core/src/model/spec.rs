//! Typed model specification for the external sampler.
//!
//! Replaces inline textual model declarations with a schema the sampler
//! receives as JSON: dimensions, per-population year ranges and abundance
//! caps, prior bounds, and the mixed covariate tracks.

use super::tracks::MixedCovariate;
use rc_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Years 1..4 seed the 4-year recruitment lag and are never exposed as
/// latent-state outputs.
pub const SPIN_UP_YEARS: usize = 4;

/// Bounds for the model's uniform priors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorBounds {
    /// Uniform bounds shared by all standard-deviation parameters
    /// (sigma.oe, sigma.pe[j], sigma.A, sigma.coef[c]).
    pub sigma_lower: f64,
    pub sigma_upper: f64,
    /// phi[j] ~ Uniform(-phi_bound, phi_bound).
    pub phi_bound: f64,
    /// mu.A derived from exp(mu.A) ~ Uniform(0, exp_mu_a_upper).
    pub exp_mu_a_upper: f64,
}

impl Default for PriorBounds {
    fn default() -> Self {
        Self {
            sigma_lower: 0.001,
            sigma_upper: 100.0,
            phi_bound: 0.99,
            exp_mu_a_upper: 20.0,
        }
    }
}

/// Per-population dimensions and the mixed covariate tracks, one
/// [`MixedCovariate`] per model covariate in index order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationDims {
    pub name: String,
    /// Monitored years, including the spin-up block.
    pub num_years: usize,
    /// Cap on plausible abundance; spin-up states draw from
    /// Uniform(1, max_y).
    pub max_y: f64,
    pub tracks: Vec<MixedCovariate>,
}

/// Complete structural specification of the hierarchical state-space model.
///
/// Remaining structure (fixed, not configurable):
/// - A[j] ~ Normal(mu.A, sigma.A^2)
/// - B[j] ~ Normal(0, 1) truncated strictly positive
/// - coef[j,c] ~ Normal(mu.coef[c], sigma.coef[c]^2)
/// - p[c] ~ Uniform(0, 1)
/// - observation error shared across populations, process error per
///   population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    pub populations: Vec<PopulationDims>,
    /// Covariate count C.
    pub covariates: usize,
    #[serde(default)]
    pub priors: PriorBounds,
}

impl ModelSpec {
    /// Population count J.
    pub fn population_count(&self) -> usize {
        self.populations.len()
    }

    /// Load a spec from JSON and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let spec: ModelSpec = serde_json::from_str(&text)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Canonical JSON for handing to the sampler.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check dimensional consistency and prior-bound sanity.
    pub fn validate(&self) -> Result<()> {
        if self.populations.is_empty() {
            return Err(invalid("no populations"));
        }
        if self.covariates == 0 {
            return Err(invalid("no covariates"));
        }
        let p = &self.priors;
        if !(p.sigma_lower > 0.0 && p.sigma_lower < p.sigma_upper) {
            return Err(invalid(format!(
                "sigma bounds ({}, {}) are not an increasing positive pair",
                p.sigma_lower, p.sigma_upper
            )));
        }
        if !(0.0 < p.phi_bound && p.phi_bound < 1.0) {
            return Err(invalid(format!("phi bound {} outside (0,1)", p.phi_bound)));
        }
        if p.exp_mu_a_upper <= 0.0 {
            return Err(invalid("exp(mu.A) upper bound must be positive"));
        }
        for pop in &self.populations {
            if pop.num_years <= SPIN_UP_YEARS {
                return Err(invalid(format!(
                    "population '{}' has {} years; needs more than the {}-year spin-up",
                    pop.name, pop.num_years, SPIN_UP_YEARS
                )));
            }
            if !pop.max_y.is_finite() || pop.max_y <= 1.0 {
                return Err(invalid(format!(
                    "population '{}' max_y {} must exceed the Uniform(1, max_y) lower bound",
                    pop.name, pop.max_y
                )));
            }
            if pop.tracks.len() != self.covariates {
                return Err(invalid(format!(
                    "population '{}' has {} covariate tracks, model expects {}",
                    pop.name,
                    pop.tracks.len(),
                    self.covariates
                )));
            }
            for (c, track) in pop.tracks.iter().enumerate() {
                if !track.is_well_formed() {
                    return Err(invalid(format!(
                        "population '{}' covariate {}: malformed tracks",
                        pop.name,
                        c + 1
                    )));
                }
                if track.years() != pop.num_years {
                    return Err(invalid(format!(
                        "population '{}' covariate {}: {} track years vs {} monitored years",
                        pop.name,
                        c + 1,
                        track.years(),
                        pop.num_years
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(detail: impl Into<String>) -> Error {
    Error::InvalidTable {
        table: "model_spec".into(),
        detail: detail.into(),
    }
}
