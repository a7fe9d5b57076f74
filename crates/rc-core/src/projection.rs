//! Monte Carlo scenario projection.
//!
//! For each posterior draw and scenario, evaluates:
//! - productivity change: the covariate-effect sum under the global
//!   coefficient means (every population weighted equally), and
//! - recruitment under the full Ricker function with population-specific
//!   coefficients, anchored at each population's baseline median density.
//!
//! Recruitment is reported two ways. `net` is recruits minus spawners
//! (production relative to replacement). `delta` is recruits minus the same
//! draw's zero-scenario recruits, so the all-zero scenario yields exactly
//! zero for every draw and population. Totals sum `delta` over populations:
//! large populations dominate the total, by design, which is precisely how
//! it differs from the productivity metric.
//!
//! Work is a parallel map over draws; each draw's parameters are read
//! atomically through [`DrawView`].

use crate::posterior::{DrawView, PosteriorStore};
use crate::scenario::Scenario;
use rayon::prelude::*;
use rc_common::{DrawId, Error, PopulationId, Result};
use rc_config::PopulationTable;
use rc_math::{summarize, SampleSummary};

/// Draw selection and summary options for a projection run.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionConfig {
    /// Number of posterior draws to use; `None` means all.
    pub draws: Option<usize>,
    /// When set, draws are a seeded random subset instead of evenly
    /// spaced thinning.
    pub seed: Option<u64>,
    /// Credible-interval mass for summaries.
    pub interval_mass: f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            draws: None,
            seed: None,
            interval_mass: 0.95,
        }
    }
}

/// Full per-draw projection results for one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioProjection {
    pub scenario: String,
    /// True when the scenario was built from raw values outside the fitted
    /// covariate range.
    pub extrapolated: bool,
    pub draw_ids: Vec<DrawId>,
    populations: usize,
    /// Productivity change per draw.
    pub productivity: Vec<f64>,
    /// Absolute recruits, draw-major `[m * J + j]`.
    pub recruits: Vec<f64>,
    /// Recruits minus spawners, draw-major.
    pub net: Vec<f64>,
    /// Recruits minus the same draw's zero-scenario recruits, draw-major.
    pub delta: Vec<f64>,
    /// Sum of `delta` over populations, per draw.
    pub total_delta: Vec<f64>,
}

impl ScenarioProjection {
    pub fn draw_count(&self) -> usize {
        self.draw_ids.len()
    }

    pub fn population_count(&self) -> usize {
        self.populations
    }

    pub fn delta(&self, m: usize, j: PopulationId) -> f64 {
        self.delta[m * self.populations + j.0]
    }

    pub fn net(&self, m: usize, j: PopulationId) -> f64 {
        self.net[m * self.populations + j.0]
    }

    pub fn recruits(&self, m: usize, j: PopulationId) -> f64 {
        self.recruits[m * self.populations + j.0]
    }

    /// Per-draw recruitment change column for one population.
    pub fn delta_column(&self, j: PopulationId) -> Vec<f64> {
        (0..self.draw_count()).map(|m| self.delta(m, j)).collect()
    }

    pub fn productivity_summary(&self, mass: f64) -> Option<SampleSummary> {
        summarize(&self.productivity, mass)
    }

    pub fn total_delta_summary(&self, mass: f64) -> Option<SampleSummary> {
        summarize(&self.total_delta, mass)
    }

    pub fn population_delta_summary(&self, j: PopulationId, mass: f64) -> Option<SampleSummary> {
        summarize(&self.delta_column(j), mass)
    }
}

/// The projection engine: read-only over the posterior store and
/// population table.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionEngine<'a> {
    posterior: &'a PosteriorStore,
    populations: &'a PopulationTable,
}

impl<'a> ProjectionEngine<'a> {
    /// The posterior's population dimension must match the population table.
    pub fn new(posterior: &'a PosteriorStore, populations: &'a PopulationTable) -> Result<Self> {
        if posterior.population_count() != populations.len() {
            return Err(Error::InvalidTable {
                table: "populations".into(),
                detail: format!(
                    "posterior has {} populations, table has {}",
                    posterior.population_count(),
                    populations.len()
                ),
            });
        }
        Ok(Self {
            posterior,
            populations,
        })
    }

    /// Resolve the configured draw subset.
    pub fn select_draws(&self, config: &ProjectionConfig) -> Result<Vec<DrawId>> {
        let m = config.draws.unwrap_or_else(|| self.posterior.len());
        match config.seed {
            Some(seed) => self.posterior.sample_draws(m, seed),
            None => self.posterior.select_draws(m),
        }
    }

    /// Project one scenario over the given draws.
    pub fn project(&self, scenario: &Scenario, draw_ids: &[DrawId]) -> Result<ScenarioProjection> {
        let c = self.posterior.covariate_count();
        if scenario.len() != c {
            return Err(Error::ScenarioLength {
                scenario: scenario.name().to_string(),
                got: scenario.len(),
                expected: c,
            });
        }
        let j_count = self.populations.len();
        let baselines = self.populations.baseline_densities();
        let z = scenario.z();

        struct DrawOutcome {
            productivity: f64,
            rows: Vec<(f64, f64, f64)>,
            total_delta: f64,
        }

        let outcomes: Vec<DrawOutcome> = draw_ids
            .par_iter()
            .map(|&d| {
                let view = self.posterior.view(d);
                let productivity = dot(view.mu_coef_row(), z);
                let mut rows = Vec::with_capacity(j_count);
                let mut total_delta = 0.0;
                for (j, &s) in baselines.iter().enumerate() {
                    let (recruits, net, delta) = project_population(&view, PopulationId(j), s, z);
                    total_delta += delta;
                    rows.push((recruits, net, delta));
                }
                DrawOutcome {
                    productivity,
                    rows,
                    total_delta,
                }
            })
            .collect();

        let m_count = outcomes.len();
        let mut projection = ScenarioProjection {
            scenario: scenario.name().to_string(),
            extrapolated: scenario.is_extrapolated(),
            draw_ids: draw_ids.to_vec(),
            populations: j_count,
            productivity: Vec::with_capacity(m_count),
            recruits: Vec::with_capacity(m_count * j_count),
            net: Vec::with_capacity(m_count * j_count),
            delta: Vec::with_capacity(m_count * j_count),
            total_delta: Vec::with_capacity(m_count),
        };
        for outcome in outcomes {
            projection.productivity.push(outcome.productivity);
            projection.total_delta.push(outcome.total_delta);
            for (recruits, net, delta) in outcome.rows {
                projection.recruits.push(recruits);
                projection.net.push(net);
                projection.delta.push(delta);
            }
        }
        tracing::debug!(
            scenario = %projection.scenario,
            draws = m_count,
            populations = j_count,
            "projected scenario"
        );
        Ok(projection)
    }

    /// Project a batch of scenarios over a shared draw subset. A scenario
    /// that fails does not abort the others; its error is returned in
    /// place.
    pub fn project_batch(
        &self,
        scenarios: &[Scenario],
        config: &ProjectionConfig,
    ) -> Result<Vec<(String, Result<ScenarioProjection>)>> {
        let draw_ids = self.select_draws(config)?;
        Ok(scenarios
            .iter()
            .map(|scenario| {
                let result = self.project(scenario, &draw_ids);
                if let Err(e) = &result {
                    tracing::error!(
                        scenario = scenario.name(),
                        error = %e,
                        "scenario projection failed; continuing batch"
                    );
                }
                (scenario.name().to_string(), result)
            })
            .collect())
    }
}

/// One population's recruitment under one draw and scenario:
/// `(recruits, net, delta)`.
///
/// The zero-scenario expression is recomputed with the identical formula,
/// so an all-zero z gives `delta == 0.0` exactly.
fn project_population(view: &DrawView<'_>, j: PopulationId, s: f64, z: &[f64]) -> (f64, f64, f64) {
    let a = view.a(j);
    let b = view.b(j);
    let effect = dot(view.coef_row(j), z);
    let recruits = s * (a - b * s + effect).exp();
    let baseline = s * (a - b * s).exp();
    (recruits, recruits - s, recruits - baseline)
}

fn dot(coef: &[f64], z: &[f64]) -> f64 {
    coef.iter().zip(z).map(|(c, x)| c * x).sum()
}
