//! Scenario construction.
//!
//! A scenario is a length-C vector of standardized covariate deltas, zeros
//! for untouched covariates. Changes arrive in natural units (days, cfs,
//! degrees C) and are z-scored against the covariate store the model was
//! fit with. Values outside the historically observed raw range are usable
//! but flagged: the model never saw covariates there.

use rc_common::{CovariateId, Error, Result};
use rc_config::{CovariateStore, FutureProjectionTable};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

/// An immutable standardized scenario vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    name: String,
    z: Vec<f64>,
    extrapolated: Vec<CovariateId>,
}

impl Scenario {
    /// The all-zero baseline scenario.
    pub fn baseline(store: &CovariateStore) -> Self {
        Self {
            name: "baseline".into(),
            z: vec![0.0; store.len()],
            extrapolated: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Standardized deltas in model covariate order.
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    /// Covariates whose requested raw value fell outside the fitted range.
    pub fn extrapolated(&self) -> &[CovariateId] {
        &self.extrapolated
    }

    pub fn is_extrapolated(&self) -> bool {
        !self.extrapolated.is_empty()
    }

    /// Stack scenarios by vector addition, then recompute every declared
    /// interaction covariate as the product of its components' stacked
    /// z-scores. Summing the parts' interaction entries would be wrong:
    /// `(a1+a2)*(b1+b2) != a1*b1 + a2*b2`.
    pub fn stack(store: &CovariateStore, name: impl Into<String>, parts: &[&Scenario]) -> Result<Self> {
        let name = name.into();
        let mut z = vec![0.0; store.len()];
        let mut extrapolated = BTreeSet::new();
        for part in parts {
            if part.len() != store.len() {
                return Err(Error::ScenarioLength {
                    scenario: part.name.clone(),
                    got: part.len(),
                    expected: store.len(),
                });
            }
            for (acc, v) in z.iter_mut().zip(&part.z) {
                *acc += v;
            }
            extrapolated.extend(part.extrapolated.iter().copied());
        }
        apply_interactions(store, &mut z);
        Ok(Self {
            name,
            z,
            extrapolated: extrapolated.into_iter().collect(),
        })
    }
}

/// Builder for a single scenario.
#[derive(Debug)]
pub struct ScenarioBuilder<'a> {
    store: &'a CovariateStore,
    name: String,
    z: Vec<f64>,
    touched: BTreeSet<CovariateId>,
    extrapolated: BTreeSet<CovariateId>,
}

impl<'a> ScenarioBuilder<'a> {
    pub fn new(store: &'a CovariateStore, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            z: vec![0.0; store.len()],
            touched: BTreeSet::new(),
            extrapolated: BTreeSet::new(),
        }
    }

    /// Set a covariate to a new raw (natural-unit) value.
    pub fn set_raw(mut self, covariate: &str, raw: f64) -> Result<Self> {
        let id = self.store.id(covariate)?;
        self.reject_direct_interaction(id, covariate)?;
        let s = self.store.standardize(covariate, raw)?;
        if !s.in_range {
            let c = self.store.get(id);
            tracing::warn!(
                scenario = %self.name,
                covariate,
                raw,
                min_raw = c.min_raw,
                max_raw = c.max_raw,
                "scenario value outside the fitted covariate range; extrapolating"
            );
            self.extrapolated.insert(id);
        }
        self.z[id.0] = s.z;
        self.touched.insert(id);
        Ok(self)
    }

    /// Shift a covariate by `delta` natural units from its historical mean.
    pub fn shift_from_mean(self, covariate: &str, delta: f64) -> Result<Self> {
        let id = self.store.id(covariate)?;
        let mean = self.store.get(id).mean;
        self.set_raw(covariate, mean + delta)
    }

    /// Set a covariate to the central cross-source estimate from a future
    /// projections table.
    pub fn set_from_projection(
        self,
        covariate: &str,
        projections: &FutureProjectionTable,
        season: &str,
        year: u16,
    ) -> Result<Self> {
        let estimate = projections.estimate(season, year).ok_or_else(|| Error::InvalidTable {
            table: "future_projections".into(),
            detail: format!("no projection for season '{}' year {}", season, year),
        })?;
        self.set_raw(covariate, estimate.central)
    }

    /// Finalize: recompute declared interaction covariates from their
    /// components' z-scores.
    pub fn build(mut self) -> Scenario {
        apply_interactions(self.store, &mut self.z);
        Scenario {
            name: self.name,
            z: self.z,
            extrapolated: self.extrapolated.into_iter().collect(),
        }
    }

    fn reject_direct_interaction(&self, id: CovariateId, covariate: &str) -> Result<()> {
        if self.store.get(id).product_of.is_some() {
            return Err(Error::InvalidTable {
                table: "scenario".into(),
                detail: format!(
                    "'{}' is an interaction covariate; set its components instead",
                    covariate
                ),
            });
        }
        Ok(())
    }
}

/// One covariate change in a scenario definition file. Exactly one of
/// `value` (new raw value) or `shift` (delta from the historical mean)
/// must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeDef {
    pub covariate: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub shift: Option<f64>,
}

/// One scenario definition: either direct changes or a stack of
/// previously defined scenarios.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioDef {
    pub name: String,
    #[serde(default)]
    pub changes: Vec<ChangeDef>,
    #[serde(default)]
    pub stack: Vec<String>,
}

/// Load scenario definitions from a JSON array and resolve them in order.
/// Stacks may only reference scenarios defined earlier in the file.
pub fn load_scenarios(path: &Path, store: &CovariateStore) -> Result<Vec<Scenario>> {
    let text = std::fs::read_to_string(path)?;
    let defs: Vec<ScenarioDef> = serde_json::from_str(&text)?;
    resolve_scenarios(&defs, store)
}

/// Resolve parsed definitions against a covariate store.
pub fn resolve_scenarios(defs: &[ScenarioDef], store: &CovariateStore) -> Result<Vec<Scenario>> {
    let mut resolved: Vec<Scenario> = Vec::with_capacity(defs.len());
    for def in defs {
        if !def.changes.is_empty() && !def.stack.is_empty() {
            return Err(Error::InvalidTable {
                table: "scenarios".into(),
                detail: format!("'{}' mixes direct changes with a stack", def.name),
            });
        }
        let scenario = if !def.stack.is_empty() {
            let mut parts = Vec::with_capacity(def.stack.len());
            for part_name in &def.stack {
                let part = resolved
                    .iter()
                    .find(|s| s.name() == part_name.as_str())
                    .ok_or_else(|| Error::InvalidTable {
                        table: "scenarios".into(),
                        detail: format!(
                            "'{}' stacks undefined scenario '{}'",
                            def.name, part_name
                        ),
                    })?;
                parts.push(part);
            }
            Scenario::stack(store, def.name.clone(), &parts)?
        } else {
            let mut builder = ScenarioBuilder::new(store, def.name.clone());
            for change in &def.changes {
                builder = match (change.value, change.shift) {
                    (Some(value), None) => builder.set_raw(&change.covariate, value)?,
                    (None, Some(shift)) => builder.shift_from_mean(&change.covariate, shift)?,
                    _ => {
                        return Err(Error::InvalidTable {
                            table: "scenarios".into(),
                            detail: format!(
                                "'{}' change for '{}' needs exactly one of value/shift",
                                def.name, change.covariate
                            ),
                        })
                    }
                };
            }
            builder.build()
        };
        resolved.push(scenario);
    }
    Ok(resolved)
}

/// Overwrite every interaction covariate with the product of its
/// components' current z-scores. Baseline components (z = 0) keep the
/// interaction at 0.
fn apply_interactions(store: &CovariateStore, z: &mut [f64]) {
    for (id, c) in store.iter() {
        if let Some((a, b)) = &c.product_of {
            // Components were validated at store load; ids resolve.
            let za = store.id(a).map(|i| z[i.0]).unwrap_or(0.0);
            let zb = store.id(b).map(|i| z[i.0]).unwrap_or(0.0);
            z[id.0] = za * zb;
        }
    }
}
