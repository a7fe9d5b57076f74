//! Dense posterior draw storage.
//!
//! One load pass converts the sampler's CSV into row-major arrays keyed by
//! (draw, population, covariate). A draw's parameters are only handed out
//! through [`DrawView`], so projection code can never mix two draws' values.

use super::names::ParamName;
use crate::model;
use rc_common::{CovariateId, DrawId, Error, PopulationId, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rc_math::{summarize, SampleSummary};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// All posterior draws, immutable once loaded.
///
/// Required parameter blocks: `A[j]`, `B[j]`, `coef[j,c]`, `mu.coef[c]`.
/// Optional blocks (kept when the sampler reports them): `phi[j]`,
/// `sigma.pe[j]`, `p[c]`, `sigma.coef[c]`, `mu.A`, `sigma.A`, `sigma.oe`.
#[derive(Debug, Clone)]
pub struct PosteriorStore {
    draws: usize,
    populations: usize,
    covariates: usize,
    a: Vec<f64>,
    b: Vec<f64>,
    coef: Vec<f64>,
    mu_coef: Vec<f64>,
    phi: Option<Vec<f64>>,
    sigma_pe: Option<Vec<f64>>,
    p: Option<Vec<f64>>,
    sigma_coef: Option<Vec<f64>>,
    mu_a: Option<Vec<f64>>,
    sigma_a: Option<Vec<f64>>,
    sigma_oe: Option<Vec<f64>>,
}

/// Where one CSV column lands in the dense arrays.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Known(ParamName),
    Skip,
}

impl PosteriorStore {
    /// Load draws from a CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(file)?;
        tracing::info!(
            draws = store.len(),
            populations = store.population_count(),
            covariates = store.covariate_count(),
            path = %path.display(),
            "loaded posterior draws"
        );
        Ok(store)
    }

    /// Load draws from any reader producing the sampler's CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv.headers()?.clone();
        let mut slots = Vec::with_capacity(headers.len());
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for column in headers.iter() {
            match ParamName::parse(column) {
                Ok(name) => {
                    if !seen.insert(name) {
                        return Err(Error::InvalidTable {
                            table: "posterior_draws".into(),
                            detail: format!("duplicate column '{}'", column),
                        });
                    }
                    names.push(name);
                    slots.push(Slot::Known(name));
                }
                Err(_) => {
                    // Samplers emit bookkeeping columns (iteration, deviance);
                    // skip them rather than refusing the table.
                    tracing::warn!(column, "skipping unrecognized posterior column");
                    slots.push(Slot::Skip);
                }
            }
        }

        let (populations, covariates) = infer_dims(&names)?;
        check_blocks(&seen, populations, covariates)?;

        let has = |n: ParamName| seen.contains(&n);
        let phi_present = has(ParamName::Phi(PopulationId(0)));
        let sigma_pe_present = has(ParamName::SigmaPe(PopulationId(0)));
        let p_present = has(ParamName::P(CovariateId(0)));
        let sigma_coef_present = has(ParamName::SigmaCoef(CovariateId(0)));

        let mut store = PosteriorStore {
            draws: 0,
            populations,
            covariates,
            a: Vec::new(),
            b: Vec::new(),
            coef: Vec::new(),
            mu_coef: Vec::new(),
            phi: phi_present.then(Vec::new),
            sigma_pe: sigma_pe_present.then(Vec::new),
            p: p_present.then(Vec::new),
            sigma_coef: sigma_coef_present.then(Vec::new),
            mu_a: has(ParamName::MuA).then(Vec::new),
            sigma_a: has(ParamName::SigmaA).then(Vec::new),
            sigma_oe: has(ParamName::SigmaOe).then(Vec::new),
        };

        for (row_idx, record) in csv.records().enumerate() {
            let record = record?;
            let draw = DrawId(row_idx);
            store.begin_row();
            for (slot, cell) in slots.iter().zip(record.iter()) {
                let Slot::Known(name) = slot else { continue };
                let value: f64 = cell.parse().map_err(|_| Error::IncompleteDraw {
                    draw,
                    column: name.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(Error::IncompleteDraw {
                        draw,
                        column: name.to_string(),
                    });
                }
                store.assign(row_idx, *name, value);
            }
            store.draws += 1;
        }

        if store.draws == 0 {
            return Err(Error::InvalidTable {
                table: "posterior_draws".into(),
                detail: "no draws".into(),
            });
        }
        Ok(store)
    }

    fn begin_row(&mut self) {
        let j = self.populations;
        let c = self.covariates;
        self.a.extend(std::iter::repeat(f64::NAN).take(j));
        self.b.extend(std::iter::repeat(f64::NAN).take(j));
        self.coef.extend(std::iter::repeat(f64::NAN).take(j * c));
        self.mu_coef.extend(std::iter::repeat(f64::NAN).take(c));
        for block in [&mut self.phi, &mut self.sigma_pe] {
            if let Some(v) = block {
                v.extend(std::iter::repeat(f64::NAN).take(j));
            }
        }
        for block in [&mut self.p, &mut self.sigma_coef] {
            if let Some(v) = block {
                v.extend(std::iter::repeat(f64::NAN).take(c));
            }
        }
        for block in [&mut self.mu_a, &mut self.sigma_a, &mut self.sigma_oe] {
            if let Some(v) = block {
                v.push(f64::NAN);
            }
        }
    }

    fn assign(&mut self, row: usize, name: ParamName, value: f64) {
        let j_count = self.populations;
        let c_count = self.covariates;
        match name {
            ParamName::A(j) => self.a[row * j_count + j.0] = value,
            ParamName::B(j) => self.b[row * j_count + j.0] = value,
            ParamName::Coef(j, c) => {
                self.coef[row * j_count * c_count + j.0 * c_count + c.0] = value
            }
            ParamName::MuCoef(c) => self.mu_coef[row * c_count + c.0] = value,
            ParamName::Phi(j) => {
                if let Some(v) = &mut self.phi {
                    v[row * j_count + j.0] = value;
                }
            }
            ParamName::SigmaPe(j) => {
                if let Some(v) = &mut self.sigma_pe {
                    v[row * j_count + j.0] = value;
                }
            }
            ParamName::P(c) => {
                if let Some(v) = &mut self.p {
                    v[row * c_count + c.0] = value;
                }
            }
            ParamName::SigmaCoef(c) => {
                if let Some(v) = &mut self.sigma_coef {
                    v[row * c_count + c.0] = value;
                }
            }
            ParamName::MuA => {
                if let Some(v) = &mut self.mu_a {
                    v[row] = value;
                }
            }
            ParamName::SigmaA => {
                if let Some(v) = &mut self.sigma_a {
                    v[row] = value;
                }
            }
            ParamName::SigmaOe => {
                if let Some(v) = &mut self.sigma_oe {
                    v[row] = value;
                }
            }
        }
    }

    /// Number of draws M.
    pub fn len(&self) -> usize {
        self.draws
    }

    pub fn is_empty(&self) -> bool {
        self.draws == 0
    }

    /// Population count J implied by the column names.
    pub fn population_count(&self) -> usize {
        self.populations
    }

    /// Covariate count C implied by the column names.
    pub fn covariate_count(&self) -> usize {
        self.covariates
    }

    /// Atomic view of one draw's full parameter vector.
    pub fn view(&self, draw: DrawId) -> DrawView<'_> {
        debug_assert!(draw.0 < self.draws);
        DrawView { store: self, draw }
    }

    /// Evenly spaced thinning to `m` draws; deterministic.
    pub fn select_draws(&self, m: usize) -> Result<Vec<DrawId>> {
        if m > self.draws {
            return Err(Error::DrawCountExceeded {
                requested: m,
                available: self.draws,
            });
        }
        Ok((0..m).map(|i| DrawId(i * self.draws / m.max(1))).collect())
    }

    /// Seeded random subset of `m` draws without replacement, in draw order.
    pub fn sample_draws(&self, m: usize, seed: u64) -> Result<Vec<DrawId>> {
        if m > self.draws {
            return Err(Error::DrawCountExceeded {
                requested: m,
                available: self.draws,
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picked: Vec<usize> = rand::seq::index::sample(&mut rng, self.draws, m).into_vec();
        picked.sort_unstable();
        Ok(picked.into_iter().map(DrawId).collect())
    }

    /// Per-parameter summaries computed directly from the draws, in
    /// deterministic parameter order.
    pub fn summarize(&self, interval_mass: f64) -> Vec<(ParamName, SampleSummary)> {
        let mut out = Vec::new();
        let mut push = |name: ParamName, samples: Vec<f64>| {
            if let Some(s) = summarize(&samples, interval_mass) {
                out.push((name, s));
            }
        };
        for j in 0..self.populations {
            let j_id = PopulationId(j);
            push(ParamName::A(j_id), self.column(&self.a, self.populations, j));
            push(ParamName::B(j_id), self.column(&self.b, self.populations, j));
            if let Some(v) = &self.phi {
                push(ParamName::Phi(j_id), self.column(v, self.populations, j));
            }
            if let Some(v) = &self.sigma_pe {
                push(ParamName::SigmaPe(j_id), self.column(v, self.populations, j));
            }
            for c in 0..self.covariates {
                let samples = (0..self.draws)
                    .map(|m| self.coef[m * self.populations * self.covariates + j * self.covariates + c])
                    .collect();
                push(ParamName::Coef(j_id, CovariateId(c)), samples);
            }
        }
        for c in 0..self.covariates {
            let c_id = CovariateId(c);
            push(ParamName::MuCoef(c_id), self.column(&self.mu_coef, self.covariates, c));
            if let Some(v) = &self.sigma_coef {
                push(ParamName::SigmaCoef(c_id), self.column(v, self.covariates, c));
            }
            if let Some(v) = &self.p {
                push(ParamName::P(c_id), self.column(v, self.covariates, c));
            }
        }
        if let Some(v) = &self.mu_a {
            push(ParamName::MuA, v.clone());
        }
        if let Some(v) = &self.sigma_a {
            push(ParamName::SigmaA, v.clone());
        }
        if let Some(v) = &self.sigma_oe {
            push(ParamName::SigmaOe, v.clone());
        }
        out
    }

    fn column(&self, block: &[f64], stride: usize, offset: usize) -> Vec<f64> {
        (0..self.draws).map(|m| block[m * stride + offset]).collect()
    }
}

/// One draw's parameters, read as an immutable unit.
#[derive(Debug, Clone, Copy)]
pub struct DrawView<'a> {
    store: &'a PosteriorStore,
    draw: DrawId,
}

impl<'a> DrawView<'a> {
    pub fn draw(&self) -> DrawId {
        self.draw
    }

    /// Intrinsic log productivity A[j].
    pub fn a(&self, j: PopulationId) -> f64 {
        self.store.a[self.draw.0 * self.store.populations + j.0]
    }

    /// Density dependence B[j].
    pub fn b(&self, j: PopulationId) -> f64 {
        self.store.b[self.draw.0 * self.store.populations + j.0]
    }

    /// Population-specific coefficient row, length C.
    pub fn coef_row(&self, j: PopulationId) -> &'a [f64] {
        let c = self.store.covariates;
        let start = self.draw.0 * self.store.populations * c + j.0 * c;
        &self.store.coef[start..start + c]
    }

    /// Global coefficient means, length C.
    pub fn mu_coef_row(&self) -> &'a [f64] {
        let c = self.store.covariates;
        let start = self.draw.0 * c;
        &self.store.mu_coef[start..start + c]
    }

    pub fn phi(&self, j: PopulationId) -> Option<f64> {
        self.store
            .phi
            .as_ref()
            .map(|v| v[self.draw.0 * self.store.populations + j.0])
    }

    pub fn p(&self, c: CovariateId) -> Option<f64> {
        self.store
            .p
            .as_ref()
            .map(|v| v[self.draw.0 * self.store.covariates + c.0])
    }

    pub fn sigma_oe(&self) -> Option<f64> {
        self.store.sigma_oe.as_ref().map(|v| v[self.draw.0])
    }

    /// Carrying capacity K[j] = A[j]/B[j]; `DomainError` when B[j] <= 0.
    pub fn carrying_capacity(&self, j: PopulationId) -> Result<f64> {
        model::carrying_capacity(self.a(j), self.b(j), j, self.draw)
    }
}

fn infer_dims(names: &[ParamName]) -> Result<(usize, usize)> {
    let mut max_j = None;
    let mut max_c = None;
    for name in names {
        match name {
            ParamName::A(j) | ParamName::B(j) | ParamName::Phi(j) | ParamName::SigmaPe(j) => {
                max_j = max_j.max(Some(j.0));
            }
            ParamName::Coef(j, c) => {
                max_j = max_j.max(Some(j.0));
                max_c = max_c.max(Some(c.0));
            }
            ParamName::MuCoef(c) | ParamName::SigmaCoef(c) | ParamName::P(c) => {
                max_c = max_c.max(Some(c.0));
            }
            ParamName::MuA | ParamName::SigmaA | ParamName::SigmaOe => {}
        }
    }
    match (max_j, max_c) {
        (Some(j), Some(c)) => Ok((j + 1, c + 1)),
        _ => Err(Error::InvalidTable {
            table: "posterior_draws".into(),
            detail: "no population- or covariate-indexed columns found".into(),
        }),
    }
}

/// Require the rectangular blocks the projections depend on, and require
/// optional blocks to be complete when any of their columns appear.
fn check_blocks(seen: &HashSet<ParamName>, populations: usize, covariates: usize) -> Result<()> {
    let missing = |name: ParamName| Error::InvalidTable {
        table: "posterior_draws".into(),
        detail: format!("missing column '{}'", name),
    };
    for j in (0..populations).map(PopulationId) {
        for required in [ParamName::A(j), ParamName::B(j)] {
            if !seen.contains(&required) {
                return Err(missing(required));
            }
        }
        for c in (0..covariates).map(CovariateId) {
            if !seen.contains(&ParamName::Coef(j, c)) {
                return Err(missing(ParamName::Coef(j, c)));
            }
        }
    }
    for c in (0..covariates).map(CovariateId) {
        if !seen.contains(&ParamName::MuCoef(c)) {
            return Err(missing(ParamName::MuCoef(c)));
        }
    }

    let pop_block = |make: fn(PopulationId) -> ParamName| -> Result<()> {
        let present = (0..populations).filter(|&j| seen.contains(&make(PopulationId(j)))).count();
        if present == 0 || present == populations {
            Ok(())
        } else {
            (0..populations)
                .map(PopulationId)
                .find(|&j| !seen.contains(&make(j)))
                .map_or(Ok(()), |j| Err(missing(make(j))))
        }
    };
    let cov_block = |make: fn(CovariateId) -> ParamName| -> Result<()> {
        let present = (0..covariates).filter(|&c| seen.contains(&make(CovariateId(c)))).count();
        if present == 0 || present == covariates {
            Ok(())
        } else {
            (0..covariates)
                .map(CovariateId)
                .find(|&c| !seen.contains(&make(c)))
                .map_or(Ok(()), |c| Err(missing(make(c))))
        }
    };
    pop_block(ParamName::Phi)?;
    pop_block(ParamName::SigmaPe)?;
    cov_block(ParamName::P)?;
    cov_block(ParamName::SigmaCoef)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2 populations, 2 covariates, 3 draws.
    const DRAWS: &str = "\
A[1],A[2],B[1],B[2],\"coef[1,1]\",\"coef[1,2]\",\"coef[2,1]\",\"coef[2,2]\",mu.coef[1],mu.coef[2],phi[1],phi[2],sigma.oe,deviance
1.0,1.2,0.01,0.02,0.5,-0.2,0.4,-0.1,0.45,-0.15,0.1,0.2,0.3,812.0
1.1,1.3,0.012,0.021,0.55,-0.25,0.35,-0.05,0.45,-0.15,0.15,0.25,0.31,815.0
0.9,1.1,0.009,0.019,0.45,-0.15,0.5,-0.2,0.475,-0.175,0.05,0.1,0.29,809.0
";

    fn store() -> PosteriorStore {
        PosteriorStore::from_reader(DRAWS.as_bytes()).unwrap()
    }

    #[test]
    fn dims_inferred_from_columns() {
        let s = store();
        assert_eq!(s.len(), 3);
        assert_eq!(s.population_count(), 2);
        assert_eq!(s.covariate_count(), 2);
    }

    #[test]
    fn view_reads_one_draw_atomically() {
        let s = store();
        let v = s.view(DrawId(1));
        assert_eq!(v.a(PopulationId(0)), 1.1);
        assert_eq!(v.b(PopulationId(1)), 0.021);
        assert_eq!(v.coef_row(PopulationId(0)), &[0.55, -0.25]);
        assert_eq!(v.mu_coef_row(), &[0.45, -0.15]);
        assert_eq!(v.phi(PopulationId(1)), Some(0.25));
        assert_eq!(v.sigma_oe(), Some(0.31));
    }

    #[test]
    fn bookkeeping_columns_are_skipped() {
        // `deviance` is present in the fixture; the load succeeds anyway.
        assert_eq!(store().len(), 3);
    }

    #[test]
    fn na_cell_is_data_error_naming_draw_and_column() {
        let csv = "A[1],B[1],\"coef[1,1]\",mu.coef[1]\n1.0,0.01,NA,0.4\n";
        let err = PosteriorStore::from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.code(), 30);
        let msg = err.to_string();
        assert!(msg.contains("coef[1,1]"));
        assert!(msg.contains("draw 0"));
    }

    #[test]
    fn missing_required_column_rejected() {
        let csv = "A[1],A[2],B[1],B[2],\"coef[1,1]\",\"coef[2,1]\",mu.coef[1]\n1,0.9,0.01,0.02,0.5,0.4,0.45\n";
        // fine: 2 pops, 1 covariate
        PosteriorStore::from_reader(csv.as_bytes()).unwrap();
        let csv = "A[1],A[2],B[1],\"coef[1,1]\",\"coef[2,1]\",mu.coef[1]\n1,0.9,0.01,0.5,0.4,0.45\n";
        let err = PosteriorStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("B[2]"));
    }

    #[test]
    fn partial_optional_block_rejected() {
        let csv = "A[1],A[2],B[1],B[2],\"coef[1,1]\",\"coef[2,1]\",mu.coef[1],phi[1]\n1,0.9,0.01,0.02,0.5,0.4,0.45,0.1\n";
        let err = PosteriorStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("phi[2]"));
    }

    #[test]
    fn thinning_is_even_and_bounded() {
        let s = store();
        assert_eq!(s.select_draws(3).unwrap(), vec![DrawId(0), DrawId(1), DrawId(2)]);
        assert_eq!(s.select_draws(2).unwrap(), vec![DrawId(0), DrawId(1)]);
        assert_eq!(s.select_draws(4).unwrap_err().code(), 13);
    }

    #[test]
    fn seeded_sampling_is_reproducible() {
        let s = store();
        let first = s.sample_draws(2, 42).unwrap();
        let second = s.sample_draws(2, 42).unwrap();
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(s.sample_draws(4, 42).is_err());
    }

    #[test]
    fn summaries_cover_required_blocks() {
        let s = store();
        let summary = s.summarize(0.95);
        let a1 = summary
            .iter()
            .find(|(n, _)| *n == ParamName::A(PopulationId(0)))
            .map(|(_, s)| s)
            .unwrap();
        assert!((a1.mean - 1.0).abs() < 1e-12);
        assert_eq!(a1.n, 3);
        assert!(summary.iter().any(|(n, _)| *n == ParamName::SigmaOe));
    }

    #[test]
    fn carrying_capacity_from_view() {
        let s = store();
        let v = s.view(DrawId(0));
        let k = v.carrying_capacity(PopulationId(0)).unwrap();
        assert!((k - 100.0).abs() < 1e-9);
    }
}
