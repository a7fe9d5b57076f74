//! Posterior column-name parsing.
//!
//! Sampler output addresses parameters as `A[1]`, `coef[3,7]`, `sigma.oe`.
//! Indices in names are one-based; [`ParamName`] carries zero-based ids.

use rc_common::{CovariateId, Error, PopulationId, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A structured posterior parameter address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    /// Intrinsic log productivity, per population.
    A(PopulationId),
    /// Density-dependence strength, per population.
    B(PopulationId),
    /// AR(1) residual carry-over, per population.
    Phi(PopulationId),
    /// Process-error sd, per population.
    SigmaPe(PopulationId),
    /// Covariate coefficient, per population and covariate.
    Coef(PopulationId, CovariateId),
    /// Hierarchical coefficient mean, per covariate.
    MuCoef(CovariateId),
    /// Hierarchical coefficient sd, per covariate.
    SigmaCoef(CovariateId),
    /// Age-class mixture weight, per covariate.
    P(CovariateId),
    /// Hierarchical productivity mean.
    MuA,
    /// Hierarchical productivity sd.
    SigmaA,
    /// Shared observation-error sd.
    SigmaOe,
}

fn column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]+(?:\.[A-Za-z]+)?)(?:\[(\d+)(?:,(\d+))?\])?$")
            .expect("column regex is valid")
    })
}

impl ParamName {
    /// Parse a sampler column name. One-based indices become zero-based ids.
    pub fn parse(column: &str) -> Result<Self> {
        let unrecognized = || Error::UnrecognizedColumn {
            column: column.to_string(),
        };
        let caps = column_regex().captures(column.trim()).ok_or_else(unrecognized)?;
        let base = &caps[1];
        let first = caps
            .get(2)
            .map(|m| m.as_str().parse::<usize>().map_err(|_| unrecognized()))
            .transpose()?;
        let second = caps
            .get(3)
            .map(|m| m.as_str().parse::<usize>().map_err(|_| unrecognized()))
            .transpose()?;

        let pop = |idx: Option<usize>| -> Result<PopulationId> {
            idx.and_then(PopulationId::from_one_based).ok_or_else(unrecognized)
        };
        let cov = |idx: Option<usize>| -> Result<CovariateId> {
            idx.and_then(CovariateId::from_one_based).ok_or_else(unrecognized)
        };

        match (base, second) {
            ("A", None) => Ok(ParamName::A(pop(first)?)),
            ("B", None) => Ok(ParamName::B(pop(first)?)),
            ("phi", None) => Ok(ParamName::Phi(pop(first)?)),
            ("sigma.pe", None) => Ok(ParamName::SigmaPe(pop(first)?)),
            ("coef", Some(c)) => Ok(ParamName::Coef(pop(first)?, cov(Some(c))?)),
            ("mu.coef", None) => Ok(ParamName::MuCoef(cov(first)?)),
            ("sigma.coef", None) => Ok(ParamName::SigmaCoef(cov(first)?)),
            ("p", None) => Ok(ParamName::P(cov(first)?)),
            ("mu.A", None) if first.is_none() => Ok(ParamName::MuA),
            ("sigma.A", None) if first.is_none() => Ok(ParamName::SigmaA),
            ("sigma.oe", None) if first.is_none() => Ok(ParamName::SigmaOe),
            _ => Err(unrecognized()),
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamName::A(j) => write!(f, "A[{}]", j),
            ParamName::B(j) => write!(f, "B[{}]", j),
            ParamName::Phi(j) => write!(f, "phi[{}]", j),
            ParamName::SigmaPe(j) => write!(f, "sigma.pe[{}]", j),
            ParamName::Coef(j, c) => write!(f, "coef[{},{}]", j, c),
            ParamName::MuCoef(c) => write!(f, "mu.coef[{}]", c),
            ParamName::SigmaCoef(c) => write!(f, "sigma.coef[{}]", c),
            ParamName::P(c) => write!(f, "p[{}]", c),
            ParamName::MuA => write!(f, "mu.A"),
            ParamName::SigmaA => write!(f, "sigma.A"),
            ParamName::SigmaOe => write!(f, "sigma.oe"),
        }
    }
}
