//! Row-keyed parameter point summaries.
//!
//! The sampler (or [`super::PosteriorStore::summarize`]) reduces each
//! parameter to a point summary; rule curves can run from these when a
//! single representative curve is wanted instead of one per draw.

use super::names::ParamName;
use rc_common::{CovariateId, Error, ParamSource, PopulationId, Result};
use rc_math::SampleSummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Point summary of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub mean: f64,
    pub sd: f64,
    pub lower: f64,
    pub median: f64,
    pub upper: f64,
}

#[derive(Debug, Deserialize)]
struct SummaryCsvRow {
    parameter: String,
    mean: f64,
    sd: f64,
    lower: f64,
    median: f64,
    upper: f64,
}

/// Ricker parameters for one population taken from point summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct RickerPoint {
    pub a: f64,
    pub b: f64,
    /// Population-specific coefficient means, length C.
    pub coef: Vec<f64>,
}

/// All parameter point summaries, keyed by structured name.
#[derive(Debug, Clone)]
pub struct ParameterSummaryTable {
    rows: HashMap<ParamName, SummaryRow>,
}

impl ParameterSummaryTable {
    /// Load from a CSV file with columns
    /// `parameter,mean,sd,lower,median,upper`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let mut rows = HashMap::new();
        for row in reader.deserialize() {
            let row: SummaryCsvRow = row?;
            let name = ParamName::parse(&row.parameter)?;
            let summary = SummaryRow {
                mean: row.mean,
                sd: row.sd,
                lower: row.lower,
                median: row.median,
                upper: row.upper,
            };
            if rows.insert(name, summary).is_some() {
                return Err(Error::InvalidTable {
                    table: "parameter_summary".into(),
                    detail: format!("duplicate parameter '{}'", row.parameter),
                });
            }
        }
        Ok(Self { rows })
    }

    /// Build from per-parameter draw summaries.
    pub fn from_summaries(summaries: &[(ParamName, SampleSummary)]) -> Self {
        let rows = summaries
            .iter()
            .map(|(name, s)| {
                (
                    *name,
                    SummaryRow {
                        mean: s.mean,
                        sd: s.sd,
                        lower: s.lower,
                        median: s.median,
                        upper: s.upper,
                    },
                )
            })
            .collect();
        Self { rows }
    }

    pub fn get(&self, name: ParamName) -> Option<&SummaryRow> {
        self.rows.get(&name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Posterior-mean Ricker parameters for population `j`, with
    /// `covariates` coefficient entries. A missing parameter names the
    /// absent column; B <= 0 is rejected as a domain error.
    pub fn ricker_point(&self, j: PopulationId, covariates: usize) -> Result<RickerPoint> {
        let mean_of = |name: ParamName| -> Result<f64> {
            self.rows.get(&name).map(|r| r.mean).ok_or_else(|| Error::InvalidTable {
                table: "parameter_summary".into(),
                detail: format!("missing parameter '{}'", name),
            })
        };
        let a = mean_of(ParamName::A(j))?;
        let b = mean_of(ParamName::B(j))?;
        if b <= 0.0 || !b.is_finite() {
            return Err(Error::NonPositiveDensityDependence {
                population: j,
                source: ParamSource::Summary,
                value: b,
            });
        }
        let coef = (0..covariates)
            .map(|c| mean_of(ParamName::Coef(j, CovariateId(c))))
            .collect::<Result<Vec<f64>>>()?;
        Ok(RickerPoint { a, b, coef })
    }
}
