//! Error types for reddcast.
//!
//! Structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Enough context (population, draw, covariate) to diagnose a failure
//!   without re-running the whole batch
//!
//! Errors serialize to structured JSON via [`Error::to_json_value`]:
//! ```json
//! {
//!   "code": 23,
//!   "category": "domain",
//!   "message": "density dependence B[2] = -0.013 is not positive (draw 417)"
//! }
//! ```

use crate::id::{CovariateId, DrawId, PopulationId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for reddcast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Reference-table and request shape errors (unknown identifiers,
    /// dimension mismatches, draw-count overruns).
    Config,
    /// Mathematically invalid parameter combinations (non-positive
    /// density dependence, degenerate standard deviations).
    Domain,
    /// Missing or non-finite values where a complete row is required.
    Data,
    /// File I/O and table parsing errors.
    Io,
}

/// Where a parameter vector came from, for error context: a posterior draw
/// or a point summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    Draw(DrawId),
    Summary,
}

impl std::fmt::Display for ParamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamSource::Draw(d) => write!(f, "draw {}", d),
            ParamSource::Summary => write!(f, "posterior summary"),
        }
    }
}

impl std::error::Error for ParamSource {}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Domain => write!(f, "domain"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Reddcast error type.
#[derive(Debug, Error)]
pub enum Error {
    // ------------------------------------------------------------------
    // Config (10-19)
    // ------------------------------------------------------------------
    /// A covariate name was requested that the covariate store does not hold.
    #[error("unknown covariate '{name}'; store holds {available} covariates")]
    UnknownCovariate { name: String, available: usize },

    /// A population name or index absent from the population table.
    #[error("unknown population '{name}'")]
    UnknownPopulation { name: String },

    /// A scenario vector whose length does not match the model covariate count.
    #[error("scenario '{scenario}' has {got} covariates, model expects {expected}")]
    ScenarioLength {
        scenario: String,
        got: usize,
        expected: usize,
    },

    /// Requested more posterior draws than the store holds.
    #[error("requested {requested} draws but only {available} are available")]
    DrawCountExceeded { requested: usize, available: usize },

    /// Reference-table contents that fail load-time validation.
    #[error("invalid {table} table: {detail}")]
    InvalidTable { table: String, detail: String },

    // ------------------------------------------------------------------
    // Domain (20-29)
    // ------------------------------------------------------------------
    /// Carrying capacity requested for a non-positive density-dependence
    /// parameter. K = A/B is only defined for B > 0.
    #[error("density dependence B[{population}] = {value} is not positive ({source})")]
    NonPositiveDensityDependence {
        population: PopulationId,
        source: ParamSource,
        value: f64,
    },

    /// A covariate summary with sd <= 0 cannot standardize anything.
    #[error("covariate '{name}' has non-positive sd {sd}")]
    DegenerateSd { name: String, sd: f64 },

    // ------------------------------------------------------------------
    // Data (30-39)
    // ------------------------------------------------------------------
    /// Missing or non-finite posterior cell where a complete draw is needed.
    #[error("draw {draw}: column '{column}' is missing or not finite")]
    IncompleteDraw { draw: DrawId, column: String },

    /// Missing or non-finite covariate summary field.
    #[error("covariate {covariate} ('{name}'): field '{field}' is missing or not finite")]
    IncompleteCovariate {
        covariate: CovariateId,
        name: String,
        field: &'static str,
    },

    /// A posterior column name that does not parse into a known parameter.
    #[error("unrecognized posterior column '{column}'")]
    UnrecognizedColumn { column: String },

    // ------------------------------------------------------------------
    // Io (40-49)
    // ------------------------------------------------------------------
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("json error: {0}")]
    Json(String),
}

impl Error {
    /// Category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::UnknownCovariate { .. }
            | Error::UnknownPopulation { .. }
            | Error::ScenarioLength { .. }
            | Error::DrawCountExceeded { .. }
            | Error::InvalidTable { .. } => ErrorCategory::Config,
            Error::NonPositiveDensityDependence { .. } | Error::DegenerateSd { .. } => {
                ErrorCategory::Domain
            }
            Error::IncompleteDraw { .. }
            | Error::IncompleteCovariate { .. }
            | Error::UnrecognizedColumn { .. } => ErrorCategory::Data,
            Error::Io(_) | Error::Csv(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Stable numeric code. These are a contract for automation; changes
    /// require a major version bump.
    pub fn code(&self) -> u16 {
        match self {
            Error::UnknownCovariate { .. } => 10,
            Error::UnknownPopulation { .. } => 11,
            Error::ScenarioLength { .. } => 12,
            Error::DrawCountExceeded { .. } => 13,
            Error::InvalidTable { .. } => 14,
            Error::NonPositiveDensityDependence { .. } => 20,
            Error::DegenerateSd { .. } => 21,
            Error::IncompleteDraw { .. } => 30,
            Error::IncompleteCovariate { .. } => 31,
            Error::UnrecognizedColumn { .. } => 32,
            Error::Io(_) => 40,
            Error::Csv(_) => 41,
            Error::Json(_) => 42,
        }
    }

    /// Structured representation for JSONL logs and agent output.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "category": self.category().to_string(),
            "message": self.to_string(),
        })
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e.to_string())
    }
}
