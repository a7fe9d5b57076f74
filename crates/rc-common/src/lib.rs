//! Reddcast common types, indices, and errors.
//!
//! This crate provides foundational types shared across rc-core modules:
//! - Structured indices for populations, covariates, and posterior draws
//! - The shared error taxonomy
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;

pub use error::{Error, ErrorCategory, ParamSource, Result};
pub use id::{CovariateId, DrawId, PopulationId};
pub use output::OutputFormat;
