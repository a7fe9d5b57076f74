//! Reddcast reference tables.
//!
//! Read-only configuration loaded once per run:
//! - Covariate standardization metadata ([`CovariateStore`])
//! - Population reference data ([`PopulationTable`])
//! - Summarized future covariate projections ([`FutureProjectionTable`])
//!
//! All tables are CSV, validated at load time. Nothing here mutates after
//! construction; downstream components hold shared references.

pub mod covariates;
pub mod future;
pub mod populations;

pub use covariates::{Covariate, CovariateStore, Standardized};
pub use future::{FutureProjection, FutureProjectionTable, SeasonalEstimate};
pub use populations::{Population, PopulationTable};
