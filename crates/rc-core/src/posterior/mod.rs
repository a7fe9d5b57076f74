//! Posterior draws and summaries from the external sampler.
//!
//! The sampler writes one row per draw with string-addressed columns like
//! `coef[3,7]`. Column names are parsed once at load into structured
//! [`ParamName`] addresses and the values land in dense row-major arrays;
//! nothing downstream touches a parameter by string again.

pub mod names;
pub mod store;
pub mod summary;

pub use names::ParamName;
pub use store::{DrawView, PosteriorStore};
pub use summary::{ParameterSummaryTable, RickerPoint, SummaryRow};
