//! Reddcast core library.
//!
//! Estimates and projects salmonid population productivity from long-term
//! redd counts. The pieces, in data-flow order:
//! - `model`: the typed hierarchical state-space model specification handed
//!   to the external MCMC sampler
//! - `posterior`: dense storage for the sampler's draws and summaries
//! - `scenario`: natural-unit covariate changes turned into standardized
//!   scenario vectors
//! - `projection`: Monte Carlo propagation of posterior draws through the
//!   covariate-effect sum and the Ricker recruitment function
//! - `curve`: stock-recruitment rule curves with carrying-capacity
//!   annotation
//!
//! The binary entry point is in `main.rs`.

pub mod curve;
pub mod exit_codes;
pub mod logging;
pub mod model;
pub mod output;
pub mod posterior;
pub mod projection;
pub mod scenario;
