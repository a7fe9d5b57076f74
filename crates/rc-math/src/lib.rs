//! Reddcast math utilities.

pub mod math;

pub use math::quantile::*;
pub use math::summary::*;
