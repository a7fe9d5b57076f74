//! Structured indices for model dimensions.
//!
//! Posterior columns arrive as strings like `coef[3,7]`; once parsed, all
//! addressing goes through these zero-based indices so a population can never
//! be confused with a covariate or a draw.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based population index (spawning site), `0..J`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopulationId(pub usize);

impl PopulationId {
    /// Parse a one-based index as used in posterior column names.
    pub fn from_one_based(idx: usize) -> Option<Self> {
        idx.checked_sub(1).map(PopulationId)
    }

    /// One-based index for display and column naming.
    pub fn one_based(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for PopulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_based())
    }
}

/// Zero-based covariate index, `0..C`, ordered to match the model's
/// coefficient indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CovariateId(pub usize);

impl CovariateId {
    pub fn from_one_based(idx: usize) -> Option<Self> {
        idx.checked_sub(1).map(CovariateId)
    }

    pub fn one_based(self) -> usize {
        self.0 + 1
    }
}

impl fmt::Display for CovariateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_based())
    }
}

/// Zero-based posterior draw index (row in the draws table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawId(pub usize);

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_based_round_trip() {
        let p = PopulationId::from_one_based(3).unwrap();
        assert_eq!(p, PopulationId(2));
        assert_eq!(p.one_based(), 3);
        assert_eq!(p.to_string(), "3");
    }

    #[test]
    fn zero_is_not_a_valid_one_based_index() {
        assert!(PopulationId::from_one_based(0).is_none());
        assert!(CovariateId::from_one_based(0).is_none());
    }
}
