//! Summarized future covariate projections.
//!
//! One row per (climate-model source, season, projection year) holding a
//! seasonal covariate value with its low/high range. Scenario construction
//! uses the central estimate across sources; the range rides along so
//! reports can show spread between climate models.

use rc_common::{Error, Result};
use rc_math::median;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One projected seasonal value from one climate-model source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureProjection {
    /// Climate-model or archive identifier, e.g. `cnrm_cm5`.
    pub source: String,
    /// Season label, e.g. `spring`, `aug`.
    pub season: String,
    /// Projection year, e.g. 2040.
    pub year: u16,
    /// Central projected value in natural units.
    pub value: f64,
    /// Range across the source's ensemble.
    pub low: f64,
    pub high: f64,
}

/// Cross-source summary for one (season, year) cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeasonalEstimate {
    /// Median of the per-source central values.
    pub central: f64,
    /// Envelope across all sources.
    pub low: f64,
    pub high: f64,
    /// Number of contributing sources.
    pub sources: usize,
}

/// All projection rows, indexed by (season, year).
#[derive(Debug, Clone)]
pub struct FutureProjectionTable {
    rows: Vec<FutureProjection>,
    by_cell: BTreeMap<(String, u16), Vec<usize>>,
}

impl FutureProjectionTable {
    pub fn new(rows: Vec<FutureProjection>) -> Result<Self> {
        let mut by_cell: BTreeMap<(String, u16), Vec<usize>> = BTreeMap::new();
        for (idx, r) in rows.iter().enumerate() {
            for (field, v) in [("value", r.value), ("low", r.low), ("high", r.high)] {
                if !v.is_finite() {
                    return Err(Error::InvalidTable {
                        table: "future_projections".into(),
                        detail: format!(
                            "{}/{}/{}: field '{}' is not finite",
                            r.source, r.season, r.year, field
                        ),
                    });
                }
            }
            if r.low > r.high {
                return Err(Error::InvalidTable {
                    table: "future_projections".into(),
                    detail: format!("{}/{}/{}: low > high", r.source, r.season, r.year),
                });
            }
            by_cell.entry((r.season.clone(), r.year)).or_default().push(idx);
        }
        Ok(Self { rows, by_cell })
    }

    /// Load from a CSV file with columns `source,season,year,value,low,high`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        let table = Self::new(rows)?;
        tracing::debug!(rows = table.rows.len(), path = %path.display(), "loaded future projections");
        Ok(table)
    }

    pub fn rows(&self) -> &[FutureProjection] {
        &self.rows
    }

    /// Cross-source estimate for a (season, year) cell, `None` when no
    /// source projects that cell.
    pub fn estimate(&self, season: &str, year: u16) -> Option<SeasonalEstimate> {
        let indices = self.by_cell.get(&(season.to_string(), year))?;
        let values: Vec<f64> = indices.iter().map(|&i| self.rows[i].value).collect();
        let low = indices
            .iter()
            .map(|&i| self.rows[i].low)
            .fold(f64::INFINITY, f64::min);
        let high = indices
            .iter()
            .map(|&i| self.rows[i].high)
            .fold(f64::NEG_INFINITY, f64::max);
        Some(SeasonalEstimate {
            central: median(&values),
            low,
            high,
            sources: indices.len(),
        })
    }

    /// All (season, year) cells present in the table.
    pub fn cells(&self) -> impl Iterator<Item = (&str, u16)> {
        self.by_cell.keys().map(|(s, y)| (s.as_str(), *y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(source: &str, season: &str, year: u16, value: f64) -> FutureProjection {
        FutureProjection {
            source: source.into(),
            season: season.into(),
            year,
            value,
            low: value - 1.0,
            high: value + 1.0,
        }
    }

    #[test]
    fn central_estimate_is_median_across_sources() {
        let t = FutureProjectionTable::new(vec![
            row("cnrm", "aug", 2040, 16.0),
            row("hadgem", "aug", 2040, 18.0),
            row("ccsm", "aug", 2040, 17.0),
        ])
        .unwrap();
        let e = t.estimate("aug", 2040).unwrap();
        assert_eq!(e.central, 17.0);
        assert_eq!(e.low, 15.0);
        assert_eq!(e.high, 19.0);
        assert_eq!(e.sources, 3);
    }

    #[test]
    fn missing_cell_is_none() {
        let t = FutureProjectionTable::new(vec![row("cnrm", "aug", 2040, 16.0)]).unwrap();
        assert!(t.estimate("spring", 2040).is_none());
        assert!(t.estimate("aug", 2080).is_none());
    }

    #[test]
    fn inverted_range_rejected() {
        let mut r = row("cnrm", "aug", 2040, 16.0);
        r.low = 20.0;
        assert!(FutureProjectionTable::new(vec![r]).is_err());
    }
}
