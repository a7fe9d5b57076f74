//! Population reference data.
//!
//! One row per monitored spawning site. The median observed redd density is
//! the baseline spawner abundance used by the recruitment projections.

use rc_common::{Error, PopulationId, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One spawning site's reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Population {
    /// Short identifier, e.g. `bear_valley`.
    pub short_name: String,
    /// Display name, e.g. `Bear Valley Creek`.
    pub long_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// First and last year of redd-count monitoring.
    pub first_year: u16,
    pub last_year: u16,
    /// Median observed redd density over the monitoring period; the
    /// baseline spawner abundance S_j.
    pub median_density: f64,
}

/// Ordered, validated population table. Row order matches the model's
/// population index 1..J.
#[derive(Debug, Clone)]
pub struct PopulationTable {
    populations: Vec<Population>,
    by_name: HashMap<String, PopulationId>,
}

impl PopulationTable {
    pub fn new(populations: Vec<Population>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(populations.len());
        for (idx, p) in populations.iter().enumerate() {
            if !p.median_density.is_finite() || p.median_density < 0.0 {
                return Err(Error::InvalidTable {
                    table: "populations".into(),
                    detail: format!(
                        "'{}': median density {} is not a non-negative number",
                        p.short_name, p.median_density
                    ),
                });
            }
            if p.first_year > p.last_year {
                return Err(Error::InvalidTable {
                    table: "populations".into(),
                    detail: format!(
                        "'{}': first year {} after last year {}",
                        p.short_name, p.first_year, p.last_year
                    ),
                });
            }
            if by_name.insert(p.short_name.clone(), PopulationId(idx)).is_some() {
                return Err(Error::InvalidTable {
                    table: "populations".into(),
                    detail: format!("duplicate population '{}'", p.short_name),
                });
            }
        }
        Ok(Self {
            populations,
            by_name,
        })
    }

    /// Load from a CSV file with columns
    /// `short_name,long_name,latitude,longitude,first_year,last_year,median_density`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let mut populations = Vec::new();
        for row in reader.deserialize() {
            populations.push(row?);
        }
        let table = Self::new(populations)?;
        tracing::debug!(populations = table.len(), path = %path.display(), "loaded population table");
        Ok(table)
    }

    /// Number of populations J.
    pub fn len(&self) -> usize {
        self.populations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }

    pub fn id(&self, short_name: &str) -> Result<PopulationId> {
        self.by_name
            .get(short_name)
            .copied()
            .ok_or_else(|| Error::UnknownPopulation {
                name: short_name.to_string(),
            })
    }

    pub fn get(&self, id: PopulationId) -> &Population {
        &self.populations[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PopulationId, &Population)> {
        self.populations
            .iter()
            .enumerate()
            .map(|(i, p)| (PopulationId(i), p))
    }

    /// Baseline spawner densities in population order.
    pub fn baseline_densities(&self) -> Vec<f64> {
        self.populations.iter().map(|p| p.median_density).collect()
    }
}
