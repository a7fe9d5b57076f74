//! Covariate standardization metadata.
//!
//! The model was fit on z-scored covariates; every scenario change in
//! natural units must pass through the same mean/sd used at fit time.
//! Rows are ordered to match the model's covariate index 1..C.

use rc_common::{CovariateId, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One covariate's standardization record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Covariate {
    /// Short identifier, e.g. `flow_spring` or `temp_aug`.
    pub name: String,
    /// Historical mean of the raw series.
    pub mean: f64,
    /// Historical standard deviation of the raw series.
    pub sd: f64,
    /// Observed raw range over the fitting period.
    pub min_raw: f64,
    pub max_raw: f64,
    /// Standardized range corresponding to the raw range.
    pub min_z: f64,
    pub max_z: f64,
    /// For interaction covariates: the two component covariate names whose
    /// z-scores multiply to produce this covariate's value.
    #[serde(default)]
    pub product_of: Option<(String, String)>,
}

/// A standardized value plus whether the raw input fell inside the
/// historically observed range. Out-of-range values are usable but flagged:
/// the model never saw covariates there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standardized {
    pub z: f64,
    pub in_range: bool,
}

/// Raw CSV row shape; `product_of` arrives as `"a*b"` or empty.
#[derive(Debug, Deserialize)]
struct CovariateRow {
    name: String,
    mean: f64,
    sd: f64,
    min_raw: f64,
    max_raw: f64,
    min_z: f64,
    max_z: f64,
    #[serde(default)]
    product_of: String,
}

/// Ordered, validated covariate reference table.
#[derive(Debug, Clone)]
pub struct CovariateStore {
    covariates: Vec<Covariate>,
    by_name: HashMap<String, CovariateId>,
}

impl CovariateStore {
    /// Build from rows already in model order. Validates sd, bounds, and
    /// interaction references.
    pub fn new(covariates: Vec<Covariate>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(covariates.len());
        for (idx, c) in covariates.iter().enumerate() {
            if !c.sd.is_finite() || c.sd <= 0.0 {
                return Err(Error::DegenerateSd {
                    name: c.name.clone(),
                    sd: c.sd,
                });
            }
            for (field, value) in [
                ("mean", c.mean),
                ("min_raw", c.min_raw),
                ("max_raw", c.max_raw),
                ("min_z", c.min_z),
                ("max_z", c.max_z),
            ] {
                if !value.is_finite() {
                    return Err(Error::IncompleteCovariate {
                        covariate: CovariateId(idx),
                        name: c.name.clone(),
                        field,
                    });
                }
            }
            if c.min_raw > c.max_raw {
                return Err(Error::InvalidTable {
                    table: "covariates".into(),
                    detail: format!("'{}': min_raw {} > max_raw {}", c.name, c.min_raw, c.max_raw),
                });
            }
            if by_name.insert(c.name.clone(), CovariateId(idx)).is_some() {
                return Err(Error::InvalidTable {
                    table: "covariates".into(),
                    detail: format!("duplicate covariate name '{}'", c.name),
                });
            }
        }
        // Interaction components must themselves be covariates in the table.
        for c in &covariates {
            if let Some((a, b)) = &c.product_of {
                for comp in [a, b] {
                    if !by_name.contains_key(comp) {
                        return Err(Error::InvalidTable {
                            table: "covariates".into(),
                            detail: format!(
                                "interaction '{}' references unknown covariate '{}'",
                                c.name, comp
                            ),
                        });
                    }
                }
            }
        }
        Ok(Self {
            covariates,
            by_name,
        })
    }

    /// Load from a CSV file with columns
    /// `name,mean,sd,min_raw,max_raw,min_z,max_z,product_of`.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let mut covariates = Vec::new();
        for row in reader.deserialize() {
            let row: CovariateRow = row?;
            let product_of = parse_product(&row.product_of, &row.name)?;
            covariates.push(Covariate {
                name: row.name,
                mean: row.mean,
                sd: row.sd,
                min_raw: row.min_raw,
                max_raw: row.max_raw,
                min_z: row.min_z,
                max_z: row.max_z,
                product_of,
            });
        }
        let store = Self::new(covariates)?;
        tracing::debug!(covariates = store.len(), path = %path.display(), "loaded covariate store");
        Ok(store)
    }

    /// Number of covariates C.
    pub fn len(&self) -> usize {
        self.covariates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.covariates.is_empty()
    }

    /// Resolve a covariate name to its model index.
    pub fn id(&self, name: &str) -> Result<CovariateId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownCovariate {
                name: name.to_string(),
                available: self.covariates.len(),
            })
    }

    /// Covariate record by index. Indices come from [`CovariateStore::id`]
    /// or the posterior store, so they are always in range.
    pub fn get(&self, id: CovariateId) -> &Covariate {
        &self.covariates[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CovariateId, &Covariate)> {
        self.covariates
            .iter()
            .enumerate()
            .map(|(i, c)| (CovariateId(i), c))
    }

    /// Standardize a raw value: `(raw - mean) / sd`, flagging values outside
    /// the historically observed raw range.
    pub fn standardize(&self, name: &str, raw: f64) -> Result<Standardized> {
        let id = self.id(name)?;
        let c = self.get(id);
        Ok(Standardized {
            z: (raw - c.mean) / c.sd,
            in_range: raw >= c.min_raw && raw <= c.max_raw,
        })
    }

    /// Invert standardization: `z * sd + mean`.
    pub fn destandardize(&self, name: &str, z: f64) -> Result<f64> {
        let id = self.id(name)?;
        let c = self.get(id);
        Ok(z * c.sd + c.mean)
    }
}

fn parse_product(raw: &str, covariate: &str) -> Result<Option<(String, String)>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let mut parts = raw.split('*').map(str::trim);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => {
            Ok(Some((a.to_string(), b.to_string())))
        }
        _ => Err(Error::InvalidTable {
            table: "covariates".into(),
            detail: format!("'{}': malformed product_of '{}'", covariate, raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn plain(name: &str, mean: f64, sd: f64) -> Covariate {
        Covariate {
            name: name.into(),
            mean,
            sd,
            min_raw: mean - 2.0 * sd,
            max_raw: mean + 2.0 * sd,
            min_z: -2.0,
            max_z: 2.0,
            product_of: None,
        }
    }

    #[test]
    fn standardize_round_trip() {
        let store = CovariateStore::new(vec![plain("temp_aug", 14.2, 1.3)]).unwrap();
        let raw = 15.0;
        let s = store.standardize("temp_aug", raw).unwrap();
        assert!(s.in_range);
        let back = store.destandardize("temp_aug", s.z).unwrap();
        assert!((back - raw).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_is_flagged_not_fatal() {
        let store = CovariateStore::new(vec![plain("temp_aug", 14.2, 1.3)]).unwrap();
        let s = store.standardize("temp_aug", 25.0).unwrap();
        assert!(!s.in_range);
        assert!(s.z > 2.0);
    }

    #[test]
    fn unknown_name_is_config_error() {
        let store = CovariateStore::new(vec![plain("temp_aug", 14.2, 1.3)]).unwrap();
        let err = store.standardize("flow_spring", 1.0).unwrap_err();
        assert_eq!(err.code(), 10);
    }

    #[test]
    fn zero_sd_rejected_at_load() {
        let err = CovariateStore::new(vec![plain("temp_aug", 14.2, 0.0)]).unwrap_err();
        assert_eq!(err.code(), 21);
    }

    #[test]
    fn interaction_must_reference_known_covariates() {
        let mut inter = plain("flow_x_temp", 0.0, 1.0);
        inter.product_of = Some(("flow_spring".into(), "temp_aug".into()));
        let err = CovariateStore::new(vec![plain("temp_aug", 14.2, 1.3), inter]).unwrap_err();
        assert_eq!(err.code(), 14);
    }

    #[test]
    fn loads_csv_with_interaction_column() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "name,mean,sd,min_raw,max_raw,min_z,max_z,product_of").unwrap();
        writeln!(f, "flow_spring,320.0,45.0,200.0,430.0,-2.6,2.4,").unwrap();
        writeln!(f, "temp_aug,14.2,1.3,11.0,17.5,-2.5,2.5,").unwrap();
        writeln!(f, "flow_x_temp,0.0,1.0,-6.0,6.0,-6.0,6.0,flow_spring*temp_aug").unwrap();
        let store = CovariateStore::load(f.path()).unwrap();
        assert_eq!(store.len(), 3);
        let c = store.get(store.id("flow_x_temp").unwrap());
        assert_eq!(
            c.product_of,
            Some(("flow_spring".to_string(), "temp_aug".to_string()))
        );
    }
}
