//! Table writers for projection and curve results.
//!
//! CSV for the per-draw distributions and curve sweeps, JSON for
//! per-scenario summaries. Draw columns always carry the original draw id
//! so a suspicious row can be traced back to the posterior table.

use crate::curve::RuleCurve;
use crate::projection::ScenarioProjection;
use rc_common::{PopulationId, Result};
use rc_config::PopulationTable;
use rc_math::SampleSummary;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct ProductivityRow<'a> {
    scenario: &'a str,
    draw: usize,
    delta_productivity: f64,
}

#[derive(Debug, Serialize)]
struct RecruitmentRow<'a> {
    scenario: &'a str,
    draw: usize,
    population: &'a str,
    recruits: f64,
    net: f64,
    delta: f64,
}

#[derive(Debug, Serialize)]
struct TotalRow<'a> {
    scenario: &'a str,
    draw: usize,
    total_delta: f64,
}

/// One row per draw and scenario: the productivity distribution.
pub fn write_productivity<W: Write>(writer: W, projections: &[&ScenarioProjection]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for p in projections {
        for (m, &value) in p.productivity.iter().enumerate() {
            csv.serialize(ProductivityRow {
                scenario: &p.scenario,
                draw: p.draw_ids[m].0,
                delta_productivity: value,
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}

/// One row per draw, scenario, and population: absolute recruits, net
/// production, and baseline-relative change.
pub fn write_recruitment<W: Write>(
    writer: W,
    projections: &[&ScenarioProjection],
    populations: &PopulationTable,
) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for p in projections {
        for m in 0..p.draw_count() {
            for (j, pop) in populations.iter() {
                csv.serialize(RecruitmentRow {
                    scenario: &p.scenario,
                    draw: p.draw_ids[m].0,
                    population: &pop.short_name,
                    recruits: p.recruits(m, j),
                    net: p.net(m, j),
                    delta: p.delta(m, j),
                })?;
            }
        }
    }
    csv.flush()?;
    Ok(())
}

/// One row per draw and scenario: recruitment change summed over
/// populations.
pub fn write_totals<W: Write>(writer: W, projections: &[&ScenarioProjection]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for p in projections {
        for (m, &value) in p.total_delta.iter().enumerate() {
            csv.serialize(TotalRow {
                scenario: &p.scenario,
                draw: p.draw_ids[m].0,
                total_delta: value,
            })?;
        }
    }
    csv.flush()?;
    Ok(())
}

fn summary_value(s: Option<SampleSummary>) -> serde_json::Value {
    match s {
        Some(s) => serde_json::json!({
            "mean": s.mean,
            "sd": s.sd,
            "median": s.median,
            "lower": s.lower,
            "upper": s.upper,
        }),
        None => serde_json::Value::Null,
    }
}

/// Per-scenario summary document: medians and credible intervals for the
/// productivity change, the summed recruitment change, and each
/// population's recruitment change.
pub fn summary_json(
    projections: &[&ScenarioProjection],
    populations: &PopulationTable,
    interval_mass: f64,
) -> serde_json::Value {
    let scenarios: Vec<serde_json::Value> = projections
        .iter()
        .map(|p| {
            let per_population: Vec<serde_json::Value> = populations
                .iter()
                .map(|(j, pop)| {
                    serde_json::json!({
                        "population": pop.short_name,
                        "delta_recruitment": summary_value(
                            p.population_delta_summary(j, interval_mass),
                        ),
                    })
                })
                .collect();
            serde_json::json!({
                "scenario": p.scenario,
                "draws": p.draw_count(),
                "extrapolated": p.extrapolated,
                "delta_productivity": summary_value(p.productivity_summary(interval_mass)),
                "total_delta_recruitment": summary_value(p.total_delta_summary(interval_mass)),
                "populations": per_population,
            })
        })
        .collect();
    serde_json::json!({ "interval_mass": interval_mass, "scenarios": scenarios })
}

#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    scenario: &'a str,
    population: &'a str,
    spawners: f64,
    recruits: f64,
    carrying_capacity: f64,
}

/// Streaming writer for stock-recruitment curve tables: one row per
/// spawner level, annotated with the curve's carrying capacity.
pub struct CurveWriter<W: Write> {
    csv: csv::Writer<W>,
}

impl<W: Write> CurveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            csv: csv::Writer::from_writer(writer),
        }
    }

    pub fn append(&mut self, scenario: &str, population: &str, curve: RuleCurve) -> Result<()> {
        let k = curve.carrying_capacity();
        for (spawners, recruits) in curve {
            self.csv.serialize(CurveRow {
                scenario,
                population,
                spawners,
                recruits,
                carrying_capacity: k,
            })?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.csv.flush()?;
        Ok(())
    }
}

/// Population names in model order; useful for labeling draw-major blocks.
pub fn population_names(populations: &PopulationTable) -> Vec<(PopulationId, String)> {
    populations
        .iter()
        .map(|(j, p)| (j, p.short_name.clone()))
        .collect()
}
