//! Stock-recruitment rule curves.
//!
//! Holds a scenario's covariate forcing fixed and sweeps spawner abundance
//! to trace the Ricker curve for one population:
//!
//! ```text
//! recruits(s) = exp(ln(s) + A - B*s + sum_c coef[c]*z[c])
//! ```
//!
//! `ln(0)` is undefined, so the curve pins `recruits(0) = 0` instead of
//! propagating a numeric error. The implied carrying capacity under the
//! scenario, `(A + covariate effect)/B`, is carried for annotation; with a
//! zero scenario it reduces to A/B.

use crate::posterior::{DrawView, RickerPoint};
use crate::scenario::Scenario;
use rc_common::{Error, ParamSource, PopulationId, Result};

/// Lazy, finite sweep of (spawners, recruits) pairs.
#[derive(Debug, Clone)]
pub struct RuleCurve {
    population: PopulationId,
    a: f64,
    b: f64,
    effect: f64,
    step: f64,
    max_spawners: f64,
    next_index: usize,
    points: usize,
}

impl RuleCurve {
    /// Build a curve from explicit Ricker parameters and a fixed covariate
    /// effect. `B <= 0` produces an unbounded curve with no carrying
    /// capacity, so it is rejected here.
    pub fn new(
        population: PopulationId,
        source: ParamSource,
        a: f64,
        b: f64,
        effect: f64,
        max_spawners: f64,
        step: f64,
    ) -> Result<Self> {
        if b <= 0.0 || !b.is_finite() {
            return Err(Error::NonPositiveDensityDependence {
                population,
                source,
                value: b,
            });
        }
        if !(step > 0.0 && max_spawners >= 0.0) {
            return Err(Error::InvalidTable {
                table: "rule_curve".into(),
                detail: format!(
                    "invalid sweep: max_spawners {} step {}",
                    max_spawners, step
                ),
            });
        }
        // Inclusive of 0 and of the last grid point at or below max.
        let points = (max_spawners / step).floor() as usize + 1;
        Ok(Self {
            population,
            a,
            b,
            effect,
            step,
            max_spawners,
            next_index: 0,
            points,
        })
    }

    /// Curve from one posterior draw's parameters under a scenario.
    pub fn from_draw(
        view: &DrawView<'_>,
        population: PopulationId,
        scenario: &Scenario,
        max_spawners: f64,
        step: f64,
    ) -> Result<Self> {
        let coef = view.coef_row(population);
        require_len(scenario, coef.len())?;
        let effect = coef.iter().zip(scenario.z()).map(|(c, z)| c * z).sum();
        Self::new(
            population,
            ParamSource::Draw(view.draw()),
            view.a(population),
            view.b(population),
            effect,
            max_spawners,
            step,
        )
    }

    /// Curve from posterior point summaries under a scenario.
    pub fn from_point(
        point: &RickerPoint,
        population: PopulationId,
        scenario: &Scenario,
        max_spawners: f64,
        step: f64,
    ) -> Result<Self> {
        require_len(scenario, point.coef.len())?;
        let effect = point.coef.iter().zip(scenario.z()).map(|(c, z)| c * z).sum();
        Self::new(
            population,
            ParamSource::Summary,
            point.a,
            point.b,
            effect,
            max_spawners,
            step,
        )
    }

    pub fn population(&self) -> PopulationId {
        self.population
    }

    /// Implied carrying capacity under the fixed scenario:
    /// `(A + covariate effect) / B`.
    pub fn carrying_capacity(&self) -> f64 {
        (self.a + self.effect) / self.b
    }

    /// Recruits at a given spawner abundance; exact 0 at 0.
    pub fn recruits(&self, spawners: f64) -> f64 {
        if spawners == 0.0 {
            return 0.0;
        }
        (spawners.ln() + self.a - self.b * spawners + self.effect).exp()
    }

    /// Number of grid points the sweep will yield.
    pub fn points(&self) -> usize {
        self.points
    }
}

impl Iterator for RuleCurve {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.points {
            return None;
        }
        let spawners = (self.next_index as f64 * self.step).min(self.max_spawners);
        self.next_index += 1;
        Some((spawners, self.recruits(spawners)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.points - self.next_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RuleCurve {}

fn require_len(scenario: &Scenario, expected: usize) -> Result<()> {
    if scenario.len() != expected {
        return Err(Error::ScenarioLength {
            scenario: scenario.name().to_string(),
            got: scenario.len(),
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_common::DrawId;

    fn curve(a: f64, b: f64, effect: f64) -> RuleCurve {
        RuleCurve::new(
            PopulationId(0),
            ParamSource::Draw(DrawId(0)),
            a,
            b,
            effect,
            200.0,
            50.0,
        )
        .unwrap()
    }

    #[test]
    fn zero_spawners_give_zero_recruits() {
        let c = curve(1.0, 0.01, 0.3);
        assert_eq!(c.recruits(0.0), 0.0);
        let first = c.clone().next().unwrap();
        assert_eq!(first, (0.0, 0.0));
    }

    #[test]
    fn recruits_match_hand_calculation() {
        // A=1.0, B=0.01, s=50: exp(ln 50 + 1 - 0.5) = 50*exp(0.5) ~ 82.44
        let c = curve(1.0, 0.01, 0.0);
        let r = c.recruits(50.0);
        assert!((r - 50.0 * 0.5f64.exp()).abs() < 1e-9);
        assert!((r - 82.44).abs() < 0.01);
    }

    #[test]
    fn carrying_capacity_is_a_over_b_at_baseline() {
        let c = curve(1.0, 0.01, 0.0);
        assert!((c.carrying_capacity() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn carrying_capacity_shifts_with_covariate_forcing() {
        let c = curve(1.0, 0.01, 0.2);
        assert!((c.carrying_capacity() - 120.0).abs() < 1e-9);
        // at K, recruits equal spawners (replacement)
        let k = c.carrying_capacity();
        assert!((c.recruits(k) - k).abs() < 1e-9);
    }

    #[test]
    fn sweep_is_finite_and_inclusive() {
        let points: Vec<(f64, f64)> = curve(1.0, 0.01, 0.0).collect();
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].0, 0.0);
        assert_eq!(points[4].0, 200.0);
    }

    #[test]
    fn non_positive_b_is_domain_error() {
        let err = RuleCurve::new(
            PopulationId(2),
            ParamSource::Draw(DrawId(7)),
            1.0,
            -0.01,
            0.0,
            200.0,
            50.0,
        )
        .unwrap_err();
        assert_eq!(err.code(), 20);
        assert!(err.to_string().contains("B[3]"));
    }

    proptest::proptest! {
        #[test]
        fn replacement_holds_at_carrying_capacity(
            a in 0.1f64..3.0,
            b in 1e-4f64..0.1,
            effect in -1.0f64..1.0,
        ) {
            let c = RuleCurve::new(
                PopulationId(0),
                ParamSource::Summary,
                a,
                b,
                effect,
                1000.0,
                10.0,
            )
            .unwrap();
            let k = c.carrying_capacity();
            if k > 0.0 {
                proptest::prop_assert!((c.recruits(k) - k).abs() < 1e-6 * k.max(1.0));
            }
            proptest::prop_assert_eq!(c.recruits(0.0), 0.0);
        }
    }

    #[test]
    fn zero_step_rejected() {
        assert!(RuleCurve::new(
            PopulationId(0),
            ParamSource::Summary,
            1.0,
            0.01,
            0.0,
            200.0,
            0.0
        )
        .is_err());
    }
}
