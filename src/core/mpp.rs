use crate::core::curve::Curve;
use crate::errors::EmptyCurveError;
use serde::Serialize;

/// The maximum power point of a solved curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MppResult {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
}

/// Find the resolved sample with the highest power. When several samples share the maximum
/// the lowest-voltage one is returned.
pub fn extract(curve: &Curve) -> Result<MppResult, EmptyCurveError> {
    let mut best: Option<MppResult> = None;

    for point in curve.iter() {
        let (Some(current), Some(power)) = (point.current, point.power()) else {
            continue;
        };
        if best.map_or(true, |best| power > best.power) {
            best = Some(MppResult {
                voltage: point.voltage,
                current,
                power,
            });
        }
    }

    best.ok_or(EmptyCurveError {
        samples: curve.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::curve::{solve, CurvePoint};
    use crate::core::diode_model::derive;
    use crate::core::parameters::ParameterSet;
    use crate::core::solvers::{MethodId, SolverSettings};
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn curve_of(points: &[(f64, Option<f64>)]) -> Curve {
        points
            .iter()
            .map(|&(voltage, current)| CurvePoint { voltage, current })
            .collect()
    }

    fn reference_mpp(irradiance: f64, temperature: f64, samples: usize) -> MppResult {
        let panel = ParameterSet::reference_panel();
        let model = derive(&panel, irradiance, temperature).unwrap();
        let curve = solve(
            &model,
            panel.open_circuit_voltage(),
            panel.short_circuit_current(),
            samples,
            MethodId::Bisection,
            SolverSettings::default(),
        )
        .unwrap();

        extract(&curve).unwrap()
    }

    #[rstest]
    fn should_pick_highest_power_sample() {
        let curve = curve_of(&[(0., Some(9.)), (10., Some(8.)), (20., Some(5.)), (30., Some(1.))]);

        assert_eq!(
            extract(&curve).unwrap(),
            MppResult {
                voltage: 20.,
                current: 5.,
                power: 100.
            }
        );
    }

    #[rstest]
    fn should_keep_first_of_tied_maxima() {
        let curve = curve_of(&[(1., Some(4.)), (2., Some(2.)), (4., Some(1.))]);

        assert_eq!(extract(&curve).unwrap().voltage, 1.);
    }

    #[rstest]
    fn should_skip_unresolved_samples() {
        let curve = curve_of(&[(0., None), (10., Some(8.)), (20., None), (30., Some(1.))]);

        assert_eq!(extract(&curve).unwrap().voltage, 10.);
    }

    #[rstest]
    fn should_fail_without_resolved_samples() {
        let curve = curve_of(&[(0., None), (10., None)]);

        assert_eq!(extract(&curve), Err(EmptyCurveError { samples: 2 }));
        assert_eq!(
            extract(&Curve::default()),
            Err(EmptyCurveError { samples: 0 })
        );
    }

    #[rstest]
    fn should_find_reference_panel_mpp_at_standard_conditions() {
        let mpp = reference_mpp(1000., 298., 1000);

        assert!((38. ..=40.).contains(&mpp.voltage), "Vmpp was {}", mpp.voltage);
        assert_relative_eq!(mpp.power, 338.379, max_relative = 1e-4);
        assert_relative_eq!(mpp.power, mpp.voltage * mpp.current);
    }

    #[rstest]
    fn should_lose_power_at_half_irradiance() {
        let full = reference_mpp(1000., 298., 500);
        let half = reference_mpp(500., 298., 500);

        assert!(half.power < full.power);
        assert_relative_eq!(half.power, 169.80, max_relative = 1e-3);
    }
}
