use crate::core::diode_model::ResidualFunction;
use crate::core::solvers::{
    MethodFamily, MethodId, RootFinder, ScalarEquation, SearchRegion, SolverSettings,
};
use crate::core::sweep::VoltageSweep;
use crate::errors::{ConfigurationError, ConvergenceFailure};
use serde::Serialize;
use tracing::{debug, warn};

/// One solved sample of an I-V curve. `current` is `None` when the root finder could not
/// resolve the operating current at this voltage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CurvePoint {
    pub voltage: f64,
    pub current: Option<f64>,
}

impl CurvePoint {
    pub fn power(&self) -> Option<f64> {
        self.current.map(|current| self.voltage * current)
    }

    pub fn is_resolved(&self) -> bool {
        self.current.is_some()
    }
}

/// Samples in ascending voltage order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.points.iter().filter(|point| point.is_resolved()).count()
    }

    pub fn unresolved_count(&self) -> usize {
        self.len() - self.resolved_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurvePoint> {
        self.points.iter()
    }
}

impl FromIterator<CurvePoint> for Curve {
    fn from_iter<T: IntoIterator<Item = CurvePoint>>(iter: T) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// The residual at one fixed voltage, seen as an equation in current alone.
struct AtVoltage<'a, R: ResidualFunction + ?Sized> {
    residual: &'a R,
    voltage: f64,
}

impl<R: ResidualFunction + ?Sized> ScalarEquation for AtVoltage<'_, R> {
    fn value(&self, current: f64) -> f64 {
        self.residual.residual(self.voltage, current)
    }

    fn derivative(&self, current: f64) -> f64 {
        self.residual.d_residual_d_current(self.voltage, current)
    }
}

/// Solves an I-V curve with one chosen root-finding method. Holds only configuration, so
/// repeated solves with the same inputs give identical curves.
#[derive(Debug)]
pub struct CurveSolver {
    root_finder: Box<dyn RootFinder>,
    settings: SolverSettings,
}

impl CurveSolver {
    pub fn new(method: MethodId, settings: SolverSettings) -> Result<Self, ConfigurationError> {
        settings.validate()?;

        Ok(Self {
            root_finder: method.root_finder(&settings),
            settings,
        })
    }

    pub fn method(&self) -> MethodId {
        self.root_finder.method()
    }

    /// Solve for the current at `samples` evenly spaced voltages over
    /// `[0, open_circuit_voltage]`.
    ///
    /// Bracketing methods search `[-f.I_sc, f.I_sc]` (f being the configured bracket
    /// factor); open methods start from `I_sc`. Samples that do not converge, or whose
    /// residual is not within the residual tolerance, are left unresolved.
    pub fn solve<R: ResidualFunction + ?Sized>(
        &self,
        residual: &R,
        open_circuit_voltage: f64,
        short_circuit_current: f64,
        samples: usize,
    ) -> Result<Curve, ConfigurationError> {
        let sweep = VoltageSweep::new(open_circuit_voltage, samples)?;
        let half_width = self.settings.bracket_factor * short_circuit_current.abs();
        let region = SearchRegion {
            lower: -half_width,
            upper: half_width,
            initial_guess: short_circuit_current,
        };

        let curve = sweep
            .iter()
            .map(|sample| {
                let equation = AtVoltage {
                    residual,
                    voltage: sample.voltage,
                };
                let current = match self.solve_sample(&equation, &region) {
                    Ok(current) => Some(current),
                    Err(failure) => {
                        debug!(
                            method = %self.method(),
                            voltage = sample.voltage,
                            "sample unresolved: {failure}"
                        );
                        None
                    }
                };
                CurvePoint {
                    voltage: sample.voltage,
                    current,
                }
            })
            .collect::<Curve>();

        let unresolved = curve.unresolved_count();
        if unresolved > 0 {
            warn!(
                method = %self.method(),
                family = %self.method().family(),
                unresolved,
                samples,
                "some voltage samples did not resolve to a current"
            );
        }

        Ok(curve)
    }

    fn solve_sample(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        let current = self.root_finder.find_root(equation, region)?;
        if !current.is_finite() {
            return Err(ConvergenceFailure::NonFinite);
        }

        // the minimiser and the open methods can stop at a point that is not a root
        let residual = equation.value(current);
        if !(residual.abs() <= self.settings.residual_tolerance) {
            return Err(ConvergenceFailure::ResidualTooLarge { residual });
        }
        if self.method().family() == MethodFamily::Bracketing
            && !(region.lower..=region.upper).contains(&current)
        {
            return Err(ConvergenceFailure::NoSignChange {
                lower: region.lower,
                upper: region.upper,
            });
        }

        Ok(current)
    }
}

/// Solve a curve in one call; see [`CurveSolver::solve`].
pub fn solve<R: ResidualFunction + ?Sized>(
    residual: &R,
    open_circuit_voltage: f64,
    short_circuit_current: f64,
    samples: usize,
    method: MethodId,
    settings: SolverSettings,
) -> Result<Curve, ConfigurationError> {
    CurveSolver::new(method, settings)?.solve(
        residual,
        open_circuit_voltage,
        short_circuit_current,
        samples,
    )
}
