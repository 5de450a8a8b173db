use super::{search_failure, MethodId, RootFinder, ScalarEquation, SearchRegion, SolverSettings};
use crate::errors::ConvergenceFailure;
use argmin::core::{CostFunction, Executor, State};
use argmin::solver::goldensectionsearch::GoldenSectionSearch;
use roots::{find_root_newton_raphson, find_root_secant, SimpleConvergency};

/// Newton-Raphson using the equation's own derivative.
#[derive(Clone, Debug)]
pub struct NewtonRaphson {
    tolerance: f64,
    max_iterations: usize,
}

impl NewtonRaphson {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

impl RootFinder for NewtonRaphson {
    fn method(&self) -> MethodId {
        MethodId::NewtonRaphson
    }

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        let mut convergency = SimpleConvergency {
            eps: self.tolerance,
            max_iter: self.max_iterations,
        };

        find_root_newton_raphson::<f64, _, _>(
            region.initial_guess,
            |x| equation.value(x),
            |x| equation.derivative(x),
            &mut convergency,
        )
        .map_err(|e| search_failure(e, region, self.max_iterations))
    }
}

/// Secant method. Needs no derivative; this is what scipy's `newton` does when it is not
/// given one. The second starting point follows scipy's choice of perturbation.
#[derive(Clone, Debug)]
pub struct Secant {
    tolerance: f64,
    max_iterations: usize,
}

impl Secant {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

const SECANT_PERTURBATION: f64 = 1e-4;

impl RootFinder for Secant {
    fn method(&self) -> MethodId {
        MethodId::Secant
    }

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        let first = region.initial_guess;
        let perturbation = if first >= 0. {
            SECANT_PERTURBATION
        } else {
            -SECANT_PERTURBATION
        };
        let second = first * (1. + SECANT_PERTURBATION) + perturbation;

        let mut convergency = SimpleConvergency {
            eps: self.tolerance,
            max_iter: self.max_iterations,
        };

        find_root_secant::<f64, _>(first, second, |x| equation.value(x), &mut convergency)
            .map_err(|e| search_failure(e, region, self.max_iterations))
    }
}

/// Newton iteration on a forward-difference derivative with a backtracking line search on
/// |f|. In one dimension this is what a general nonlinear system solver (MINPACK's hybrid
/// method behind scipy's `fsolve` and `root`) reduces to.
#[derive(Clone, Debug)]
pub struct HybridNewton {
    tolerance: f64,
    max_iterations: usize,
}

impl HybridNewton {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

// smallest fraction of the Newton step tried before the line search gives up
const MIN_STEP_FRACTION: f64 = 1. / 1024.;

impl RootFinder for HybridNewton {
    fn method(&self) -> MethodId {
        MethodId::Hybrid
    }

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        let mut x = region.initial_guess;
        let mut f_x = equation.value(x);

        for _ in 0..self.max_iterations {
            if !f_x.is_finite() {
                return Err(ConvergenceFailure::NonFinite);
            }
            if f_x.abs() < self.tolerance {
                return Ok(x);
            }

            let difference_step = f64::EPSILON.sqrt() * x.abs().max(1.);
            let slope = (equation.value(x + difference_step) - f_x) / difference_step;
            if slope == 0. || !slope.is_finite() {
                return Err(ConvergenceFailure::ZeroDerivative);
            }
            let newton_step = -f_x / slope;

            let mut fraction = 1.;
            let (x_next, f_next) = loop {
                let candidate = x + fraction * newton_step;
                let f_candidate = equation.value(candidate);
                if f_candidate.is_finite() && f_candidate.abs() < f_x.abs() {
                    break (candidate, f_candidate);
                }
                fraction /= 2.;
                if fraction < MIN_STEP_FRACTION {
                    // no decrease along the step: the difference slope is too poor to go on
                    return Err(ConvergenceFailure::IterationLimit(self.max_iterations));
                }
            };

            if is_close!(x_next, x, rel_tol = self.tolerance, abs_tol = self.tolerance) {
                return Ok(x_next);
            }
            x = x_next;
            f_x = f_next;
        }

        Err(ConvergenceFailure::IterationLimit(self.max_iterations))
    }
}

/// Minimises the squared residual by golden-section search (argmin), starting from the
/// initial guess. The search interval extends one bracket width beyond each end of the
/// region. Because f is monotonic over the region f^2 is unimodal there.
#[derive(Clone, Debug)]
pub struct LeastSquares {
    tolerance: f64,
    max_iterations: usize,
}

impl LeastSquares {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

struct SquaredResidual<'a> {
    equation: &'a dyn ScalarEquation,
}

impl CostFunction for SquaredResidual<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        Ok(self.equation.value(*x).powi(2))
    }
}

impl RootFinder for LeastSquares {
    fn method(&self) -> MethodId {
        MethodId::LeastSquares
    }

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        let (lower, upper) = (
            region.lower.min(region.upper),
            region.lower.max(region.upper),
        );
        let width = upper - lower;
        let (min_bound, max_bound) = (lower - width, upper + width);

        let solver = GoldenSectionSearch::new(min_bound, max_bound)
            .and_then(|solver| solver.with_tolerance(self.tolerance))
            .map_err(|e| ConvergenceFailure::Minimiser(e.to_string()))?;
        let result = Executor::new(SquaredResidual { equation }, solver)
            .configure(|state| {
                state
                    .param(region.initial_guess.clamp(min_bound, max_bound))
                    .max_iters(self.max_iterations as u64)
            })
            .run()
            .map_err(|e| ConvergenceFailure::Minimiser(e.to_string()))?;

        match result.state().get_best_param() {
            Some(best) if best.is_finite() => Ok(*best),
            _ => Err(ConvergenceFailure::NonFinite),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{Wallis, WALLIS_ROOT};
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    struct Flat;

    impl ScalarEquation for Flat {
        fn value(&self, _x: f64) -> f64 {
            1.
        }

        fn derivative(&self, _x: f64) -> f64 {
            0.
        }
    }

    #[fixture]
    fn region() -> SearchRegion {
        SearchRegion {
            lower: 1.5,
            upper: 3.,
            initial_guess: 3.,
        }
    }

    #[rstest]
    fn should_converge_from_either_side_of_root(region: SearchRegion) {
        let settings = SolverSettings::default();
        for initial_guess in [1.8, 2.5, 10.] {
            let region = SearchRegion {
                initial_guess,
                ..region
            };
            for finder in [
                Box::new(NewtonRaphson::new(&settings)) as Box<dyn RootFinder>,
                Box::new(Secant::new(&settings)),
                Box::new(HybridNewton::new(&settings)),
            ] {
                assert_relative_eq!(
                    finder.find_root(&Wallis, &region).unwrap(),
                    WALLIS_ROOT,
                    max_relative = 1e-8
                );
            }
        }
    }

    #[rstest]
    fn should_report_zero_derivative(region: SearchRegion) {
        let settings = SolverSettings::default();
        assert_eq!(
            HybridNewton::new(&settings).find_root(&Flat, &region),
            Err(ConvergenceFailure::ZeroDerivative)
        );
        assert!(NewtonRaphson::new(&settings).find_root(&Flat, &region).is_err());
    }

    #[rstest]
    fn should_stop_newton_at_iteration_cap(region: SearchRegion) {
        let settings = SolverSettings {
            max_iterations: 2,
            ..Default::default()
        };
        let region = SearchRegion {
            initial_guess: 100.,
            ..region
        };

        assert_eq!(
            HybridNewton::new(&settings).find_root(&Wallis, &region),
            Err(ConvergenceFailure::IterationLimit(2))
        );
        assert_eq!(
            NewtonRaphson::new(&settings).find_root(&Wallis, &region),
            Err(ConvergenceFailure::IterationLimit(2))
        );
    }

    #[rstest]
    fn should_minimise_squared_residual_to_root(region: SearchRegion) {
        let root = LeastSquares::new(&SolverSettings::default())
            .find_root(&Wallis, &region)
            .unwrap();

        assert_relative_eq!(root, WALLIS_ROOT, max_relative = 1e-8);
    }

    #[rstest]
    fn should_return_minimiser_even_without_root(region: SearchRegion) {
        // the caller checks the residual; the minimiser still reports its best point
        let best = LeastSquares::new(&SolverSettings::default())
            .find_root(&Flat, &region)
            .unwrap();

        assert!((0. ..=4.5).contains(&best));
    }
}
