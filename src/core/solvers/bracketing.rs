use super::{search_failure, MethodId, RootFinder, ScalarEquation, SearchRegion, SolverSettings};
use crate::errors::ConvergenceFailure;
use roots::{find_root_brent, SimpleConvergency};

/// Evaluate the equation at both ends of the bracket, returning early if either end is
/// already a root.
enum BracketEnds {
    Root(f64),
    SignChange { f_lower: f64, f_upper: f64 },
}

fn check_bracket(
    equation: &dyn ScalarEquation,
    region: &SearchRegion,
) -> Result<BracketEnds, ConvergenceFailure> {
    let f_lower = equation.value(region.lower);
    let f_upper = equation.value(region.upper);
    if !(f_lower.is_finite() && f_upper.is_finite()) {
        return Err(ConvergenceFailure::NonFinite);
    }
    if f_lower == 0. {
        return Ok(BracketEnds::Root(region.lower));
    }
    if f_upper == 0. {
        return Ok(BracketEnds::Root(region.upper));
    }
    if f_lower.signum() == f_upper.signum() {
        return Err(ConvergenceFailure::NoSignChange {
            lower: region.lower,
            upper: region.upper,
        });
    }

    Ok(BracketEnds::SignChange { f_lower, f_upper })
}

/// Interval halving. Slow but cannot fail once the bracket has a sign change.
#[derive(Clone, Debug)]
pub struct Bisection {
    tolerance: f64,
    max_iterations: usize,
}

impl Bisection {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

impl RootFinder for Bisection {
    fn method(&self) -> MethodId {
        MethodId::Bisection
    }

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        let f_lower = match check_bracket(equation, region)? {
            BracketEnds::Root(root) => return Ok(root),
            BracketEnds::SignChange { f_lower, .. } => f_lower,
        };

        let (mut lower, mut upper, mut f_lower) = (region.lower, region.upper, f_lower);
        for _ in 0..self.max_iterations {
            let half_width = (upper - lower) / 2.;
            let midpoint = lower + half_width;
            let f_midpoint = equation.value(midpoint);
            if f_midpoint.is_nan() {
                return Err(ConvergenceFailure::NonFinite);
            }
            if f_midpoint == 0. || half_width.abs() < self.tolerance {
                return Ok(midpoint);
            }
            if f_midpoint.signum() == f_lower.signum() {
                lower = midpoint;
                f_lower = f_midpoint;
            } else {
                upper = midpoint;
            }
        }

        Err(ConvergenceFailure::IterationLimit(self.max_iterations))
    }
}

/// False position with the Illinois modification: when the same end of the bracket is
/// retained twice in a row its function value is halved, which stops the stagnation plain
/// regula falsi shows on convex or concave functions.
#[derive(Clone, Debug)]
pub struct RegulaFalsi {
    tolerance: f64,
    max_iterations: usize,
}

impl RegulaFalsi {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum RetainedEnd {
    Neither,
    Lower,
    Upper,
}

impl RootFinder for RegulaFalsi {
    fn method(&self) -> MethodId {
        MethodId::RegulaFalsi
    }

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        let (mut f_lower, mut f_upper) = match check_bracket(equation, region)? {
            BracketEnds::Root(root) => return Ok(root),
            BracketEnds::SignChange { f_lower, f_upper } => (f_lower, f_upper),
        };

        let (mut lower, mut upper) = (region.lower, region.upper);
        let mut retained = RetainedEnd::Neither;
        let mut previous: Option<f64> = None;

        for _ in 0..self.max_iterations {
            let estimate = (f_lower * upper - f_upper * lower) / (f_lower - f_upper);
            let f_estimate = equation.value(estimate);
            if !f_estimate.is_finite() {
                return Err(ConvergenceFailure::NonFinite);
            }
            let converged = previous.is_some_and(|previous| {
                is_close!(estimate, previous, rel_tol = 0., abs_tol = self.tolerance)
            });
            if f_estimate == 0. || converged || (upper - lower).abs() < self.tolerance {
                return Ok(estimate);
            }

            if f_estimate.signum() == f_upper.signum() {
                upper = estimate;
                f_upper = f_estimate;
                if retained == RetainedEnd::Lower {
                    f_lower /= 2.;
                }
                retained = RetainedEnd::Lower;
            } else {
                lower = estimate;
                f_lower = f_estimate;
                if retained == RetainedEnd::Upper {
                    f_upper /= 2.;
                }
                retained = RetainedEnd::Upper;
            }
            previous = Some(estimate);
        }

        Err(ConvergenceFailure::IterationLimit(self.max_iterations))
    }
}

/// Brent's method (inverse quadratic interpolation guarded by bisection) from the `roots`
/// crate, the equivalent of scipy's `brentq`.
#[derive(Clone, Debug)]
pub struct Brent {
    tolerance: f64,
    max_iterations: usize,
}

impl Brent {
    pub fn new(settings: &SolverSettings) -> Self {
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
        }
    }
}

impl RootFinder for Brent {
    fn method(&self) -> MethodId {
        MethodId::Brent
    }

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure> {
        if let BracketEnds::Root(root) = check_bracket(equation, region)? {
            return Ok(root);
        }

        let mut convergency = SimpleConvergency {
            eps: self.tolerance,
            max_iter: self.max_iterations,
        };

        find_root_brent::<f64, _>(
            region.lower.min(region.upper),
            region.lower.max(region.upper),
            |x| equation.value(x),
            &mut convergency,
        )
        .map_err(|e| search_failure(e, region, self.max_iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{Wallis, WALLIS_ROOT};
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    struct Linear {
        slope: f64,
        intercept: f64,
    }

    impl ScalarEquation for Linear {
        fn value(&self, x: f64) -> f64 {
            self.slope * x + self.intercept
        }

        fn derivative(&self, _x: f64) -> f64 {
            self.slope
        }
    }

    #[fixture]
    fn settings() -> SolverSettings {
        SolverSettings::default()
    }

    fn bracketing_finders(settings: &SolverSettings) -> Vec<Box<dyn RootFinder>> {
        vec![
            Box::new(Bisection::new(settings)),
            Box::new(RegulaFalsi::new(settings)),
            Box::new(Brent::new(settings)),
        ]
    }

    #[rstest]
    fn should_report_missing_sign_change(settings: SolverSettings) {
        let region = SearchRegion {
            lower: 3.,
            upper: 4.,
            initial_guess: 3.,
        };
        for finder in bracketing_finders(&settings) {
            assert_eq!(
                finder.find_root(&Wallis, &region),
                Err(ConvergenceFailure::NoSignChange {
                    lower: 3.,
                    upper: 4.
                }),
                "{:?} should not find a root without a sign change",
                finder.method()
            );
        }
    }

    #[rstest]
    fn should_return_bracket_end_when_it_is_a_root(settings: SolverSettings) {
        let equation = Linear {
            slope: -1.,
            intercept: 2.,
        };
        let region = SearchRegion {
            lower: -2.,
            upper: 2.,
            initial_guess: 0.,
        };
        for finder in bracketing_finders(&settings) {
            assert_eq!(finder.find_root(&equation, &region), Ok(2.));
        }
    }

    #[rstest]
    fn should_accept_bracket_in_either_orientation(settings: SolverSettings) {
        let region = SearchRegion {
            lower: 3.,
            upper: 1.5,
            initial_guess: 3.,
        };
        for finder in bracketing_finders(&settings) {
            assert_relative_eq!(
                finder.find_root(&Wallis, &region).unwrap(),
                WALLIS_ROOT,
                max_relative = 1e-8
            );
        }
    }

    #[rstest]
    fn should_stop_bisection_at_iteration_cap() {
        let settings = SolverSettings {
            max_iterations: 5,
            ..Default::default()
        };
        let region = SearchRegion {
            lower: 1.5,
            upper: 3.,
            initial_guess: 3.,
        };

        assert_eq!(
            Bisection::new(&settings).find_root(&Wallis, &region),
            Err(ConvergenceFailure::IterationLimit(5))
        );
    }

    #[rstest]
    fn should_converge_regula_falsi_on_strongly_curved_function(settings: SolverSettings) {
        // plain false position keeps the left end fixed here and crawls
        let exponential = ExpMinusTen;
        let region = SearchRegion {
            lower: 0.,
            upper: 10.,
            initial_guess: 10.,
        };

        assert_relative_eq!(
            RegulaFalsi::new(&settings)
                .find_root(&exponential, &region)
                .unwrap(),
            10_f64.ln(),
            max_relative = 1e-9
        );
    }

    struct ExpMinusTen;

    impl ScalarEquation for ExpMinusTen {
        fn value(&self, x: f64) -> f64 {
            x.exp() - 10.
        }

        fn derivative(&self, x: f64) -> f64 {
            x.exp()
        }
    }

    #[rstest]
    fn should_flag_non_finite_bracket_ends(settings: SolverSettings) {
        let region = SearchRegion {
            lower: 0.,
            upper: 1000.,
            initial_guess: 0.,
        };
        assert_eq!(
            Bisection::new(&settings).find_root(&ExpMinusTen, &region),
            Err(ConvergenceFailure::NonFinite)
        );
    }
}
