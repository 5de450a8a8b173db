use crate::errors::{ConfigurationError, ConvergenceFailure};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

mod bracketing;
mod iterative;

pub use bracketing::{Bisection, Brent, RegulaFalsi};
pub use iterative::{HybridNewton, LeastSquares, NewtonRaphson, Secant};

/// A scalar equation f(x) = 0 in one unknown.
pub trait ScalarEquation {
    fn value(&self, x: f64) -> f64;
    fn derivative(&self, x: f64) -> f64;
}

/// Where a root finder looks for the root. Bracketing methods use `[lower, upper]`, open
/// methods start from `initial_guess`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchRegion {
    pub lower: f64,
    pub upper: f64,
    pub initial_guess: f64,
}

/// The single capability every numerical method provides: find a root of a scalar equation.
pub trait RootFinder: Debug {
    fn method(&self) -> MethodId;

    fn find_root(
        &self,
        equation: &dyn ScalarEquation,
        region: &SearchRegion,
    ) -> Result<f64, ConvergenceFailure>;
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum MethodFamily {
    /// needs a sign change over a bracket
    Bracketing,
    /// iterates from an initial guess
    Open,
}

/// Identifies a root-finding method. The textual names accepted when parsing include the
/// names of the equivalent scipy routines.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum MethodId {
    #[strum(to_string = "bisection", serialize = "bisect")]
    Bisection,
    #[strum(to_string = "regula_falsi", serialize = "illinois")]
    RegulaFalsi,
    #[strum(to_string = "brent", serialize = "brentq")]
    Brent,
    #[strum(to_string = "newton_raphson", serialize = "newton")]
    NewtonRaphson,
    #[strum(to_string = "secant")]
    Secant,
    #[strum(to_string = "hybrid", serialize = "fsolve", serialize = "root")]
    Hybrid,
    #[strum(to_string = "least_squares", serialize = "minimize")]
    LeastSquares,
}

impl MethodId {
    pub fn parse(name: &str) -> Result<Self, ConfigurationError> {
        name.trim()
            .parse()
            .map_err(|_| ConfigurationError::UnknownMethod(name.to_string()))
    }

    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    pub fn family(&self) -> MethodFamily {
        match self {
            MethodId::Bisection | MethodId::RegulaFalsi | MethodId::Brent => {
                MethodFamily::Bracketing
            }
            MethodId::NewtonRaphson
            | MethodId::Secant
            | MethodId::Hybrid
            | MethodId::LeastSquares => MethodFamily::Open,
        }
    }

    pub fn root_finder(&self, settings: &SolverSettings) -> Box<dyn RootFinder> {
        match self {
            MethodId::Bisection => Box::new(Bisection::new(settings)),
            MethodId::RegulaFalsi => Box::new(RegulaFalsi::new(settings)),
            MethodId::Brent => Box::new(Brent::new(settings)),
            MethodId::NewtonRaphson => Box::new(NewtonRaphson::new(settings)),
            MethodId::Secant => Box::new(Secant::new(settings)),
            MethodId::Hybrid => Box::new(HybridNewton::new(settings)),
            MethodId::LeastSquares => Box::new(LeastSquares::new(settings)),
        }
    }
}

/// Convergence limits shared by every method.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    /// step/bracket width at which a method stops, in A
    pub tolerance: f64,
    /// largest residual accepted at a returned current, in A
    pub residual_tolerance: f64,
    /// iteration cap per voltage sample
    pub max_iterations: usize,
    /// bracketing methods search `[-f.I_sc, f.I_sc]`
    pub bracket_factor: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            residual_tolerance: 1e-6,
            max_iterations: 100,
            bracket_factor: 1.0,
        }
    }
}

impl SolverSettings {
    pub fn with_bracket_factor(self, bracket_factor: f64) -> Self {
        Self {
            bracket_factor,
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let positive = [
            ("tolerance", self.tolerance),
            ("residual_tolerance", self.residual_tolerance),
            ("bracket_factor", self.bracket_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.) {
                return Err(ConfigurationError::InvalidSolverSetting { name, value });
            }
        }
        if self.max_iterations == 0 {
            return Err(ConfigurationError::InvalidSolverSetting {
                name: "max_iterations",
                value: 0.,
            });
        }

        Ok(())
    }
}

/// Translate a failure reported by the `roots` crate.
fn search_failure(
    error: roots::SearchError,
    region: &SearchRegion,
    max_iterations: usize,
) -> ConvergenceFailure {
    match error {
        roots::SearchError::NoConvergency => ConvergenceFailure::IterationLimit(max_iterations),
        roots::SearchError::NoBracketing => ConvergenceFailure::NoSignChange {
            lower: region.lower,
            upper: region.upper,
        },
        roots::SearchError::ZeroDerivative => ConvergenceFailure::ZeroDerivative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    /// x^3 - 2x - 5, the classic Wallis example with its single real root near 2.0946
    pub(super) struct Wallis;

    impl ScalarEquation for Wallis {
        fn value(&self, x: f64) -> f64 {
            x.powi(3) - 2. * x - 5.
        }

        fn derivative(&self, x: f64) -> f64 {
            3. * x.powi(2) - 2.
        }
    }

    pub(super) const WALLIS_ROOT: f64 = 2.0945514815423265;

    #[rstest]
    fn should_find_wallis_root_with_every_method() {
        let settings = SolverSettings::default();
        let region = SearchRegion {
            lower: 1.5,
            upper: 3.,
            initial_guess: 3.,
        };

        for method in MethodId::all() {
            let root = method
                .root_finder(&settings)
                .find_root(&Wallis, &region)
                .unwrap_or_else(|e| panic!("{method} failed: {e}"));
            assert_relative_eq!(root, WALLIS_ROOT, max_relative = 1e-8);
        }
    }

    #[rstest]
    #[case("bisection", MethodId::Bisection)]
    #[case("bisect", MethodId::Bisection)]
    #[case("brentq", MethodId::Brent)]
    #[case("Brent", MethodId::Brent)]
    #[case("illinois", MethodId::RegulaFalsi)]
    #[case("newton", MethodId::NewtonRaphson)]
    #[case("fsolve", MethodId::Hybrid)]
    #[case("root", MethodId::Hybrid)]
    #[case("minimize", MethodId::LeastSquares)]
    #[case(" secant ", MethodId::Secant)]
    fn should_parse_method_names(#[case] name: &str, #[case] expected: MethodId) {
        assert_eq!(MethodId::parse(name).unwrap(), expected);
    }

    #[rstest]
    fn should_reject_unknown_method_name() {
        assert_eq!(
            MethodId::parse("golden"),
            Err(ConfigurationError::UnknownMethod("golden".to_string()))
        );
    }

    #[rstest]
    fn should_round_trip_display_names() {
        for method in MethodId::all() {
            assert_eq!(MethodId::parse(&method.to_string()).unwrap(), method);
        }
    }

    #[rstest]
    fn should_assign_method_families() {
        let bracketing = MethodId::all()
            .into_iter()
            .filter(|method| method.family() == MethodFamily::Bracketing)
            .collect::<Vec<_>>();
        assert_eq!(
            bracketing,
            vec![MethodId::Bisection, MethodId::RegulaFalsi, MethodId::Brent]
        );
    }

    #[rstest]
    fn should_build_root_finder_for_requested_method() {
        for method in MethodId::all() {
            assert_eq!(
                method.root_finder(&SolverSettings::default()).method(),
                method
            );
        }
    }

    #[rstest]
    #[case(SolverSettings { tolerance: 0., ..Default::default() }, "tolerance")]
    #[case(SolverSettings { residual_tolerance: -1., ..Default::default() }, "residual_tolerance")]
    #[case(SolverSettings { bracket_factor: f64::NAN, ..Default::default() }, "bracket_factor")]
    #[case(SolverSettings { max_iterations: 0, ..Default::default() }, "max_iterations")]
    fn should_reject_invalid_settings(#[case] settings: SolverSettings, #[case] setting: &str) {
        match settings.validate() {
            Err(ConfigurationError::InvalidSolverSetting { name, .. }) => assert_eq!(name, setting),
            other => panic!("expected invalid setting error, got {other:?}"),
        }
    }

    #[rstest]
    fn should_accept_default_settings() {
        assert!(SolverSettings::default().validate().is_ok());
    }
}
