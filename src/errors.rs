use thiserror::Error;

#[derive(Debug, Error)]
pub enum PvModelError {
    #[error("Input was outside the physical domain of the model: {0}")]
    Domain(#[from] DomainError),
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    EmptyCurve(#[from] EmptyCurveError),
}

/// An input value that the diode model cannot be evaluated at.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("temperature must be above absolute zero, got {0} K")]
    NonPositiveTemperature(f64),
    #[error("irradiance must be non-negative, got {0} W/m2")]
    NegativeIrradiance(f64),
    #[error("parameter '{name}' has invalid value {value}: {requirement}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        requirement: &'static str,
    },
    #[error("a panel array needs at least one panel in series and in parallel, got {series}x{parallel}")]
    EmptyArray { series: u32, parallel: u32 },
    #[error(transparent)]
    BelowAbsoluteZero(#[from] crate::core::units::BelowAbsoluteZeroError),
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("unknown root-finding method '{0}'")]
    UnknownMethod(String),
    #[error("a curve needs at least one voltage sample")]
    NoSamples,
    #[error("solver setting '{name}' has invalid value {value}")]
    InvalidSolverSetting { name: &'static str, value: f64 },
}

#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("no resolved sample to extract a maximum power point from (curve of {samples} samples)")]
pub struct EmptyCurveError {
    pub samples: usize,
}

/// Why a single root-find did not produce a current. Non-fatal: the curve solver records the
/// sample as unresolved and carries on.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConvergenceFailure {
    #[error("residual has the same sign at both ends of the bracket [{lower}, {upper}]")]
    NoSignChange { lower: f64, upper: f64 },
    #[error("no convergence within {0} iterations")]
    IterationLimit(usize),
    #[error("derivative vanished during iteration")]
    ZeroDerivative,
    #[error("iteration produced a non-finite value")]
    NonFinite,
    #[error("residual {residual:e} at the returned current exceeds tolerance")]
    ResidualTooLarge { residual: f64 },
    #[error("minimiser failed: {0}")]
    Minimiser(String),
}
