use thiserror::Error;

/// Elementary charge, in C, as carried by the reference panel data sheet model
pub const ELECTRON_CHARGE: f64 = 1.60217646e-19;
/// Boltzmann constant, in J/K
pub const BOLTZMANN_CONSTANT: f64 = 1.3806503e-23;
/// Irradiance at standard test conditions, in W/m2
pub const STC_IRRADIANCE: f64 = 1000.;
/// Cell temperature at standard test conditions, in K
pub const STC_TEMPERATURE_K: f64 = 298.;
pub const KELVIN_OFFSET: f64 = 273.15;

pub fn celsius_to_kelvin(temp_c: f64) -> Result<f64, BelowAbsoluteZeroError> {
    if temp_c < -KELVIN_OFFSET {
        Err(BelowAbsoluteZeroError::from_c(temp_c))
    } else {
        Ok(temp_c + KELVIN_OFFSET)
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("A temperature of {k}ºK/{}ºC was encountered, which is less than absolute zero", k - KELVIN_OFFSET)]
pub struct BelowAbsoluteZeroError {
    k: f64,
}

impl BelowAbsoluteZeroError {
    fn from_c(c: f64) -> Self {
        Self { k: c + KELVIN_OFFSET }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(25.0, 298.15)]
    #[case(0.0, 273.15)]
    #[case(-273.15, 0.0)]
    fn should_convert_celsius_to_kelvin(#[case] temp_c: f64, #[case] expected_k: f64) {
        assert_relative_eq!(celsius_to_kelvin(temp_c).unwrap(), expected_k);
    }

    #[rstest]
    fn should_reject_temperatures_below_absolute_zero() {
        assert_eq!(
            celsius_to_kelvin(-300.).unwrap_err(),
            BelowAbsoluteZeroError::from_c(-300.)
        );
        assert!(celsius_to_kelvin(-273.16).is_err());
    }
}
