// Synthetic I-V datasets over a grid of operating conditions, one curve per
// (temperature, irradiance) pair, for fitting and validating data-driven panel models.
use crate::core::curve::{Curve, CurveSolver};
use crate::core::diode_model::{derive_with_correction, OperatingCondition, TemperatureCorrection};
use crate::core::mpp::{extract, MppResult};
use crate::core::parameters::ParameterSet;
use crate::core::solvers::{MethodId, SolverSettings};
use crate::core::units::celsius_to_kelvin;
use crate::errors::{DomainError, PvModelError};
use itertools::iproduct;
use serde::Serialize;
use tracing::{info, warn};

const DEFAULT_DATASET_SAMPLES: usize = 1000;
// dataset curves must cover hot cells whose current exceeds the data sheet I_sc
const DEFAULT_DATASET_BRACKET_FACTOR: f64 = 2.0;

/// Cell temperatures 15 to 45 Celsius in steps of one degree.
pub fn default_temperatures_c() -> Vec<f64> {
    (15..=45).map(f64::from).collect()
}

/// Irradiances 300 to 1000 W/m2 in steps of 1 W/m2.
pub fn default_irradiances() -> Vec<f64> {
    (300..=1000).map(f64::from).collect()
}

/// One row of a dataset file. Unresolved samples carry NaN current and power.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DatasetRow {
    #[serde(rename = "T")]
    pub temperature: f64,
    #[serde(rename = "G")]
    pub irradiance: f64,
    #[serde(rename = "V")]
    pub voltage: f64,
    #[serde(rename = "I")]
    pub current: f64,
    #[serde(rename = "P")]
    pub power: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConditionCurve {
    pub temperature_c: f64,
    pub condition: OperatingCondition,
    pub curve: Curve,
    pub mpp: Option<MppResult>,
}

impl ConditionCurve {
    /// Identifies the condition in output file names, e.g. `G1000_T25`.
    pub fn location_key(&self) -> String {
        format!("G{}_T{}", self.condition.irradiance(), self.temperature_c)
    }

    pub fn rows(&self) -> impl Iterator<Item = DatasetRow> + '_ {
        rows(&self.condition, &self.curve)
    }
}

/// Rows of `curve` solved at `condition`, in ascending voltage order.
pub fn rows<'a>(
    condition: &'a OperatingCondition,
    curve: &'a Curve,
) -> impl Iterator<Item = DatasetRow> + 'a {
    curve.iter().map(|point| DatasetRow {
        temperature: condition.temperature(),
        irradiance: condition.irradiance(),
        voltage: point.voltage,
        current: point.current.unwrap_or(f64::NAN),
        power: point.power().unwrap_or(f64::NAN),
    })
}

#[derive(Clone, Debug)]
pub struct DatasetGenerator {
    params: ParameterSet,
    method: MethodId,
    samples: usize,
    settings: SolverSettings,
    temperature_correction: TemperatureCorrection,
}

impl DatasetGenerator {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            params,
            method: MethodId::Brent,
            samples: DEFAULT_DATASET_SAMPLES,
            settings: SolverSettings::default().with_bracket_factor(DEFAULT_DATASET_BRACKET_FACTOR),
            temperature_correction: Default::default(),
        }
    }

    pub fn with_method(self, method: MethodId) -> Self {
        Self { method, ..self }
    }

    pub fn with_samples(self, samples: usize) -> Self {
        Self { samples, ..self }
    }

    pub fn with_settings(self, settings: SolverSettings) -> Self {
        Self { settings, ..self }
    }

    pub fn with_temperature_correction(self, temperature_correction: TemperatureCorrection) -> Self {
        Self {
            temperature_correction,
            ..self
        }
    }

    /// Solve one curve per condition, temperature outermost. Temperatures are in Celsius.
    pub fn generate<'a>(
        &'a self,
        temperatures_c: &'a [f64],
        irradiances: &'a [f64],
    ) -> impl Iterator<Item = Result<ConditionCurve, PvModelError>> + 'a {
        iproduct!(temperatures_c, irradiances)
            .map(move |(&temperature_c, &irradiance)| {
                self.generate_condition(temperature_c, irradiance)
            })
    }

    pub fn generate_condition(
        &self,
        temperature_c: f64,
        irradiance: f64,
    ) -> Result<ConditionCurve, PvModelError> {
        let temperature = celsius_to_kelvin(temperature_c).map_err(DomainError::from)?;
        let model = derive_with_correction(
            &self.params,
            irradiance,
            temperature,
            self.temperature_correction,
        )?;
        let curve = CurveSolver::new(self.method, self.settings)?.solve(
            &model,
            self.params.open_circuit_voltage(),
            self.params.short_circuit_current(),
            self.samples,
        )?;

        let mpp = match extract(&curve) {
            Ok(mpp) => {
                info!(
                    irradiance,
                    temperature_c,
                    "maximum power point: Vmpp={}, Impp={}, Pmax={}",
                    mpp.voltage,
                    mpp.current,
                    mpp.power
                );
                Some(mpp)
            }
            Err(e) => {
                warn!(irradiance, temperature_c, "{e}");
                None
            }
        };

        Ok(ConditionCurve {
            temperature_c,
            condition: *model.condition(),
            curve,
            mpp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn generator() -> DatasetGenerator {
        DatasetGenerator::new(ParameterSet::reference_panel()).with_samples(200)
    }

    #[rstest]
    fn should_generate_conditions_temperature_outermost(generator: DatasetGenerator) {
        let keys = generator
            .generate(&[15., 45.], &[300., 1000.])
            .map(|condition| condition.unwrap().location_key())
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            vec!["G300_T15", "G1000_T15", "G300_T45", "G1000_T45"]
        );
    }

    #[rstest]
    fn should_convert_celsius_to_kelvin(generator: DatasetGenerator) {
        let condition = generator.generate_condition(25., 1000.).unwrap();

        let temperature = condition.condition.temperature();
        assert_relative_eq!(temperature, 298.15);
        assert!(condition
            .rows()
            .all(|row| row.temperature == temperature && row.irradiance == 1000.));
    }

    #[rstest]
    fn should_resolve_hot_curves_with_wide_bracket(generator: DatasetGenerator) {
        let condition = generator.generate_condition(45., 1000.).unwrap();

        assert_eq!(condition.curve.unresolved_count(), 0);
        assert!(condition.mpp.is_some());
        let first = condition.rows().next().unwrap();
        assert_eq!(first.voltage, 0.);
        assert!(first.current > 9.35);
    }

    #[rstest]
    fn should_write_nan_for_unresolved_samples(generator: DatasetGenerator) {
        let narrow = generator.with_settings(SolverSettings::default());
        let condition = narrow.generate_condition(45., 1000.).unwrap();

        let first = condition.rows().next().unwrap();
        assert!(first.current.is_nan());
        assert!(first.power.is_nan());
        assert_eq!(condition.rows().count(), 200);
    }

    #[rstest]
    fn should_reject_temperature_below_absolute_zero(generator: DatasetGenerator) {
        assert!(matches!(
            generator.generate_condition(-300., 1000.),
            Err(PvModelError::Domain(DomainError::BelowAbsoluteZero(_)))
        ));
    }

    #[rstest]
    fn should_cover_default_grid() {
        assert_eq!(default_temperatures_c().len(), 31);
        assert_eq!(default_irradiances().len(), 701);
    }
}
