use crate::core::parameters::ParameterSet;
use crate::core::units::{STC_IRRADIANCE, STC_TEMPERATURE_K};
use crate::errors::DomainError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// This module contains the single-diode five-parameter equation of a PV panel.
//
// For an irradiance G and an absolute cell temperature T the model derives
//
//     I_rs = I_sc / (exp(q.V_oc / (n.N_s.K.T)) - 1)
//     I_o  = I_rs . (T/T_n)^3 . exp(q.E_g0.(1/T_n - 1/T) / (n.K))
//     I_ph = (I_sc + k_i.(T - T_n)) . G/1000
//
// and the implicit I-V relation
//
//     0 = I_ph - I_o.(exp(q.(V + I.R_s) / (n.K.N_s.T)) - 1) - (V + I.R_s)/R_sh - I

/// How the saturation and photogenerated currents are corrected for cell temperature.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TemperatureCorrection {
    /// `I_o` scales with `(T/T_n)^3` and `I_ph` is referred to `T_n`.
    #[default]
    Cubic,
    /// `I_o` scales with `T/T_n` and `I_ph` is referred to a fixed 298 K. Agrees with
    /// `Cubic` only at `T = T_n = 298 K`.
    Linear,
}

/// Irradiance and absolute cell temperature at which the panel operates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OperatingCondition {
    irradiance: f64,  // G, W/m2
    temperature: f64, // T, K
}

impl OperatingCondition {
    /// Arguments:
    /// * `irradiance` - in W/m2, not negative
    /// * `temperature` - cell temperature in K (convert from Celsius before calling)
    pub fn new(irradiance: f64, temperature: f64) -> Result<Self, DomainError> {
        if !(temperature.is_finite() && temperature > 0.) {
            return Err(DomainError::NonPositiveTemperature(temperature));
        }
        if !(irradiance.is_finite() && irradiance >= 0.) {
            return Err(DomainError::NegativeIrradiance(irradiance));
        }

        Ok(Self {
            irradiance,
            temperature,
        })
    }

    pub fn irradiance(&self) -> f64 {
        self.irradiance
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

/// Currents derived from a ParameterSet at one OperatingCondition, in A.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DerivedCoefficients {
    pub reverse_saturation_current: f64,
    pub diode_saturation_current: f64,
    pub photogenerated_current: f64,
}

impl DerivedCoefficients {
    pub fn calculate(
        params: &ParameterSet,
        condition: &OperatingCondition,
        correction: TemperatureCorrection,
    ) -> Self {
        let temperature = condition.temperature();
        let t_n = params.reference_temperature();
        let q = params.electron_charge();
        let k = params.boltzmann_constant();
        let n = params.ideality_factor();

        let reverse_saturation_current = params.short_circuit_current()
            / ((q * params.open_circuit_voltage()
                / (n * params.cells_in_series() as f64 * k * temperature))
                .exp()
                - 1.);

        let (temperature_ratio, photocurrent_reference_temperature) = match correction {
            TemperatureCorrection::Cubic => ((temperature / t_n).powi(3), t_n),
            TemperatureCorrection::Linear => (temperature / t_n, STC_TEMPERATURE_K),
        };

        let diode_saturation_current = reverse_saturation_current
            * temperature_ratio
            * (q * params.bandgap_energy() * (1. / t_n - 1. / temperature) / (n * k)).exp();

        let photogenerated_current = (params.short_circuit_current()
            + params.current_temperature_coefficient()
                * (temperature - photocurrent_reference_temperature))
            * (condition.irradiance() / STC_IRRADIANCE);

        Self {
            reverse_saturation_current,
            diode_saturation_current,
            photogenerated_current,
        }
    }
}

/// A residual of the implicit I-V relation, zero at the operating current for a given voltage.
pub trait ResidualFunction {
    fn residual(&self, voltage: f64, current: f64) -> f64;

    /// Partial derivative of the residual with respect to current. Defaults to a central
    /// finite difference.
    fn d_residual_d_current(&self, voltage: f64, current: f64) -> f64 {
        let step = f64::EPSILON.cbrt() * current.abs().max(1.);
        (self.residual(voltage, current + step) - self.residual(voltage, current - step))
            / (2. * step)
    }
}

/// Adapts any `Fn(voltage, current) -> residual` closure to a [`ResidualFunction`].
#[derive(Clone, Copy, Debug)]
pub struct ResidualFn<F>(pub F);

impl<F: Fn(f64, f64) -> f64> ResidualFunction for ResidualFn<F> {
    fn residual(&self, voltage: f64, current: f64) -> f64 {
        (self.0)(voltage, current)
    }
}

/// The diode equation of one panel (or array) at one operating condition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiodeModel {
    params: ParameterSet,
    condition: OperatingCondition,
    coefficients: DerivedCoefficients,
    // q / (n.K.N_s.T), in 1/V
    inverse_thermal_voltage: f64,
}

impl DiodeModel {
    pub fn new(
        params: ParameterSet,
        condition: OperatingCondition,
        correction: TemperatureCorrection,
    ) -> Self {
        let coefficients = DerivedCoefficients::calculate(&params, &condition, correction);
        let inverse_thermal_voltage = params.electron_charge()
            / (params.ideality_factor()
                * params.boltzmann_constant()
                * params.cells_in_series() as f64
                * condition.temperature());

        Self {
            params,
            condition,
            coefficients,
            inverse_thermal_voltage,
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn condition(&self) -> &OperatingCondition {
        &self.condition
    }

    pub fn coefficients(&self) -> &DerivedCoefficients {
        &self.coefficients
    }
}

impl ResidualFunction for DiodeModel {
    fn residual(&self, voltage: f64, current: f64) -> f64 {
        let DerivedCoefficients {
            diode_saturation_current: i_o,
            photogenerated_current: i_ph,
            ..
        } = self.coefficients;
        let junction_voltage = voltage + current * self.params.series_resistance();

        i_ph - i_o * ((self.inverse_thermal_voltage * junction_voltage).exp() - 1.)
            - junction_voltage / self.params.shunt_resistance()
            - current
    }

    fn d_residual_d_current(&self, voltage: f64, current: f64) -> f64 {
        let r_s = self.params.series_resistance();
        let junction_voltage = voltage + current * r_s;

        -self.coefficients.diode_saturation_current
            * self.inverse_thermal_voltage
            * r_s
            * (self.inverse_thermal_voltage * junction_voltage).exp()
            - r_s / self.params.shunt_resistance()
            - 1.
    }
}

/// Derive the residual function of `params` at irradiance `irradiance` (W/m2) and absolute
/// temperature `temperature` (K), using the cubic temperature correction.
pub fn derive(
    params: &ParameterSet,
    irradiance: f64,
    temperature: f64,
) -> Result<DiodeModel, DomainError> {
    derive_with_correction(params, irradiance, temperature, TemperatureCorrection::default())
}

pub fn derive_with_correction(
    params: &ParameterSet,
    irradiance: f64,
    temperature: f64,
    correction: TemperatureCorrection,
) -> Result<DiodeModel, DomainError> {
    let condition = OperatingCondition::new(irradiance, temperature)?;
    Ok(DiodeModel::new(*params, condition, correction))
}
