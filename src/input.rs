use crate::core::diode_model::TemperatureCorrection;
use crate::core::parameters::ParameterSet;
use crate::core::solvers::SolverSettings;
use crate::errors::DomainError;
use serde::Deserialize;
use std::io::{BufReader, Read};

pub fn ingest_for_processing(json: impl Read) -> Result<ModelInput, anyhow::Error> {
    let reader = BufReader::new(json);

    let input: ModelInput = serde_json::from_reader(reader)?;

    Ok(input)
}

/// Everything a run can be configured with. Every section is optional. The panel falls back to
/// the reference 72-cell panel, the array to a single panel and the temperature correction
/// to the cubic form. Without a solver section each run uses its own default settings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct ModelInput {
    #[serde(default)]
    pub panel: PanelInput,
    #[serde(default)]
    pub array: ArrayLayout,
    #[serde(default)]
    pub temperature_correction: TemperatureCorrection,
    pub solver: Option<SolverSettings>,
}

/// Data sheet constants of one panel. Each field also accepts the conventional symbol as its
/// key, e.g. `I_sc` for `short_circuit_current`. The generated JSON schema only lists the
/// long names.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct PanelInput {
    /// A
    #[serde(alias = "I_sc")]
    pub short_circuit_current: Option<f64>,
    /// V
    #[serde(alias = "V_oc")]
    pub open_circuit_voltage: Option<f64>,
    #[serde(alias = "N_s")]
    pub cells_in_series: Option<u32>,
    /// ohm
    #[serde(alias = "R_s")]
    pub series_resistance: Option<f64>,
    /// ohm
    #[serde(alias = "R_sh")]
    pub shunt_resistance: Option<f64>,
    /// A/K
    #[serde(alias = "k_i")]
    pub current_temperature_coefficient: Option<f64>,
    /// K
    #[serde(alias = "T_n")]
    pub reference_temperature: Option<f64>,
    /// C
    #[serde(alias = "q")]
    pub electron_charge: Option<f64>,
    #[serde(alias = "n")]
    pub ideality_factor: Option<f64>,
    /// J/K
    #[serde(alias = "K")]
    pub boltzmann_constant: Option<f64>,
    /// eV
    #[serde(alias = "E_g0")]
    pub bandgap_energy: Option<f64>,
}

impl PanelInput {
    pub fn parameter_set(&self) -> Result<ParameterSet, DomainError> {
        let reference = ParameterSet::reference_panel();

        ParameterSet::new(
            self.short_circuit_current
                .unwrap_or(reference.short_circuit_current()),
            self.open_circuit_voltage
                .unwrap_or(reference.open_circuit_voltage()),
            self.cells_in_series.unwrap_or(reference.cells_in_series()),
            self.series_resistance
                .unwrap_or(reference.series_resistance()),
            self.shunt_resistance.unwrap_or(reference.shunt_resistance()),
            self.current_temperature_coefficient
                .unwrap_or(reference.current_temperature_coefficient()),
            self.reference_temperature
                .unwrap_or(reference.reference_temperature()),
            self.electron_charge.unwrap_or(reference.electron_charge()),
            self.ideality_factor.unwrap_or(reference.ideality_factor()),
            self.boltzmann_constant
                .unwrap_or(reference.boltzmann_constant()),
            self.bandgap_energy.unwrap_or(reference.bandgap_energy()),
        )
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub struct ArrayLayout {
    pub panels_in_series: u32,
    pub panels_in_parallel: u32,
}

impl Default for ArrayLayout {
    fn default() -> Self {
        Self {
            panels_in_series: 1,
            panels_in_parallel: 1,
        }
    }
}

impl ModelInput {
    /// Parameters of the whole configured array.
    pub fn parameter_set(&self) -> Result<ParameterSet, DomainError> {
        self.panel
            .parameter_set()?
            .for_array(self.array.panels_in_series, self.array.panels_in_parallel)
    }

    pub fn solver_settings_or(&self, default: SolverSettings) -> SolverSettings {
        self.solver.unwrap_or(default)
    }
}
