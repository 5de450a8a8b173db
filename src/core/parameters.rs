use crate::core::units::{BOLTZMANN_CONSTANT, ELECTRON_CHARGE, STC_TEMPERATURE_K};
use crate::errors::DomainError;
use serde::Serialize;

// This module contains the physical and electrical constants of a PV panel (or an array of
// identical panels) as used by the single-diode five-parameter model.

const REFERENCE_SHORT_CIRCUIT_CURRENT: f64 = 9.35;
const REFERENCE_OPEN_CIRCUIT_VOLTAGE: f64 = 47.4;
const REFERENCE_CELLS_IN_SERIES: u32 = 72;
const REFERENCE_SERIES_RESISTANCE: f64 = 0.39;
const REFERENCE_SHUNT_RESISTANCE: f64 = 545.82;
const REFERENCE_CURRENT_TEMPERATURE_COEFFICIENT: f64 = 0.037;
const REFERENCE_IDEALITY_FACTOR: f64 = 1.0;
// silicon
const REFERENCE_BANDGAP_ENERGY: f64 = 1.1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParameterSet {
    short_circuit_current: f64,           // I_sc, A
    open_circuit_voltage: f64,            // V_oc, V
    cells_in_series: u32,                 // N_s
    series_resistance: f64,               // R_s, ohm
    shunt_resistance: f64,                // R_sh, ohm
    current_temperature_coefficient: f64, // k_i, A/K
    reference_temperature: f64,           // T_n, K
    electron_charge: f64,                 // q, C
    ideality_factor: f64,                 // n
    boltzmann_constant: f64,              // K, J/K
    bandgap_energy: f64,                  // E_g0, eV
}

impl ParameterSet {
    /// Construct a ParameterSet, checking that every constant is physically meaningful
    ///
    /// Arguments:
    /// * `short_circuit_current` - current at zero terminal voltage, in A
    /// * `open_circuit_voltage` - terminal voltage at zero current, in V
    /// * `cells_in_series` - number of cells connected in series
    /// * `series_resistance` - in ohm, may be zero
    /// * `shunt_resistance` - in ohm
    /// * `current_temperature_coefficient` - change of short-circuit current with temperature,
    ///                                       in A/K (signed)
    /// * `reference_temperature` - temperature at which the data sheet values apply, in K
    /// * `electron_charge` - in C
    /// * `ideality_factor` - diode ideality factor
    /// * `boltzmann_constant` - in J/K
    /// * `bandgap_energy` - bandgap of the cell material, in eV
    pub fn new(
        short_circuit_current: f64,
        open_circuit_voltage: f64,
        cells_in_series: u32,
        series_resistance: f64,
        shunt_resistance: f64,
        current_temperature_coefficient: f64,
        reference_temperature: f64,
        electron_charge: f64,
        ideality_factor: f64,
        boltzmann_constant: f64,
        bandgap_energy: f64,
    ) -> Result<Self, DomainError> {
        require_positive("short_circuit_current", short_circuit_current)?;
        require_positive("open_circuit_voltage", open_circuit_voltage)?;
        if cells_in_series < 1 {
            return Err(DomainError::InvalidParameter {
                name: "cells_in_series",
                value: cells_in_series as f64,
                requirement: "must be at least 1",
            });
        }
        if !(series_resistance.is_finite() && series_resistance >= 0.) {
            return Err(DomainError::InvalidParameter {
                name: "series_resistance",
                value: series_resistance,
                requirement: "must be finite and non-negative",
            });
        }
        require_positive("shunt_resistance", shunt_resistance)?;
        if !current_temperature_coefficient.is_finite() {
            return Err(DomainError::InvalidParameter {
                name: "current_temperature_coefficient",
                value: current_temperature_coefficient,
                requirement: "must be finite",
            });
        }
        require_positive("reference_temperature", reference_temperature)?;
        require_positive("electron_charge", electron_charge)?;
        require_positive("ideality_factor", ideality_factor)?;
        require_positive("boltzmann_constant", boltzmann_constant)?;
        require_positive("bandgap_energy", bandgap_energy)?;

        Ok(Self {
            short_circuit_current,
            open_circuit_voltage,
            cells_in_series,
            series_resistance,
            shunt_resistance,
            current_temperature_coefficient,
            reference_temperature,
            electron_charge,
            ideality_factor,
            boltzmann_constant,
            bandgap_energy,
        })
    }

    /// A 72-cell monocrystalline panel (9.35 A, 47.4 V) at a 298 K reference temperature.
    pub fn reference_panel() -> Self {
        Self {
            short_circuit_current: REFERENCE_SHORT_CIRCUIT_CURRENT,
            open_circuit_voltage: REFERENCE_OPEN_CIRCUIT_VOLTAGE,
            cells_in_series: REFERENCE_CELLS_IN_SERIES,
            series_resistance: REFERENCE_SERIES_RESISTANCE,
            shunt_resistance: REFERENCE_SHUNT_RESISTANCE,
            current_temperature_coefficient: REFERENCE_CURRENT_TEMPERATURE_COEFFICIENT,
            reference_temperature: STC_TEMPERATURE_K,
            electron_charge: ELECTRON_CHARGE,
            ideality_factor: REFERENCE_IDEALITY_FACTOR,
            boltzmann_constant: BOLTZMANN_CONSTANT,
            bandgap_energy: REFERENCE_BANDGAP_ENERGY,
        }
    }

    /// Parameters of an array of identical panels wired `panels_in_series` deep and
    /// `panels_in_parallel` wide. Series panels add voltage and cells, parallel strings add
    /// current; the resistances are kept per panel as in the single-panel model.
    pub fn for_array(
        &self,
        panels_in_series: u32,
        panels_in_parallel: u32,
    ) -> Result<Self, DomainError> {
        if panels_in_series == 0 || panels_in_parallel == 0 {
            return Err(DomainError::EmptyArray {
                series: panels_in_series,
                parallel: panels_in_parallel,
            });
        }

        Ok(Self {
            short_circuit_current: self.short_circuit_current * panels_in_parallel as f64,
            open_circuit_voltage: self.open_circuit_voltage * panels_in_series as f64,
            cells_in_series: self.cells_in_series * panels_in_series,
            ..*self
        })
    }

    pub fn short_circuit_current(&self) -> f64 {
        self.short_circuit_current
    }

    pub fn open_circuit_voltage(&self) -> f64 {
        self.open_circuit_voltage
    }

    pub fn cells_in_series(&self) -> u32 {
        self.cells_in_series
    }

    pub fn series_resistance(&self) -> f64 {
        self.series_resistance
    }

    pub fn shunt_resistance(&self) -> f64 {
        self.shunt_resistance
    }

    pub fn current_temperature_coefficient(&self) -> f64 {
        self.current_temperature_coefficient
    }

    pub fn reference_temperature(&self) -> f64 {
        self.reference_temperature
    }

    pub fn electron_charge(&self) -> f64 {
        self.electron_charge
    }

    pub fn ideality_factor(&self) -> f64 {
        self.ideality_factor
    }

    pub fn boltzmann_constant(&self) -> f64 {
        self.boltzmann_constant
    }

    pub fn bandgap_energy(&self) -> f64 {
        self.bandgap_energy
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::reference_panel()
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), DomainError> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(DomainError::InvalidParameter {
            name,
            value,
            requirement: "must be finite and greater than zero",
        })
    }
}
