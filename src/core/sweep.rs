use crate::errors::ConfigurationError;

/// Evenly spaced voltages over `[0, end_voltage]`, both ends included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoltageSweep {
    end_voltage: f64,
    samples: usize,
}

impl VoltageSweep {
    pub fn new(end_voltage: f64, samples: usize) -> Result<Self, ConfigurationError> {
        if samples == 0 {
            return Err(ConfigurationError::NoSamples);
        }

        Ok(Self {
            end_voltage,
            samples,
        })
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn end_voltage(&self) -> f64 {
        self.end_voltage
    }

    /// Voltage of the sample at `index`. A single-sample sweep sits at 0 V and the last sample
    /// of a longer sweep is exactly `end_voltage`.
    pub fn voltage_at(&self, index: usize) -> f64 {
        match self.samples {
            1 => 0.,
            samples if index + 1 == samples => self.end_voltage,
            samples => self.end_voltage * index as f64 / (samples - 1) as f64,
        }
    }

    pub fn iter(&self) -> VoltageSweepIterator {
        VoltageSweepIterator {
            current_index: 0,
            sweep: *self,
        }
    }
}

impl IntoIterator for &VoltageSweep {
    type Item = SweepSample;
    type IntoIter = VoltageSweepIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepSample {
    pub index: usize,
    pub voltage: f64,
}

#[derive(Clone, Debug)]
pub struct VoltageSweepIterator {
    current_index: usize,
    sweep: VoltageSweep,
}

impl Iterator for VoltageSweepIterator {
    type Item = SweepSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index >= self.sweep.samples {
            return None;
        }
        let sample = SweepSample {
            index: self.current_index,
            voltage: self.sweep.voltage_at(self.current_index),
        };
        self.current_index += 1;

        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sweep.samples - self.current_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for VoltageSweepIterator {}
