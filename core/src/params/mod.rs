//! Authored TCU configuration.
//!
//! `TcuParameters` is the single value passed from the header parser to the
//! register builder. The authoring operations here are the only mutation
//! paths; the codec only ever borrows it.

pub mod pulse;

pub use pulse::{Pulse, MAX_POLARIZATION_MODE};

use crate::prelude::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};

/// Number of 10-byte pulse slots in the device's pulse register.
pub const MAX_PULSES: usize = 32;

/// Clock period used by the TCU gateware when none is configured.
pub const DEFAULT_CLOCK_PERIOD_NS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TcuParameters {
    pub clock_period_ns: u32,
    pub num_repeats: u64,
    pub pre_pulse_us: f64,
    pub x_amp_delay_us: f64,
    pub l_amp_delay_us: f64,
    pub rex_delay_us: f64,
    pub pri_pulse_width_us: f64,
    pub dac_delay: u32,
    pub adc_delay: u32,
    pub samples_per_pri: u32,
    pub waveform_index: u32,
    /// Positional: index `i` lands in slot `i` of the pulse register.
    pub pulses: Vec<Pulse>,
}

impl Default for TcuParameters {
    fn default() -> Self {
        Self {
            clock_period_ns: DEFAULT_CLOCK_PERIOD_NS,
            num_repeats: 0,
            pre_pulse_us: 0.0,
            x_amp_delay_us: 0.0,
            l_amp_delay_us: 0.0,
            rex_delay_us: 0.0,
            pri_pulse_width_us: 0.0,
            dac_delay: 0,
            adc_delay: 0,
            samples_per_pri: 0,
            waveform_index: 0,
            pulses: Vec::new(),
        }
    }
}

impl TcuParameters {
    /// Builds a parameter set from an existing pulse list.
    ///
    /// Fails when the list exceeds the device's pulse capacity.
    pub fn with_pulses(mut self, pulses: Vec<Pulse>) -> CodecResult<Self> {
        if pulses.len() > MAX_PULSES {
            return Err(CodecError::TooManyPulses(pulses.len()));
        }
        self.pulses = pulses;
        Ok(self)
    }

    pub fn num_pulses(&self) -> usize {
        self.pulses.len()
    }

    /// Total number of PRIs in one experiment.
    pub fn num_pris(&self) -> u64 {
        self.pulses.len() as u64 * self.num_repeats
    }

    pub fn add_pulse(&mut self, pulse: Pulse) -> CodecResult<()> {
        if self.pulses.len() >= MAX_PULSES {
            return Err(CodecError::TooManyPulses(self.pulses.len() + 1));
        }
        self.pulses.push(pulse);
        Ok(())
    }

    pub fn remove_pulse(&mut self, index: usize) -> CodecResult<Pulse> {
        if index >= self.pulses.len() {
            return Err(CodecError::PulseIndexOutOfRange {
                index,
                len: self.pulses.len(),
            });
        }
        Ok(self.pulses.remove(index))
    }

    pub fn set_pulse(&mut self, index: usize, pulse: Pulse) -> CodecResult<()> {
        let len = self.pulses.len();
        let slot = self
            .pulses
            .get_mut(index)
            .ok_or(CodecError::PulseIndexOutOfRange { index, len })?;
        *slot = pulse;
        Ok(())
    }

    /// Checks the invariants that do not depend on quantization.
    ///
    /// PRI containment is checked in ticks by the pulse block encoder, which
    /// is the form the device stores.
    pub fn validate(&self) -> CodecResult<()> {
        if self.clock_period_ns == 0 {
            return Err(CodecError::InvalidClockPeriod(self.clock_period_ns));
        }
        if self.pulses.len() > MAX_PULSES {
            return Err(CodecError::TooManyPulses(self.pulses.len()));
        }

        let durations = [
            self.pre_pulse_us,
            self.x_amp_delay_us,
            self.l_amp_delay_us,
            self.rex_delay_us,
            self.pri_pulse_width_us,
        ];
        let pulse_durations = self
            .pulses
            .iter()
            .flat_map(|pulse| [pulse.pulse_width_us, pulse.pri_us]);
        if let Some(value_us) = durations
            .into_iter()
            .chain(pulse_durations)
            .find(|value| !value.is_finite() || *value < 0.0)
        {
            return Err(CodecError::InvalidDuration { value_us });
        }

        for (index, pulse) in self.pulses.iter().enumerate() {
            if pulse.polarization_mode > MAX_POLARIZATION_MODE {
                return Err(CodecError::InvalidPolarizationMode {
                    index,
                    mode: pulse.polarization_mode,
                });
            }
        }
        Ok(())
    }
}
