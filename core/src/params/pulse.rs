use serde::{Deserialize, Serialize};

/// Highest polarization mode code the TCU accepts.
pub const MAX_POLARIZATION_MODE: u16 = 5;

/// One entry of the pulse block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub pulse_width_us: f64,
    /// Full repetition interval, inclusive of pre-pulse and pulse width.
    pub pri_us: f64,
    pub polarization_mode: u16,
    pub frequency_mhz: u32,
}

impl Pulse {
    pub fn new(pulse_width_us: f64, pri_us: f64, polarization_mode: u16, frequency_mhz: u32) -> Self {
        Self {
            pulse_width_us,
            pri_us,
            polarization_mode,
            frequency_mhz,
        }
    }

    /// Pulse repetition frequency in Hz for the authored PRI.
    pub fn prf_hz(&self) -> f64 {
        if self.pri_us > 0.0 {
            1_000_000.0 / self.pri_us
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prf_is_reciprocal_of_pri() {
        let pulse = Pulse::new(10.0, 500.0, 4, 8500);
        assert_eq!(pulse.prf_hz(), 2000.0);
    }

    #[test]
    fn prf_of_empty_pri_is_zero() {
        assert_eq!(Pulse::new(10.0, 0.0, 0, 1300).prf_hz(), 0.0);
    }
}
