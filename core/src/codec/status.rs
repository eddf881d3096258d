use crate::codec::registers::Register;
use crate::codec::word::decode;
use crate::prelude::{CodecError, CodecResult, Endianness};
use serde::{Deserialize, Serialize};
use std::fmt;

const REPEATS_COMPLETED: u16 = 1 << 0;
const DIGITISING: u16 = 1 << 3;
const PRI: u16 = 1 << 4;
const PULSE_COMPLETED: u16 = 1 << 5;
/// Tied high by the gateware; a clear bit means the register is not live.
const PRESENT: u16 = 1 << 6;
const GPSDO_TRIGGER: u16 = 1 << 7;

const FLAGS: [(u16, &str); 6] = [
    (REPEATS_COMPLETED, "repeats completed"),
    (DIGITISING, "digitising"),
    (PRI, "pri"),
    (PULSE_COMPLETED, "pulse completed"),
    (PRESENT, "present"),
    (GPSDO_TRIGGER, "gpsdo trigger"),
];

/// Decoded `status` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TcuStatus {
    pub bits: u16,
}

impl TcuStatus {
    pub fn from_bits(bits: u16) -> Self {
        Self { bits }
    }

    fn has(self, flag: u16) -> bool {
        self.bits & flag != 0
    }

    /// Every pulse of the experiment has been repeated `num_repeats` times.
    pub fn repeats_completed(self) -> bool {
        self.has(REPEATS_COMPLETED)
    }

    pub fn digitising(self) -> bool {
        self.has(DIGITISING)
    }

    pub fn pri(self) -> bool {
        self.has(PRI)
    }

    pub fn pulse_completed(self) -> bool {
        self.has(PULSE_COMPLETED)
    }

    pub fn present(self) -> bool {
        self.has(PRESENT)
    }

    /// Trigger seen on the GPSDO input.
    pub fn gpsdo_triggered(self) -> bool {
        self.has(GPSDO_TRIGGER)
    }
}

impl fmt::Display for TcuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = FLAGS
            .iter()
            .filter(|(flag, _)| self.has(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "0x{:04x} (no flags)", self.bits)
        } else {
            write!(f, "0x{:04x} ({})", self.bits, set.join(", "))
        }
    }
}

/// Decodes the raw `status` register bytes.
pub fn decode_status(bytes: &[u8], endianness: Endianness) -> CodecResult<TcuStatus> {
    let width = Register::Status.capacity();
    if bytes.len() != width {
        return Err(CodecError::LengthMismatch {
            register: Register::Status.name().to_string(),
            expected: width,
            actual: bytes.len(),
        });
    }
    let bits = decode(bytes, endianness)?;
    Ok(TcuStatus::from_bits(bits as u16))
}
