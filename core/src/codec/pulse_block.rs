use crate::codec::quantize::ticks;
use crate::codec::word::{decode, encode, RegisterWord};
use crate::params::Pulse;
use crate::prelude::{CodecError, CodecResult, Endianness};
use serde::{Deserialize, Serialize};

/// Bytes occupied by one pulse in the pulse register.
pub const PULSE_SLOT_BYTES: usize = 10;

const PULSE_WIDTH_BYTES: usize = 2;
const PRI_OFFSET_BYTES: usize = 4;
const MODE_BYTES: usize = 2;
const FREQUENCY_BYTES: usize = 2;

/// Tick-domain view of one pulse slot, as the device stores it plus the
/// reconstructed PRI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseTicks {
    pub pulse_width_ticks: u64,
    pub pri_offset_ticks: u64,
    /// `pri_offset_ticks + pre_pulse_ticks + pulse_width_ticks`.
    pub pri_ticks: u64,
    pub polarization_mode: u64,
    pub frequency_mhz: u64,
}

impl PulseTicks {
    /// Quantizes an authored pulse, deriving the stored PRI offset.
    pub fn quantize(
        index: usize,
        pulse: &Pulse,
        pre_pulse_ticks: u64,
        clock_period_ns: u32,
    ) -> CodecResult<Self> {
        let pulse_width_ticks = ticks(pulse.pulse_width_us, clock_period_ns)?;
        let pri_ticks = ticks(pulse.pri_us, clock_period_ns)?;
        let offset = pri_ticks as i128 - pre_pulse_ticks as i128 - pulse_width_ticks as i128;
        if offset < 0 {
            return Err(CodecError::NegativePriOffset {
                index,
                offset_ticks: offset.max(i64::MIN as i128) as i64,
            });
        }

        Ok(Self {
            pulse_width_ticks,
            pri_offset_ticks: offset as u64,
            pri_ticks,
            polarization_mode: u64::from(pulse.polarization_mode),
            frequency_mhz: u64::from(pulse.frequency_mhz),
        })
    }

    /// PRF in Hz derived from the effective PRI.
    pub fn prf_hz(&self, clock_period_ns: u32) -> f64 {
        let pri_ns = self.pri_ticks as f64 * f64::from(clock_period_ns);
        if pri_ns > 0.0 {
            1e9 / pri_ns
        } else {
            0.0
        }
    }
}

/// Splits one full slot into pulse width, PRI offset, mode and frequency bytes.
pub fn split_slot(slot: &[u8; PULSE_SLOT_BYTES]) -> [&[u8]; 4] {
    let (width, rest) = slot.split_at(PULSE_WIDTH_BYTES);
    let (offset, rest) = rest.split_at(PRI_OFFSET_BYTES);
    let (mode, frequency) = rest.split_at(MODE_BYTES);
    [width, offset, mode, frequency]
}

/// Iterates over the populated slots of a pulse block.
///
/// Fails when the block does not hold `count` whole slots.
pub fn slots(
    bytes: &[u8],
    count: usize,
) -> CodecResult<impl Iterator<Item = &[u8; PULSE_SLOT_BYTES]>> {
    let needed = count * PULSE_SLOT_BYTES;
    if bytes.len() < needed {
        return Err(CodecError::LengthMismatch {
            register: "pulses".into(),
            expected: needed,
            actual: bytes.len(),
        });
    }
    Ok(bytes[..needed]
        .chunks_exact(PULSE_SLOT_BYTES)
        .filter_map(|slot| <&[u8; PULSE_SLOT_BYTES]>::try_from(slot).ok()))
}

fn field_name(index: usize, field: &str) -> String {
    format!("pulses[{}].{}", index, field)
}

/// Encodes one slot: pulse width, PRI offset, mode, frequency.
pub fn encode_slot(
    index: usize,
    pulse: &PulseTicks,
    endianness: Endianness,
) -> CodecResult<RegisterWord> {
    let fields = [
        ("pulse_width", pulse.pulse_width_ticks, PULSE_WIDTH_BYTES),
        ("pri_offset", pulse.pri_offset_ticks, PRI_OFFSET_BYTES),
        ("mode", pulse.polarization_mode, MODE_BYTES),
        ("frequency", pulse.frequency_mhz, FREQUENCY_BYTES),
    ];

    let mut slot = RegisterWord::default();
    for (name, value, width) in fields {
        slot.extend(&encode(&field_name(index, name), value, width, endianness)?);
    }
    Ok(slot)
}

/// Quantizes and encodes the whole pulse list in order.
pub fn encode_pulses(
    pulses: &[Pulse],
    pre_pulse_ticks: u64,
    clock_period_ns: u32,
    endianness: Endianness,
) -> CodecResult<RegisterWord> {
    let mut block = RegisterWord::default();
    for (index, pulse) in pulses.iter().enumerate() {
        let quantized = PulseTicks::quantize(index, pulse, pre_pulse_ticks, clock_period_ns)?;
        block.extend(&encode_slot(index, &quantized, endianness)?);
    }
    Ok(block)
}

/// Decodes the first `count` slots of a pulse block.
///
/// The device register may be longer than the populated slots; trailing
/// bytes are ignored.
pub fn decode_pulses(
    bytes: &[u8],
    count: usize,
    pre_pulse_ticks: u64,
    endianness: Endianness,
) -> CodecResult<Vec<PulseTicks>> {
    slots(bytes, count)?
        .map(|slot| {
            let [width, offset, mode, frequency] = split_slot(slot);
            let pulse_width_ticks = decode(width, endianness)?;
            let pri_offset_ticks = decode(offset, endianness)?;
            Ok(PulseTicks {
                pulse_width_ticks,
                pri_offset_ticks,
                pri_ticks: pri_offset_ticks + pre_pulse_ticks + pulse_width_ticks,
                polarization_mode: decode(mode, endianness)?,
                frequency_mhz: decode(frequency, endianness)?,
            })
        })
        .collect()
}
