use crate::codec::pulse_block::{decode_pulses, encode_pulses, PulseTicks, PULSE_SLOT_BYTES};
use crate::codec::quantize::ticks;
use crate::codec::word::{decode, encode, RegisterWord};
use crate::params::{TcuParameters, MAX_PULSES};
use crate::prelude::{CodecError, CodecResult, Endianness};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Memory-mapped registers written when configuring the TCU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    NumPulses,
    NumRepeats,
    XAmpDelay,
    LAmpDelay,
    RexDelay,
    PriPulseWidth,
    PrePulse,
    Pulses,
    /// Read-only flag word reported by the gateware.
    Status,
}

impl Register {
    /// Write order used by the controller; the pulse block goes first so the
    /// counters never reference unwritten slots.
    pub const ALL: [Register; 8] = [
        Register::Pulses,
        Register::NumRepeats,
        Register::NumPulses,
        Register::XAmpDelay,
        Register::LAmpDelay,
        Register::RexDelay,
        Register::PriPulseWidth,
        Register::PrePulse,
    ];

    /// Registers the controller may read but never writes.
    pub const READ_ONLY: [Register; 1] = [Register::Status];

    pub fn name(self) -> &'static str {
        match self {
            Register::NumPulses => "num_pulses",
            Register::NumRepeats => "num_repeats",
            Register::XAmpDelay => "x_amp_delay",
            Register::LAmpDelay => "l_amp_delay",
            Register::RexDelay => "rex_delay",
            Register::PriPulseWidth => "pri_pulse_width",
            Register::PrePulse => "pre_pulse",
            Register::Pulses => "pulses",
            Register::Status => "status",
        }
    }

    /// Fixed width in bytes. The pulse block has none; see [`Register::capacity`].
    pub fn width(self) -> Option<usize> {
        match self {
            Register::NumPulses
            | Register::XAmpDelay
            | Register::LAmpDelay
            | Register::RexDelay
            | Register::PrePulse
            | Register::Status => Some(2),
            Register::NumRepeats | Register::PriPulseWidth => Some(4),
            Register::Pulses => None,
        }
    }

    /// Largest number of bytes the device register holds.
    pub fn capacity(self) -> usize {
        self.width().unwrap_or(MAX_PULSES * PULSE_SLOT_BYTES)
    }

    pub fn is_writable(self) -> bool {
        !Register::READ_ONLY.contains(&self)
    }

    pub fn from_name(name: &str) -> CodecResult<Self> {
        Register::ALL
            .into_iter()
            .chain(Register::READ_ONLY)
            .find(|register| register.name() == name)
            .ok_or_else(|| CodecError::UnknownRegister(name.to_string()))
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Register name to encoded bytes. Iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterImage {
    entries: BTreeMap<Register, RegisterWord>,
}

impl RegisterImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, register: Register, word: RegisterWord) {
        self.entries.insert(register, word);
    }

    pub fn get(&self, register: Register) -> Option<&RegisterWord> {
        self.entries.get(&register)
    }

    pub fn require(&self, register: Register) -> CodecResult<&RegisterWord> {
        self.get(register)
            .ok_or_else(|| CodecError::MissingRegister(register.name().to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in controller write order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, &RegisterWord)> {
        Register::ALL
            .into_iter()
            .filter_map(|register| self.entries.get(&register).map(|word| (register, word)))
    }

    /// Builds an image from raw readback keyed by register name.
    pub fn from_raw<I, S>(raw: I) -> CodecResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let mut image = Self::new();
        for (name, bytes) in raw {
            let register = Register::from_name(name.as_ref())?;
            image.insert(register, RegisterWord::from_bytes(bytes));
        }
        Ok(image)
    }

    /// Register name to HDL literal, for reports.
    pub fn to_literals(&self) -> BTreeMap<&'static str, String> {
        self.entries
            .iter()
            .map(|(register, word)| (register.name(), word.to_hdl_literal()))
            .collect()
    }
}

/// Values decoded from a register image, in ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readback {
    pub num_pulses: u64,
    pub num_repeats: u64,
    pub x_amp_delay_ticks: u64,
    pub l_amp_delay_ticks: u64,
    pub rex_delay_ticks: u64,
    pub pri_pulse_width_ticks: u64,
    pub pre_pulse_ticks: u64,
    pub pulses: Vec<PulseTicks>,
}

impl Readback {
    /// Quantizes authored parameters into the form a decoded image takes.
    pub fn expected(params: &TcuParameters, clock_period_ns: u32) -> CodecResult<Self> {
        let pre_pulse_ticks = ticks(params.pre_pulse_us, clock_period_ns)?;
        let pulses = params
            .pulses
            .iter()
            .enumerate()
            .map(|(index, pulse)| PulseTicks::quantize(index, pulse, pre_pulse_ticks, clock_period_ns))
            .collect::<CodecResult<Vec<_>>>()?;

        Ok(Self {
            num_pulses: params.num_pulses() as u64,
            num_repeats: params.num_repeats,
            x_amp_delay_ticks: ticks(params.x_amp_delay_us, clock_period_ns)?,
            l_amp_delay_ticks: ticks(params.l_amp_delay_us, clock_period_ns)?,
            rex_delay_ticks: ticks(params.rex_delay_us, clock_period_ns)?,
            pri_pulse_width_ticks: ticks(params.pri_pulse_width_us, clock_period_ns)?,
            pre_pulse_ticks,
            pulses,
        })
    }
}

fn encode_scalar(register: Register, value: u64, endianness: Endianness) -> CodecResult<RegisterWord> {
    let width = register.capacity();
    let word = encode(register.name(), value, width, endianness)?;
    debug!("{} <= {} ({})", register, word.to_hdl_literal(), value);
    Ok(word)
}

/// Produces the complete register image for one parameter set.
///
/// Fails before producing anything if any field is out of range, so callers
/// never hold a partial image.
pub fn build_registers(
    params: &TcuParameters,
    clock_period_ns: u32,
    endianness: Endianness,
) -> CodecResult<RegisterImage> {
    params.validate()?;
    let expected = Readback::expected(params, clock_period_ns)?;

    let scalars = [
        (Register::NumPulses, expected.num_pulses),
        (Register::NumRepeats, expected.num_repeats),
        (Register::XAmpDelay, expected.x_amp_delay_ticks),
        (Register::LAmpDelay, expected.l_amp_delay_ticks),
        (Register::RexDelay, expected.rex_delay_ticks),
        (Register::PriPulseWidth, expected.pri_pulse_width_ticks),
        (Register::PrePulse, expected.pre_pulse_ticks),
    ];

    let mut image = RegisterImage::new();
    for (register, value) in scalars {
        image.insert(register, encode_scalar(register, value, endianness)?);
    }

    let block = encode_pulses(
        &params.pulses,
        expected.pre_pulse_ticks,
        clock_period_ns,
        endianness,
    )?;
    debug!("pulses <= {}", block.to_hdl_literal());
    image.insert(Register::Pulses, block);
    Ok(image)
}

fn decode_scalar(image: &RegisterImage, register: Register, endianness: Endianness) -> CodecResult<u64> {
    let word = image.require(register)?;
    let width = register.capacity();
    if word.len() != width {
        return Err(CodecError::LengthMismatch {
            register: register.name().to_string(),
            expected: width,
            actual: word.len(),
        });
    }
    decode(word.as_bytes(), endianness)
}

/// Decodes a raw register image back into ticks.
///
/// The number of pulse slots read is taken from the `num_pulses` register.
pub fn decode_registers(
    raw: &RegisterImage,
    clock_period_ns: u32,
    endianness: Endianness,
) -> CodecResult<Readback> {
    if clock_period_ns == 0 {
        return Err(CodecError::InvalidClockPeriod(clock_period_ns));
    }

    let num_pulses = decode_scalar(raw, Register::NumPulses, endianness)?;
    if num_pulses as usize > MAX_PULSES {
        return Err(CodecError::TooManyPulses(num_pulses as usize));
    }
    let pre_pulse_ticks = decode_scalar(raw, Register::PrePulse, endianness)?;
    let block = raw.require(Register::Pulses)?;
    let pulses = decode_pulses(
        block.as_bytes(),
        num_pulses as usize,
        pre_pulse_ticks,
        endianness,
    )?;

    Ok(Readback {
        num_pulses,
        num_repeats: decode_scalar(raw, Register::NumRepeats, endianness)?,
        x_amp_delay_ticks: decode_scalar(raw, Register::XAmpDelay, endianness)?,
        l_amp_delay_ticks: decode_scalar(raw, Register::LAmpDelay, endianness)?,
        rex_delay_ticks: decode_scalar(raw, Register::RexDelay, endianness)?,
        pri_pulse_width_ticks: decode_scalar(raw, Register::PriPulseWidth, endianness)?,
        pre_pulse_ticks,
        pulses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Pulse;

    fn scenario() -> TcuParameters {
        TcuParameters {
            clock_period_ns: 10,
            pre_pulse_us: 30.0,
            num_repeats: 2,
            pri_pulse_width_us: 500.0,
            x_amp_delay_us: 3.5,
            l_amp_delay_us: 1.0,
            rex_delay_us: 1.0,
            ..Default::default()
        }
        .with_pulses(vec![
            Pulse::new(10.0, 500.0, 4, 8500),
            Pulse::new(10.0, 500.0, 5, 8500),
        ])
        .unwrap()
    }

    #[test]
    fn scenario_image_has_expected_words() {
        let image = build_registers(&scenario(), 10, Endianness::Big).unwrap();
        assert_eq!(image.len(), 8);
        assert_eq!(image.get(Register::NumPulses).unwrap().as_bytes(), &[0x00, 0x02]);
        assert_eq!(
            image.get(Register::NumRepeats).unwrap().as_bytes(),
            &[0x00, 0x00, 0x00, 0x02]
        );
        assert_eq!(image.get(Register::XAmpDelay).unwrap().to_hdl_literal(), "x\"015e\"");
        assert_eq!(
            image.get(Register::PriPulseWidth).unwrap().as_bytes(),
            &[0x00, 0x00, 0xc3, 0x50]
        );
        assert_eq!(image.get(Register::PrePulse).unwrap().as_bytes(), &[0x0b, 0xb8]);

        let block = image.get(Register::Pulses).unwrap().as_bytes();
        assert_eq!(block.len(), 20);
        for slot in block.chunks_exact(PULSE_SLOT_BYTES) {
            assert_eq!(decode(&slot[2..6], Endianness::Big).unwrap(), 46_000);
        }
        assert_eq!(block[7], 4);
        assert_eq!(block[17], 5);
    }

    #[test]
    fn build_is_deterministic() {
        let params = scenario();
        let first = build_registers(&params, 10, Endianness::Little).unwrap();
        let second = build_registers(&params, 10, Endianness::Little).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn oversized_repeat_count_fails_before_any_output() {
        let mut params = scenario();
        params.num_repeats = 1 << 32;
        assert!(matches!(
            build_registers(&params, 10, Endianness::Big),
            Err(CodecError::ValueOutOfRange { ref register, width: 4, .. }) if register == "num_repeats"
        ));
    }

    #[test]
    fn pre_pulse_overflowing_two_bytes_is_out_of_range() {
        let mut params = scenario();
        params.pre_pulse_us = 700.0;
        params.set_pulse(0, Pulse::new(10.0, 5000.0, 4, 8500)).unwrap();
        params.set_pulse(1, Pulse::new(10.0, 5000.0, 5, 8500)).unwrap();
        assert!(matches!(
            build_registers(&params, 10, Endianness::Big),
            Err(CodecError::ValueOutOfRange { width: 2, .. })
        ));
    }

    #[test]
    fn decode_reverses_build() {
        let params = scenario();
        for endianness in [Endianness::Big, Endianness::Little] {
            let image = build_registers(&params, 10, endianness).unwrap();
            let readback = decode_registers(&image, 10, endianness).unwrap();
            assert_eq!(readback, Readback::expected(&params, 10).unwrap());
            assert_eq!(readback.pulses[0].pri_ticks, 50_000);
        }
    }

    #[test]
    fn empty_pulse_list_builds_empty_block() {
        let params = TcuParameters::default();
        let image = build_registers(&params, 10, Endianness::Big).unwrap();
        assert!(image.get(Register::Pulses).unwrap().is_empty());
        let readback = decode_registers(&image, 10, Endianness::Big).unwrap();
        assert!(readback.pulses.is_empty());
    }

    #[test]
    fn from_raw_rejects_unknown_names_and_decode_needs_every_register() {
        assert!(matches!(
            RegisterImage::from_raw(vec![("reg_led", vec![0, 1])]),
            Err(CodecError::UnknownRegister(_))
        ));

        let raw = RegisterImage::from_raw(vec![("num_pulses", vec![0, 0])]).unwrap();
        assert_eq!(
            decode_registers(&raw, 10, Endianness::Big),
            Err(CodecError::MissingRegister("pre_pulse".into()))
        );
    }

    #[test]
    fn scalar_with_wrong_length_is_reported() {
        let mut image = build_registers(&scenario(), 10, Endianness::Big).unwrap();
        image.insert(Register::NumRepeats, RegisterWord::from_bytes(vec![0, 2]));
        assert!(matches!(
            decode_registers(&image, 10, Endianness::Big),
            Err(CodecError::LengthMismatch { expected: 4, actual: 2, .. })
        ));
    }

    #[test]
    fn iteration_follows_write_order() {
        let image = build_registers(&scenario(), 10, Endianness::Big).unwrap();
        let names: Vec<_> = image.iter().map(|(register, _)| register.name()).collect();
        assert_eq!(names[0], "pulses");
        assert_eq!(names.len(), Register::ALL.len());
        assert_eq!(Register::from_name("rex_delay").unwrap(), Register::RexDelay);
    }

    #[test]
    fn status_is_known_but_never_written() {
        let status = Register::from_name("status").unwrap();
        assert_eq!(status, Register::Status);
        assert_eq!(status.width(), Some(2));
        assert!(!status.is_writable());
        assert!(Register::ALL.iter().all(|register| register.is_writable()));

        let image = build_registers(&scenario(), 10, Endianness::Big).unwrap();
        assert!(image.get(Register::Status).is_none());
    }
}
