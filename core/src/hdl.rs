//! Human-readable renderings of a register image: the VHDL initialisation
//! snippet used when baking an experiment into the gateware, and the
//! parameter summary printed by the controller.

use crate::codec::{
    build_registers, slots, split_slot, ticks_to_us, Readback, Register, RegisterImage,
    RegisterWord,
};
use crate::params::TcuParameters;
use crate::prelude::{CodecResult, Endianness};
use std::fmt::Write as _;

const RULE_WIDTH: usize = 100;

fn source_value(params: &TcuParameters, register: Register) -> String {
    match register {
        Register::NumPulses => params.num_pulses().to_string(),
        Register::NumRepeats => params.num_repeats.to_string(),
        Register::XAmpDelay => params.x_amp_delay_us.to_string(),
        Register::LAmpDelay => params.l_amp_delay_us.to_string(),
        Register::RexDelay => params.rex_delay_us.to_string(),
        Register::PriPulseWidth => params.pri_pulse_width_us.to_string(),
        Register::PrePulse => params.pre_pulse_us.to_string(),
        Register::Pulses => format!("{} pulses", params.num_pulses()),
        Register::Status => String::new(),
    }
}

const SCALARS: [Register; 7] = [
    Register::NumPulses,
    Register::NumRepeats,
    Register::PriPulseWidth,
    Register::PrePulse,
    Register::XAmpDelay,
    Register::LAmpDelay,
    Register::RexDelay,
];

/// Renders a VHDL block initialising every TCU register.
pub fn render_vhdl(
    params: &TcuParameters,
    clock_period_ns: u32,
    endianness: Endianness,
) -> CodecResult<String> {
    let image = build_registers(params, clock_period_ns, endianness)?;
    let rule = "-".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "-- system clock period : {}ns ({}MHz)",
        clock_period_ns,
        1000.0 / f64::from(clock_period_ns)
    );
    let _ = writeln!(out, "{}", rule);
    for register in SCALARS {
        let word = image.require(register)?;
        let _ = writeln!(
            out,
            "{}_reg <= {};\t\t-- {}",
            register.name(),
            word.to_hdl_literal(),
            source_value(params, register)
        );
    }
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);
    let _ = writeln!(out, "-- <p. width>, <pri offset>, <mode>, <freq>");

    let block = image.require(Register::Pulses)?;
    for (index, slot) in slots(block.as_bytes(), params.num_pulses())?.enumerate() {
        let fields = split_slot(slot)
            .iter()
            .map(|field| RegisterWord::from_bytes(field.to_vec()).to_hdl_literal())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "-- pulse {}", index);
        let _ = writeln!(out, "{},", fields);
    }
    let _ = writeln!(out, "others => x\"ffff\"");
    let _ = writeln!(out, "{}", rule);
    Ok(out)
}

/// Renders the parameter and pulse tables with encoded values.
pub fn render_summary(
    params: &TcuParameters,
    clock_period_ns: u32,
    endianness: Endianness,
) -> CodecResult<String> {
    let image: RegisterImage = build_registers(params, clock_period_ns, endianness)?;
    let ticks = Readback::expected(params, clock_period_ns)?;
    let mut out = String::new();

    let _ = writeln!(out, "Global Params [{} endian, {}ns clock]", endianness, clock_period_ns);
    let _ = writeln!(out, "{:<18}{:>14}  {}", "Parameter", "Value", "Hex Cycles");
    for register in SCALARS {
        let _ = writeln!(
            out,
            "{:<18}{:>14}  {}",
            register.name(),
            source_value(params, register),
            image.require(register)?.to_hdl_literal()
        );
    }

    let _ = writeln!(out, "Pulse Params");
    let _ = writeln!(
        out,
        "{:<6}{:>12}{:>12}{:>15}{:>6}{:>11}{:>14}{:>12}",
        "Pulse",
        "Width (us)",
        "PRI (us)",
        "Eff. PRI (us)",
        "Mode",
        "Freq (MHz)",
        "Offset (tk)",
        "PRF (Hz)"
    );
    for (index, (pulse, quantized)) in params.pulses.iter().zip(&ticks.pulses).enumerate() {
        let _ = writeln!(
            out,
            "{:<6}{:>12}{:>12}{:>15.2}{:>6}{:>11}{:>14}{:>12.1}",
            index,
            pulse.pulse_width_us,
            pulse.pri_us,
            ticks_to_us(quantized.pri_ticks, clock_period_ns),
            pulse.polarization_mode,
            pulse.frequency_mhz,
            quantized.pri_offset_ticks,
            quantized.prf_hz(clock_period_ns)
        );
    }
    Ok(out)
}
