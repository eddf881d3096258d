//! NeXtRAD header file format.
//!
//! The TCU reads its experiment from the `[PulseParameters]` section of an
//! INI-style header. Durations are in microseconds; `PULSES` is a quoted,
//! `|`-separated list of `<pulse width>,<pri>,<mode>,<frequency>` entries.

use crate::params::{Pulse, TcuParameters, DEFAULT_CLOCK_PERIOD_NS, MAX_PULSES};
use crate::prelude::{HeaderError, HeaderResult};
use log::debug;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const SECTION: &str = "PulseParameters";

/// Raw key/value pairs of one INI section, keys kept case-sensitive.
struct Section {
    values: HashMap<String, String>,
}

impl Section {
    fn required(&self, field: &'static str) -> HeaderResult<&str> {
        self.values
            .get(field)
            .map(String::as_str)
            .ok_or(HeaderError::MissingField(field))
    }

    fn optional(&self, field: &'static str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}

fn read_section(text: &str, wanted: &'static str) -> HeaderResult<Section> {
    let mut current: Option<String> = None;
    let mut found = false;
    let mut values = HashMap::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[') {
            let name = name.strip_suffix(']').ok_or_else(|| HeaderError::Syntax {
                line: line_no + 1,
                text: raw.to_string(),
            })?;
            found |= name.trim() == wanted;
            current = Some(name.trim().to_string());
            continue;
        }

        let split = line.find(['=', ':']).ok_or_else(|| HeaderError::Syntax {
            line: line_no + 1,
            text: raw.to_string(),
        })?;
        if current.as_deref() == Some(wanted) {
            let (key, value) = line.split_at(split);
            values.insert(key.trim().to_string(), value[1..].trim().to_string());
        }
    }

    if !found {
        return Err(HeaderError::MissingSection(SECTION));
    }
    Ok(Section { values })
}

fn parse_duration(field: &'static str, value: &str) -> HeaderResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite() && *parsed >= 0.0)
        .ok_or_else(|| HeaderError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

/// Accepts `8500` as well as `8500.0`, which the authoring tools emit.
fn parse_count(value: &str) -> Option<u64> {
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|parsed| *parsed >= 0.0 && parsed.fract() == 0.0 && *parsed <= u64::MAX as f64)
            .map(|parsed| parsed as u64)
    })
}

fn parse_integer<T: TryFrom<u64>>(field: &'static str, value: &str) -> HeaderResult<T> {
    parse_count(value)
        .and_then(|parsed| T::try_from(parsed).ok())
        .ok_or_else(|| HeaderError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

/// Parses the `PULSES` value, with or without its surrounding quotes.
pub fn parse_pulses(value: &str) -> HeaderResult<Vec<Pulse>> {
    let trimmed = value.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split('|')
        .enumerate()
        .map(|(index, text)| {
            let malformed = || HeaderError::MalformedPulse {
                index,
                text: text.to_string(),
            };
            let fields: Vec<&str> = text.split(',').map(str::trim).collect();
            let [width, pri, mode, frequency] = fields.as_slice() else {
                return Err(malformed());
            };

            let duration = |field: &str| {
                field
                    .parse::<f64>()
                    .ok()
                    .filter(|parsed| parsed.is_finite() && *parsed >= 0.0)
            };
            Ok(Pulse {
                pulse_width_us: duration(*width).ok_or_else(malformed)?,
                pri_us: duration(*pri).ok_or_else(malformed)?,
                polarization_mode: parse_count(*mode)
                    .and_then(|parsed| u16::try_from(parsed).ok())
                    .ok_or_else(malformed)?,
                frequency_mhz: parse_count(*frequency)
                    .and_then(|parsed| u32::try_from(parsed).ok())
                    .ok_or_else(malformed)?,
            })
        })
        .collect()
}

/// Renders a pulse list in header form, quotes included.
pub fn format_pulses(pulses: &[Pulse]) -> String {
    let body = pulses
        .iter()
        .map(|pulse| {
            format!(
                "{},{},{},{}",
                pulse.pulse_width_us, pulse.pri_us, pulse.polarization_mode, pulse.frequency_mhz
            )
        })
        .collect::<Vec<_>>()
        .join("|");
    format!("\"{}\"", body)
}

/// Parses header text into parameters.
///
/// Every field except `REX_DELAY` and `CLOCK_PERIOD_NS` is required.
pub fn parse_header(text: &str) -> HeaderResult<TcuParameters> {
    let section = read_section(text, SECTION)?;

    let pulses = parse_pulses(section.required("PULSES")?)?;
    if pulses.len() > MAX_PULSES {
        return Err(HeaderError::InvalidValue {
            field: "PULSES",
            value: format!("{} pulses", pulses.len()),
        });
    }
    let num_pris: u64 = parse_integer("NUM_PRIS", section.required("NUM_PRIS")?)?;
    let num_repeats = match pulses.len() as u64 {
        0 => 0,
        count => num_pris / count,
    };

    let clock_period_ns = match section.optional("CLOCK_PERIOD_NS") {
        Some(value) => parse_integer::<u32>("CLOCK_PERIOD_NS", value)
            .and_then(|parsed| {
                if parsed == 0 {
                    Err(HeaderError::InvalidValue {
                        field: "CLOCK_PERIOD_NS",
                        value: value.to_string(),
                    })
                } else {
                    Ok(parsed)
                }
            })?,
        None => DEFAULT_CLOCK_PERIOD_NS,
    };
    let rex_delay_us = match section.optional("REX_DELAY") {
        Some(value) => parse_duration("REX_DELAY", value)?,
        None => 0.0,
    };

    let params = TcuParameters {
        clock_period_ns,
        num_repeats,
        pre_pulse_us: parse_duration("PRE_PULSE", section.required("PRE_PULSE")?)?,
        x_amp_delay_us: parse_duration("X_AMP_DELAY", section.required("X_AMP_DELAY")?)?,
        l_amp_delay_us: parse_duration("L_AMP_DELAY", section.required("L_AMP_DELAY")?)?,
        rex_delay_us,
        pri_pulse_width_us: parse_duration(
            "PRI_PULSE_WIDTH",
            section.required("PRI_PULSE_WIDTH")?,
        )?,
        dac_delay: parse_integer("DAC_DELAY", section.required("DAC_DELAY")?)?,
        adc_delay: parse_integer("ADC_DELAY", section.required("ADC_DELAY")?)?,
        samples_per_pri: parse_integer("SAMPLES_PER_PRI", section.required("SAMPLES_PER_PRI")?)?,
        waveform_index: parse_integer("WAVEFORM_INDEX", section.required("WAVEFORM_INDEX")?)?,
        ..Default::default()
    }
    .with_pulses(pulses)
    .map_err(|err| HeaderError::InvalidValue {
        field: "PULSES",
        value: err.to_string(),
    })?;

    debug!(
        "parsed header: {} pulses, {} repeats",
        params.num_pulses(),
        params.num_repeats
    );
    Ok(params)
}

/// Reads and parses a header file.
pub fn read_header<P: AsRef<Path>>(path: P) -> HeaderResult<TcuParameters> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_header(&contents)
}

/// Renders parameters in the intermediary header layout.
pub fn render_header(params: &TcuParameters) -> String {
    let fields: [(&str, String); 12] = [
        ("WAVEFORM_INDEX", params.waveform_index.to_string()),
        ("NUM_PRIS", params.num_pris().to_string()),
        ("PRE_PULSE", params.pre_pulse_us.to_string()),
        ("PRI_PULSE_WIDTH", params.pri_pulse_width_us.to_string()),
        ("X_AMP_DELAY", params.x_amp_delay_us.to_string()),
        ("L_AMP_DELAY", params.l_amp_delay_us.to_string()),
        ("REX_DELAY", params.rex_delay_us.to_string()),
        ("DAC_DELAY", params.dac_delay.to_string()),
        ("ADC_DELAY", params.adc_delay.to_string()),
        ("SAMPLES_PER_PRI", params.samples_per_pri.to_string()),
        ("CLOCK_PERIOD_NS", params.clock_period_ns.to_string()),
        ("PULSES", format_pulses(&params.pulses)),
    ];

    let mut out = String::from("# Intermediary ini file for TCU\n");
    let _ = writeln!(out, "[{}]", SECTION);
    for (key, value) in fields {
        if key == "PULSES" {
            out.push_str("; PULSES = \"<PULSE|PULSE|PULSE...>\"\n");
            out.push_str("; PULSE = <p. width>,<pri>,<mode>,<freq>\n");
        }
        let _ = writeln!(out, "{} = {}", key, value);
    }
    out
}

pub fn write_header<P: AsRef<Path>>(path: P, params: &TcuParameters) -> HeaderResult<()> {
    fs::write(path.as_ref(), render_header(params))?;
    Ok(())
}
