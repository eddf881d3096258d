use crate::codec::registers::{decode_registers, Readback, RegisterImage};
use crate::params::TcuParameters;
use crate::prelude::{CodecResult, Endianness};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A register whose readback differs from the value that was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub register_name: String,
    pub expected_ticks: u64,
    pub observed_ticks: u64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, observed {}",
            self.register_name, self.expected_ticks, self.observed_ticks
        )
    }
}

fn compare(findings: &mut Vec<Mismatch>, register_name: String, expected: u64, observed: u64) {
    if expected != observed {
        findings.push(Mismatch {
            register_name,
            expected_ticks: expected,
            observed_ticks: observed,
        });
    }
}

/// Compares authored parameters against a decoded readback, tick for tick.
///
/// Pulses are compared by index over the slots present on both sides. A
/// differing `num_pulses` register and a differing number of decoded slots
/// are each reported, so a lost slot is never dropped silently.
pub fn verify(
    expected: &TcuParameters,
    observed: &Readback,
    clock_period_ns: u32,
) -> CodecResult<Vec<Mismatch>> {
    let expected = Readback::expected(expected, clock_period_ns)?;
    let mut findings = Vec::new();

    let scalars = [
        ("num_pulses", expected.num_pulses, observed.num_pulses),
        ("num_repeats", expected.num_repeats, observed.num_repeats),
        ("x_amp_delay", expected.x_amp_delay_ticks, observed.x_amp_delay_ticks),
        ("l_amp_delay", expected.l_amp_delay_ticks, observed.l_amp_delay_ticks),
        ("rex_delay", expected.rex_delay_ticks, observed.rex_delay_ticks),
        (
            "pri_pulse_width",
            expected.pri_pulse_width_ticks,
            observed.pri_pulse_width_ticks,
        ),
        ("pre_pulse", expected.pre_pulse_ticks, observed.pre_pulse_ticks),
    ];
    for (name, want, got) in scalars {
        compare(&mut findings, name.to_string(), want, got);
    }

    compare(
        &mut findings,
        "pulses".to_string(),
        expected.pulses.len() as u64,
        observed.pulses.len() as u64,
    );
    for (index, (want, got)) in expected.pulses.iter().zip(&observed.pulses).enumerate() {
        let fields = [
            ("pulse_width", want.pulse_width_ticks, got.pulse_width_ticks),
            ("pri", want.pri_ticks, got.pri_ticks),
            ("mode", want.polarization_mode, got.polarization_mode),
            ("frequency", want.frequency_mhz, got.frequency_mhz),
        ];
        for (field, want, got) in fields {
            compare(&mut findings, format!("pulses[{}].{}", index, field), want, got);
        }
    }

    Ok(findings)
}

/// Decodes raw register bytes and verifies them in one step.
pub fn verify_image(
    expected: &TcuParameters,
    observed: &RegisterImage,
    clock_period_ns: u32,
    endianness: Endianness,
) -> CodecResult<Vec<Mismatch>> {
    let readback = decode_registers(observed, clock_period_ns, endianness)?;
    verify(expected, &readback, clock_period_ns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::registers::{build_registers, Register};
    use crate::codec::word::RegisterWord;
    use crate::params::{Pulse, MAX_POLARIZATION_MODE, MAX_PULSES};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn params() -> TcuParameters {
        TcuParameters {
            pre_pulse_us: 30.0,
            num_repeats: 75_000,
            pri_pulse_width_us: 100.0,
            x_amp_delay_us: 3.5,
            l_amp_delay_us: 1.0,
            ..Default::default()
        }
        .with_pulses(vec![
            Pulse::new(10.0, 500.0, 4, 8500),
            Pulse::new(10.0, 500.0, 5, 8500),
            Pulse::new(0.0009, 31.0, 0, 1300),
        ])
        .unwrap()
    }

    #[test]
    fn clean_readback_has_no_findings() {
        let params = params();
        for endianness in [Endianness::Big, Endianness::Little] {
            let image = build_registers(&params, 10, endianness).unwrap();
            let readback = decode_registers(&image, 10, endianness).unwrap();
            assert!(verify(&params, &readback, 10).unwrap().is_empty());
        }
    }

    #[test]
    fn pulse_field_divergence_is_reported_by_index() {
        let params = params();
        let image = build_registers(&params, 10, Endianness::Big).unwrap();
        let mut readback = decode_registers(&image, 10, Endianness::Big).unwrap();
        readback.pulses[1].polarization_mode = 2;
        readback.pulses[1].pri_ticks += 1;

        let findings = verify(&params, &readback, 10).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].register_name, "pulses[1].pri");
        assert_eq!(
            findings[1],
            Mismatch {
                register_name: "pulses[1].mode".into(),
                expected_ticks: 5,
                observed_ticks: 2,
            }
        );
    }

    #[test]
    fn swapped_pulses_are_not_treated_as_equal() {
        let params = params();
        let image = build_registers(&params, 10, Endianness::Big).unwrap();
        let mut readback = decode_registers(&image, 10, Endianness::Big).unwrap();
        readback.pulses.swap(0, 1);
        let findings = verify(&params, &readback, 10).unwrap();
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn corrupted_raw_bytes_surface_through_verify_image() {
        let params = params();
        let mut image = build_registers(&params, 10, Endianness::Little).unwrap();
        image.insert(Register::XAmpDelay, RegisterWord::from_bytes(vec![0x00, 0x00]));

        let findings = verify_image(&params, &image, 10, Endianness::Little).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].register_name, "x_amp_delay");
        assert_eq!(findings[0].expected_ticks, 350);
        assert_eq!(findings[0].observed_ticks, 0);
    }

    #[test]
    fn endianness_disagreement_is_detected() {
        let params = params();
        let image = build_registers(&params, 10, Endianness::Big).unwrap();
        let findings = verify_image(&params, &image, 10, Endianness::Little);
        // num_pulses reads back as 0x0300 and exceeds the slot count
        assert!(findings.is_err());
    }

    #[test]
    fn short_count_register_is_reported() {
        let params = params();
        let image = build_registers(&params, 10, Endianness::Big).unwrap();
        let mut readback = decode_registers(&image, 10, Endianness::Big).unwrap();
        readback.pulses.pop();
        readback.num_pulses = 2;
        let findings = verify(&params, &readback, 10).unwrap();
        let names: Vec<_> = findings.iter().map(|m| m.register_name.as_str()).collect();
        assert_eq!(names, ["num_pulses", "pulses"]);
    }

    #[test]
    fn lost_slot_is_reported_even_when_count_agrees() {
        let params = params();
        let image = build_registers(&params, 10, Endianness::Little).unwrap();
        let mut readback = decode_registers(&image, 10, Endianness::Little).unwrap();
        readback.pulses.pop();
        assert_eq!(readback.num_pulses, 3);

        let findings = verify(&params, &readback, 10).unwrap();
        assert_eq!(
            findings,
            vec![Mismatch {
                register_name: "pulses".into(),
                expected_ticks: 3,
                observed_ticks: 2,
            }]
        );
    }

    #[test]
    fn extra_slot_is_reported() {
        let params = params();
        let image = build_registers(&params, 10, Endianness::Big).unwrap();
        let mut readback = decode_registers(&image, 10, Endianness::Big).unwrap();
        let copy = readback.pulses[0];
        readback.pulses.push(copy);
        let findings = verify(&params, &readback, 10).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].observed_ticks, 4);
    }

    fn sampled_params(rng: &mut StdRng) -> TcuParameters {
        // keep every quantized value inside its register width at 10ns
        let pre_pulse_us = rng.gen_range(0.0..600.0);
        let count = rng.gen_range(0..=MAX_PULSES);
        let pulses = (0..count)
            .map(|_| {
                let pulse_width_us = rng.gen_range(0.0..600.0);
                let slack = rng.gen_range(0.0..10_000.0);
                Pulse::new(
                    pulse_width_us,
                    pre_pulse_us + pulse_width_us + slack,
                    rng.gen_range(0..=MAX_POLARIZATION_MODE),
                    rng.gen_range(0..=u32::from(u16::MAX)),
                )
            })
            .collect();

        TcuParameters {
            num_repeats: rng.gen_range(0..=u64::from(u32::MAX)),
            pre_pulse_us,
            x_amp_delay_us: rng.gen_range(0.0..600.0),
            l_amp_delay_us: rng.gen_range(0.0..600.0),
            rex_delay_us: rng.gen_range(0.0..600.0),
            pri_pulse_width_us: rng.gen_range(0.0..40_000_000.0),
            ..Default::default()
        }
        .with_pulses(pulses)
        .unwrap()
    }

    #[test]
    fn sampled_parameters_verify_clean_after_round_trip() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..256 {
            let params = sampled_params(&mut rng);
            for endianness in [Endianness::Big, Endianness::Little] {
                let image = build_registers(&params, 10, endianness).unwrap();
                let findings = verify_image(&params, &image, 10, endianness).unwrap();
                assert!(findings.is_empty(), "{:?}: {:?}", params, findings);
            }
        }
    }

    #[test]
    fn findings_serialize_for_reports() {
        let finding = Mismatch {
            register_name: "pulses[0].frequency".into(),
            expected_ticks: 8500,
            observed_ticks: 1300,
        };
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["register_name"], "pulses[0].frequency");
        assert_eq!(json["observed_ticks"], 1300);
        assert_eq!(finding.to_string(), "pulses[0].frequency: expected 8500, observed 1300");
    }
}
