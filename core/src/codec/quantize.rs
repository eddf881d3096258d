use crate::prelude::{CodecError, CodecResult};

/// Converts a duration in microseconds into whole clock ticks.
///
/// The result is `floor(duration_us * 1000 / clock_period_ns)`: sub-tick
/// remainders are truncated, never rounded. Readback verification compares
/// against this same truncated value.
pub fn ticks(duration_us: f64, clock_period_ns: u32) -> CodecResult<u64> {
    if clock_period_ns == 0 {
        return Err(CodecError::InvalidClockPeriod(clock_period_ns));
    }
    if !duration_us.is_finite() || duration_us < 0.0 {
        return Err(CodecError::InvalidDuration {
            value_us: duration_us,
        });
    }
    let quantized = (duration_us * 1000.0 / f64::from(clock_period_ns)).floor();
    Ok(quantized as u64)
}

/// Converts a tick count back into microseconds.
pub fn ticks_to_us(ticks: u64, clock_period_ns: u32) -> f64 {
    ticks as f64 * f64::from(clock_period_ns) / 1000.0
}
