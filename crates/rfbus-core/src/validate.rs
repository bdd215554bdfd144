//! Boundary validation of timing configuration.
//!
//! The encoders trust their registers completely: an unreachable offset
//! stalls a state forever and an offset past end-of-cycle silently shifts
//! the waveform. Everything that reaches an encoder goes through here first.
//! Hard errors reject the configuration; hazards that still produce a
//! well-formed (if unusual) waveform come back as [`TimingWarning`]s and are
//! logged.

use std::fmt;

use log::warn;

use crate::timing::{check_cycle_bits, counter_max};
use crate::{ConfigError, I2cTiming, LatchTiming, SerialTiming, TimingRegister};

/// Timing hazard that does not invalidate a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingWarning {
    /// Two events consumed by the same state fire on the same tick.
    Collision {
        /// State in which both events are consumed.
        phase: &'static str,
        /// First register.
        first: TimingRegister,
        /// Second register.
        second: TimingRegister,
        /// Shared offset.
        offset: u32,
    },
    /// Data falls before the clock is high, so no start condition is seen.
    StartBeforeClockHigh {
        /// Start offset.
        start: u32,
        /// Clock-high offset.
        clock_high: u32,
    },
    /// Stop edges do not straddle the clock rising edge.
    StopNotAroundClockHigh {
        /// Stop-low offset.
        stop_low: u32,
        /// Clock-high offset.
        clock_high: u32,
        /// Stop-high offset.
        stop_high: u32,
    },
}

impl fmt::Display for TimingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Collision {
                phase,
                first,
                second,
                offset,
            } => write!(
                f,
                "{first} and {second} both fire at {offset} during {phase}"
            ),
            Self::StartBeforeClockHigh { start, clock_high } => write!(
                f,
                "start at {start} is not after clk_high at {clock_high}; no start condition"
            ),
            Self::StopNotAroundClockHigh {
                stop_low,
                clock_high,
                stop_high,
            } => write!(
                f,
                "stop edges at {stop_low}/{stop_high} do not straddle clk_high at {clock_high}"
            ),
        }
    }
}

/// Checks that `value` is reachable by the counter and, when given, strictly
/// before `end_cycle`.
///
/// # Errors
///
/// Returns [`ConfigError::OffsetUnreachable`] or
/// [`ConfigError::OffsetNotBeforeEndCycle`].
pub const fn check_offset(
    register: TimingRegister,
    value: u32,
    cycle_bits: u8,
    end_cycle: Option<u32>,
) -> Result<(), ConfigError> {
    let max = counter_max(cycle_bits);
    if value > max {
        return Err(ConfigError::OffsetUnreachable {
            register,
            value,
            max,
        });
    }
    if let Some(end_cycle) = end_cycle {
        if value >= end_cycle {
            return Err(ConfigError::OffsetNotBeforeEndCycle {
                register,
                value,
                end_cycle,
            });
        }
    }
    Ok(())
}

fn collision(
    warnings: &mut Vec<TimingWarning>,
    phase: &'static str,
    (first, a): (TimingRegister, u32),
    (second, b): (TimingRegister, u32),
) {
    if a == b {
        warnings.push(TimingWarning::Collision {
            phase,
            first,
            second,
            offset: a,
        });
    }
}

fn report(warnings: &[TimingWarning]) {
    for warning in warnings {
        warn!("timing hazard: {warning}");
    }
}

/// Validates I2C-style encoder timing for a `cycle_bits` counter.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub fn validate_i2c_timing(
    timing: &I2cTiming,
    cycle_bits: u8,
) -> Result<Vec<TimingWarning>, ConfigError> {
    check_cycle_bits(cycle_bits)?;
    check_offset(TimingRegister::EndCycle, timing.end_cycle, cycle_bits, None)?;
    for register in [
        TimingRegister::ClockHigh,
        TimingRegister::Data,
        TimingRegister::Start,
        TimingRegister::StopLow,
        TimingRegister::StopHigh,
    ] {
        let value = timing.register(register).unwrap_or_default();
        check_offset(register, value, cycle_bits, Some(timing.end_cycle))?;
    }

    let clock_high = (TimingRegister::ClockHigh, timing.clock_high);
    let mut warnings = Vec::new();
    collision(
        &mut warnings,
        "START",
        clock_high,
        (TimingRegister::Start, timing.start),
    );
    collision(
        &mut warnings,
        "TRANSFER",
        clock_high,
        (TimingRegister::Data, timing.data),
    );
    collision(
        &mut warnings,
        "STOP",
        (TimingRegister::StopLow, timing.stop_low),
        (TimingRegister::StopHigh, timing.stop_high),
    );
    if timing.start < timing.clock_high {
        warnings.push(TimingWarning::StartBeforeClockHigh {
            start: timing.start,
            clock_high: timing.clock_high,
        });
    }
    if !(timing.stop_low < timing.clock_high && timing.clock_high < timing.stop_high) {
        warnings.push(TimingWarning::StopNotAroundClockHigh {
            stop_low: timing.stop_low,
            clock_high: timing.clock_high,
            stop_high: timing.stop_high,
        });
    }
    report(&warnings);
    Ok(warnings)
}

/// Validates generic serial encoder timing for a `cycle_bits` counter.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub fn validate_serial_timing(
    timing: &SerialTiming,
    cycle_bits: u8,
) -> Result<Vec<TimingWarning>, ConfigError> {
    check_cycle_bits(cycle_bits)?;
    check_offset(TimingRegister::EndCycle, timing.end_cycle, cycle_bits, None)?;
    check_offset(
        TimingRegister::Data,
        timing.data,
        cycle_bits,
        Some(timing.end_cycle),
    )?;

    let mut warnings = Vec::new();
    collision(
        &mut warnings,
        "TRANSFER",
        (TimingRegister::ClockHigh, timing.clock_high()),
        (TimingRegister::Data, timing.data),
    );
    report(&warnings);
    Ok(warnings)
}

/// Validates latch pulse timing for a `cycle_bits` latch counter.
///
/// The latch counter never wraps on end-of-cycle, so its offsets are only
/// bounded by the counter width.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub const fn validate_latch_timing(
    timing: &LatchTiming,
    cycle_bits: u8,
) -> Result<(), ConfigError> {
    if let Err(err) = check_cycle_bits(cycle_bits) {
        return Err(err);
    }
    if let Err(err) = check_offset(TimingRegister::LatchHigh, timing.latch_high, cycle_bits, None)
    {
        return Err(err);
    }
    if let Err(err) = check_offset(TimingRegister::LatchLow, timing.latch_low, cycle_bits, None) {
        return Err(err);
    }
    if timing.latch_high >= timing.latch_low {
        return Err(ConfigError::LatchPulseInverted {
            high: timing.latch_high,
            low: timing.latch_low,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{
        check_offset, validate_i2c_timing, validate_latch_timing, validate_serial_timing,
        TimingWarning,
    };
    use crate::{ConfigError, I2cTiming, LatchTiming, SerialTiming, TimingRegister};

    #[test]
    fn default_i2c_timing_is_clean() {
        let warnings = validate_i2c_timing(&I2cTiming::default(), 9).expect("defaults are valid");
        assert!(warnings.is_empty());
    }

    #[test]
    fn default_i2c_timing_needs_nine_bits() {
        assert_eq!(
            validate_i2c_timing(&I2cTiming::default(), 8),
            Err(ConfigError::OffsetUnreachable {
                register: TimingRegister::EndCycle,
                value: 300,
                max: 255
            })
        );
    }

    #[rstest]
    #[case(TimingRegister::ClockHigh)]
    #[case(TimingRegister::Data)]
    #[case(TimingRegister::Start)]
    #[case(TimingRegister::StopLow)]
    #[case(TimingRegister::StopHigh)]
    fn i2c_offsets_must_precede_end_cycle(#[case] register: TimingRegister) {
        let mut timing = I2cTiming::default();
        *timing.register_mut(register).expect("i2c register") = timing.end_cycle;
        assert_eq!(
            validate_i2c_timing(&timing, 9),
            Err(ConfigError::OffsetNotBeforeEndCycle {
                register,
                value: 300,
                end_cycle: 300
            })
        );
    }

    #[test]
    fn i2c_collisions_are_warnings() {
        let timing = I2cTiming {
            data: 175,
            ..I2cTiming::default()
        };
        let warnings = validate_i2c_timing(&timing, 9).expect("collision is not fatal");
        assert_eq!(
            warnings,
            vec![TimingWarning::Collision {
                phase: "TRANSFER",
                first: TimingRegister::ClockHigh,
                second: TimingRegister::Data,
                offset: 175
            }]
        );
    }

    #[test]
    fn i2c_condition_ordering_is_checked() {
        let timing = I2cTiming {
            start: 100,
            stop_high: 150,
            ..I2cTiming::default()
        };
        let warnings = validate_i2c_timing(&timing, 9).expect("ordering is not fatal");
        assert!(warnings.contains(&TimingWarning::StartBeforeClockHigh {
            start: 100,
            clock_high: 175
        }));
        assert!(warnings.contains(&TimingWarning::StopNotAroundClockHigh {
            stop_low: 90,
            clock_high: 175,
            stop_high: 150
        }));
    }

    #[rstest]
    #[case(SerialTiming { end_cycle: 20, data: 0 }, true)]
    #[case(SerialTiming { end_cycle: 8, data: 7 }, true)]
    #[case(SerialTiming { end_cycle: 8, data: 8 }, false)]
    #[case(SerialTiming { end_cycle: 0, data: 0 }, false)]
    #[case(SerialTiming { end_cycle: 256, data: 0 }, false)]
    fn serial_timing_bounds(#[case] timing: SerialTiming, #[case] valid: bool) {
        assert_eq!(validate_serial_timing(&timing, 8).is_ok(), valid);
    }

    #[test]
    fn serial_data_on_clock_edge_warns() {
        let timing = SerialTiming {
            end_cycle: 20,
            data: 10,
        };
        let warnings = validate_serial_timing(&timing, 8).expect("collision is not fatal");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("during TRANSFER"));
    }

    #[test]
    fn latch_offsets_may_exceed_the_bit_period() {
        assert!(validate_latch_timing(&LatchTiming::default(), 8).is_ok());
    }

    #[test]
    fn latch_pulse_must_rise_before_it_falls() {
        let timing = LatchTiming {
            latch_high: 15,
            latch_low: 15,
        };
        assert_eq!(
            validate_latch_timing(&timing, 8),
            Err(ConfigError::LatchPulseInverted { high: 15, low: 15 })
        );
    }

    #[test]
    fn latch_offsets_must_fit_the_counter() {
        let timing = LatchTiming {
            latch_high: 5,
            latch_low: 16,
        };
        assert!(matches!(
            validate_latch_timing(&timing, 4),
            Err(ConfigError::OffsetUnreachable { max: 15, .. })
        ));
    }

    #[test]
    fn offset_check_without_end_cycle_only_bounds_width() {
        assert!(check_offset(TimingRegister::EndCycle, 255, 8, None).is_ok());
        assert!(check_offset(TimingRegister::EndCycle, 256, 8, None).is_err());
    }
}
