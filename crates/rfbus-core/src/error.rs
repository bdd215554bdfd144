use thiserror::Error;

use crate::TimingRegister;

/// Configuration rejected at the boundary before it reaches an encoder.
///
/// The encoders themselves never fault at runtime; everything that can go
/// wrong is a configuration or usage mistake caught here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// Cycle counter width outside the supported range.
    #[error("cycle counter width {bits} is outside 1..=16")]
    CycleBitsOutOfRange {
        /// Requested counter width.
        bits: u8,
    },
    /// Shift register width outside the supported range.
    #[error("shift register width {bits} is outside 1..=32")]
    DataBitsOutOfRange {
        /// Requested register width.
        bits: u8,
    },
    /// Offset the counter can never reach with its configured width.
    #[error("{register} offset {value} exceeds counter maximum {max}")]
    OffsetUnreachable {
        /// Register holding the offset.
        register: TimingRegister,
        /// Offending offset.
        value: u32,
        /// Largest value the counter reaches.
        max: u32,
    },
    /// Offset on the cycle counter that is not strictly before end-of-cycle.
    #[error("{register} offset {value} is not before end_cycle {end_cycle}")]
    OffsetNotBeforeEndCycle {
        /// Register holding the offset.
        register: TimingRegister,
        /// Offending offset.
        value: u32,
        /// Configured end-of-cycle offset.
        end_cycle: u32,
    },
    /// Latch-enable would fall before (or as) it rises.
    #[error("latch pulse rises at {high} but falls at {low}")]
    LatchPulseInverted {
        /// Configured rising offset.
        high: u32,
        /// Configured falling offset.
        low: u32,
    },
    /// Request field wider than its slot in the device word.
    #[error("{field} value {value:#x} does not fit in {bits} bits")]
    FieldOutOfRange {
        /// Field name as it appears in the request.
        field: &'static str,
        /// Offending value.
        value: u32,
        /// Width of the field slot.
        bits: u8,
    },
}

/// Failure of a configuration-register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CsrError {
    /// No register is mapped at the offset.
    #[error("no register mapped at offset {offset:#04x}")]
    Unmapped {
        /// Accessed offset.
        offset: u16,
    },
    /// Write to a status register.
    #[error("register at offset {offset:#04x} is read-only")]
    ReadOnly {
        /// Accessed offset.
        offset: u16,
    },
    /// The written value would leave the encoder misconfigured.
    #[error(transparent)]
    Rejected(#[from] ConfigError),
}

/// Checks that `value` fits a `bits`-wide request field.
///
/// # Errors
///
/// Returns [`ConfigError::FieldOutOfRange`] when `value` has bits set above
/// the field width.
pub const fn check_field(field: &'static str, value: u32, bits: u8) -> Result<(), ConfigError> {
    if bits < 32 && value >> bits != 0 {
        return Err(ConfigError::FieldOutOfRange { field, value, bits });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_field, ConfigError, CsrError};
    use crate::TimingRegister;

    #[test]
    fn field_check_accepts_values_that_fit() {
        assert!(check_field("gain", 63, 6).is_ok());
        assert!(check_field("word", u32::MAX, 32).is_ok());
    }

    #[test]
    fn field_check_rejects_overflowing_values() {
        assert_eq!(
            check_field("attenuation", 64, 6),
            Err(ConfigError::FieldOutOfRange {
                field: "attenuation",
                value: 64,
                bits: 6
            })
        );
    }

    #[test]
    fn config_errors_render_register_names() {
        let err = ConfigError::OffsetNotBeforeEndCycle {
            register: TimingRegister::Data,
            value: 20,
            end_cycle: 20,
        };
        assert_eq!(err.to_string(), "data offset 20 is not before end_cycle 20");
    }

    #[test]
    fn rejected_csr_write_is_transparent() {
        let inner = ConfigError::CycleBitsOutOfRange { bits: 0 };
        let err = CsrError::from(inner);
        assert_eq!(err.to_string(), inner.to_string());
    }
}
