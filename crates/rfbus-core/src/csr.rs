use crate::{CsrError, TimingRegister};

/// What a configuration-register offset controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsrField {
    /// A timing offset.
    Timing(TimingRegister),
    /// Bit-bang mode select.
    BitBangEnable,
    /// Bit-bang override vector.
    BitBangOut,
    /// Synchronized return line (read-only).
    BitBangInput,
}

impl CsrField {
    /// Returns `true` for status registers that reject writes.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::BitBangInput)
    }
}

/// Register map of the I2C-style encoder.
pub const I2C_CSR_MAP: &[(u16, CsrField)] = &[
    (0x00, CsrField::Timing(TimingRegister::EndCycle)),
    (0x01, CsrField::Timing(TimingRegister::ClockHigh)),
    (0x02, CsrField::Timing(TimingRegister::Data)),
    (0x03, CsrField::Timing(TimingRegister::Start)),
    (0x04, CsrField::Timing(TimingRegister::StopLow)),
    (0x05, CsrField::Timing(TimingRegister::StopHigh)),
    (0x06, CsrField::BitBangEnable),
    (0x07, CsrField::BitBangOut),
    (0x08, CsrField::BitBangInput),
];

/// Register map of the attenuator (serial + latch) encoder.
pub const LATCH_CSR_MAP: &[(u16, CsrField)] = &[
    (0x00, CsrField::Timing(TimingRegister::EndCycle)),
    (0x01, CsrField::Timing(TimingRegister::Data)),
    (0x02, CsrField::Timing(TimingRegister::LatchHigh)),
    (0x03, CsrField::Timing(TimingRegister::LatchLow)),
];

/// Register map of the SPI-style encoder.
pub const SPI_CSR_MAP: &[(u16, CsrField)] = &[
    (0x00, CsrField::Timing(TimingRegister::EndCycle)),
    (0x01, CsrField::Timing(TimingRegister::Data)),
    (0x02, CsrField::BitBangEnable),
    (0x03, CsrField::BitBangOut),
    (0x04, CsrField::BitBangInput),
];

/// Resolves `offset` in `map`.
///
/// # Errors
///
/// Returns [`CsrError::Unmapped`] when no entry matches.
pub fn csr_field(map: &[(u16, CsrField)], offset: u16) -> Result<CsrField, CsrError> {
    map.iter()
        .find_map(|(entry, field)| (*entry == offset).then_some(*field))
        .ok_or(CsrError::Unmapped { offset })
}

/// Resolves `offset` in `map` for a write.
///
/// # Errors
///
/// Returns [`CsrError::Unmapped`] or, for status registers,
/// [`CsrError::ReadOnly`].
pub fn csr_writable_field(map: &[(u16, CsrField)], offset: u16) -> Result<CsrField, CsrError> {
    let field = csr_field(map, offset)?;
    if field.is_read_only() {
        return Err(CsrError::ReadOnly { offset });
    }
    Ok(field)
}
