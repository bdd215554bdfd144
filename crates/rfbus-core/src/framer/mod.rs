//! Device framers: structured requests in, encoder payloads out.
//!
//! A framer owns exactly one encoder. It packs a request into the device's
//! word layout, reverses it so the encoder's LSB-first shifter puts the
//! device's MSB on the wire first, and holds data-ready for the single tick
//! on which the idle encoder takes it.

use std::fmt;

use log::debug;

use crate::{ConfigError, PadLevels, SubmitOutcome};

mod attenuator;
mod io_expander;
mod synthesizer;
mod vga;

pub use attenuator::{Attenuator, AttenuatorConfig, AttenuatorSetting, ATTENUATOR_WORD_BITS};
pub use io_expander::{
    IoExpander, IoExpanderConfig, RegisterWrite, IO_EXPANDER_DEFAULT_ADDRESS,
    IO_EXPANDER_WORD_BITS,
};
pub use synthesizer::{
    Synthesizer, SynthesizerConfig, SynthesizerWrite, SYNTHESIZER_WORD_BITS,
};
pub use vga::{GainSetting, Vga, VgaChannel, VgaConfig, VGA_WORD_BITS};

/// Structured request accepted by a framer.
pub trait DeviceRequest: Copy + fmt::Debug {
    /// Checks that every field fits its slot in the device word.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FieldOutOfRange`] for an oversized field.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Device-facing driver owning one encoder.
pub trait Framer {
    /// Request type.
    type Request: DeviceRequest;

    /// Device name for diagnostics.
    const DEVICE: &'static str;

    /// Accept signal: the encoder is idle.
    fn ready(&self) -> bool;

    /// Transaction in progress.
    fn busy(&self) -> bool;

    /// Offers a request for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FieldOutOfRange`] when the request does not fit
    /// the device word; nothing is latched in that case.
    fn submit(&mut self, request: Self::Request) -> Result<SubmitOutcome, ConfigError>;

    /// Advances one tick, handing any latched request to the encoder.
    fn tick(&mut self);

    /// Drives the device's return line (SDA read-back or MISO).
    fn set_return_line(&mut self, level: bool);

    /// Current level of every driven pad.
    fn pads(&self) -> PadLevels;
}

/// Reverses the low `width` bits of `word`; bits above `width` are dropped.
#[must_use]
pub const fn reverse_bits(word: u32, width: u8) -> u32 {
    match width {
        0 => 0,
        32.. => word.reverse_bits(),
        _ => word.reverse_bits() >> (32 - width),
    }
}

/// Shared accept logic: latch `request` when the encoder is idle and the
/// slot is empty.
fn offer<R: DeviceRequest>(
    slot: &mut Option<R>,
    idle: bool,
    request: R,
    device: &str,
) -> Result<SubmitOutcome, ConfigError> {
    request.validate()?;
    if !idle || slot.is_some() {
        return Ok(SubmitOutcome::Busy);
    }
    debug!("{device}: accepted {request:?}");
    *slot = Some(request);
    Ok(SubmitOutcome::Accepted)
}

#[cfg(test)]
mod tests {
    use super::reverse_bits;

    #[test]
    fn reverse_bits_mirrors_within_width() {
        assert_eq!(reverse_bits(0b0000_0001, 8), 0b1000_0000);
        assert_eq!(reverse_bits(0b0010_1001, 8), 0b1001_0100);
        assert_eq!(reverse_bits(1, 25), 1 << 24);
        assert_eq!(reverse_bits(0x8000_0000, 32), 1);
    }

    #[test]
    fn reverse_bits_drops_bits_above_width() {
        assert_eq!(reverse_bits(0x1FF, 8), 0xFF);
        assert_eq!(reverse_bits(0x100, 8), 0);
    }

    #[test]
    fn reverse_bits_is_an_involution_within_width() {
        for word in [0_u32, 1, 0x1234, 0xABCD, 0xFFFF] {
            assert_eq!(reverse_bits(reverse_bits(word, 16), 16), word);
        }
    }
}
