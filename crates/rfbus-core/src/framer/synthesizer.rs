//! Integrated synthesizer/mixer family (RFFC5071, RFMD2081) register writes
//! over the three-wire SPI bus.

use crate::encoder::{Encoder, SpiEncoder};
use crate::framer::{offer, reverse_bits, DeviceRequest, Framer};
use crate::{
    check_field, BitBangConfig, ConfigError, CsrBus, CsrError, Pad, PadLevels, SerialTiming,
    SubmitOutcome,
};

/// Bits per transaction: two leading pad bits, address, data.
pub const SYNTHESIZER_WORD_BITS: u8 = 25;

const ADDRESS_BITS: u8 = 7;

/// Construction parameters of a [`Synthesizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SynthesizerConfig {
    /// Cycle counter width.
    pub cycle_bits: u8,
    /// Bit timing; the data offset also places chip-select edges.
    pub timing: SerialTiming,
    /// Initial bit-bang registers.
    pub bit_bang: BitBangConfig,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            cycle_bits: 8,
            timing: SerialTiming::default(),
            bit_bang: BitBangConfig::spi(),
        }
    }
}

/// Write of one 16-bit control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SynthesizerWrite {
    /// 7-bit register address.
    pub address: u8,
    /// Register contents.
    pub data: u16,
}

impl SynthesizerWrite {
    /// Device word in wire order.
    #[must_use]
    pub fn word(self) -> u32 {
        u32::from(self.data) | (u32::from(self.address & 0x7F) << 16)
    }

    /// Recovers the write from a wire-order word.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        let [_, address, high, low] = word.to_be_bytes();
        Self {
            address: address & 0x7F,
            data: u16::from_be_bytes([high, low]),
        }
    }
}

impl DeviceRequest for SynthesizerWrite {
    fn validate(&self) -> Result<(), ConfigError> {
        check_field("address", u32::from(self.address), ADDRESS_BITS)
    }
}

/// Synthesizer framer over the SPI encoder.
///
/// Pads: `enx` carries chip-select, `sclk` the clock and `sdata` the data;
/// the device answers on `sdatao`.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    encoder: SpiEncoder,
    pending: Option<SynthesizerWrite>,
}

impl Synthesizer {
    /// Builds the framer and its encoder.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid encoder configuration.
    pub fn new(config: &SynthesizerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            encoder: SpiEncoder::new(
                config.timing,
                config.cycle_bits,
                SYNTHESIZER_WORD_BITS,
                config.bit_bang,
            )?,
            pending: None,
        })
    }

    /// Underlying encoder.
    #[must_use]
    pub const fn encoder(&self) -> &SpiEncoder {
        &self.encoder
    }

    /// Encoder payload for `write`.
    #[must_use]
    pub fn frame(write: SynthesizerWrite) -> u32 {
        reverse_bits(write.word(), SYNTHESIZER_WORD_BITS)
    }
}

impl Framer for Synthesizer {
    type Request = SynthesizerWrite;

    const DEVICE: &'static str = "synthesizer";

    fn ready(&self) -> bool {
        self.encoder.is_idle()
    }

    fn busy(&self) -> bool {
        self.encoder.busy()
    }

    fn submit(&mut self, request: SynthesizerWrite) -> Result<SubmitOutcome, ConfigError> {
        offer(&mut self.pending, self.encoder.is_idle(), request, Self::DEVICE)
    }

    fn tick(&mut self) {
        let request = self.pending.take();
        let payload = request.map_or(0, Self::frame);
        self.encoder.tick(request.is_some(), payload);
    }

    fn set_return_line(&mut self, level: bool) {
        self.encoder.set_miso(level);
    }

    fn pads(&self) -> PadLevels {
        let lines = self.encoder.lines();
        vec![
            (Pad::Enx, lines.csn),
            (Pad::Sclk, lines.clock),
            (Pad::Sdata, lines.mosi),
        ]
    }
}

impl CsrBus for Synthesizer {
    fn read(&self, offset: u16) -> Result<u32, CsrError> {
        self.encoder.read(offset)
    }

    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError> {
        self.encoder.write(offset, value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Synthesizer, SynthesizerConfig, SynthesizerWrite};
    use crate::framer::Framer;
    use crate::{ConfigError, CsrBus, Pad, SubmitOutcome};

    #[test]
    fn word_places_address_above_data() {
        let write = SynthesizerWrite {
            address: 0x1D,
            data: 0x8001,
        };
        assert_eq!(write.word(), 0x001D_8001);
        assert_eq!(SynthesizerWrite::from_word(write.word()), write);
        // two pad bits lead on the wire
        let payload = Synthesizer::frame(write);
        assert_eq!(payload & 0b11, 0);
        assert_eq!((payload >> 2) & 1, 0);
        assert_eq!((payload >> 3) & 1, 0);
        assert_eq!((payload >> 24) & 1, 1);
    }

    #[test]
    fn eight_bit_address_is_rejected() {
        let mut framer = Synthesizer::new(&SynthesizerConfig::default()).expect("defaults");
        assert!(matches!(
            framer.submit(SynthesizerWrite {
                address: 0x80,
                data: 0
            }),
            Err(ConfigError::FieldOutOfRange { bits: 7, .. })
        ));
        assert_eq!(
            framer.submit(SynthesizerWrite {
                address: 0x7F,
                data: 0
            }),
            Ok(SubmitOutcome::Accepted)
        );
    }

    #[test]
    fn miso_reads_back_through_bb_miso() {
        let mut framer = Synthesizer::new(&SynthesizerConfig::default()).expect("defaults");
        framer.set_return_line(true);
        framer.tick();
        framer.tick();
        assert_eq!(framer.read(0x04), Ok(1));
    }

    #[test]
    fn pads_report_synthesizer_nets() {
        let framer = Synthesizer::new(&SynthesizerConfig::default()).expect("defaults");
        assert_eq!(
            framer.pads(),
            vec![(Pad::Enx, true), (Pad::Sclk, false), (Pad::Sdata, false)]
        );
    }
}
