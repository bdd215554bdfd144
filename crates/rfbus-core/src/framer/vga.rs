//! Dual-channel digital variable gain amplifier (LMH6521).

use crate::encoder::{Encoder, SpiEncoder};
use crate::framer::{offer, reverse_bits, DeviceRequest, Framer};
use crate::{
    check_field, BitBangConfig, ConfigError, CsrBus, CsrError, Pad, PadLevels, SerialTiming,
    SubmitOutcome,
};

/// Bits per transaction: one 16-bit frame per channel update.
pub const VGA_WORD_BITS: u8 = 16;

const GAIN_BITS: u8 = 6;

/// Amplifier channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum VgaChannel {
    /// Channel A.
    A,
    /// Channel B.
    B,
}

impl VgaChannel {
    const fn bit(self) -> u32 {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

/// Construction parameters of a [`Vga`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VgaConfig {
    /// Cycle counter width.
    pub cycle_bits: u8,
    /// Bit timing.
    pub timing: SerialTiming,
    /// Initial bit-bang registers.
    pub bit_bang: BitBangConfig,
}

impl Default for VgaConfig {
    fn default() -> Self {
        Self {
            cycle_bits: 8,
            timing: SerialTiming::default(),
            bit_bang: BitBangConfig::spi(),
        }
    }
}

/// Gain update for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct GainSetting {
    /// Target channel.
    pub channel: VgaChannel,
    /// 6-bit gain code.
    pub gain: u8,
}

impl GainSetting {
    /// Device word in wire order: channel, enable, gain, trailing zero.
    #[must_use]
    pub fn word(self) -> u32 {
        (u32::from(self.gain & 0x3F) << 1) | (1 << 7) | (self.channel.bit() << 8)
    }

    /// Recovers the setting from a wire-order word.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        let [_, _, high, low] = word.to_be_bytes();
        Self {
            channel: if high & 1 == 0 {
                VgaChannel::A
            } else {
                VgaChannel::B
            },
            gain: (low >> 1) & 0x3F,
        }
    }
}

impl DeviceRequest for GainSetting {
    fn validate(&self) -> Result<(), ConfigError> {
        check_field("gain", u32::from(self.gain), GAIN_BITS)
    }
}

/// VGA framer over the SPI encoder.
#[derive(Debug, Clone)]
pub struct Vga {
    encoder: SpiEncoder,
    pending: Option<GainSetting>,
}

impl Vga {
    /// Builds the framer and its encoder.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid encoder configuration.
    pub fn new(config: &VgaConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            encoder: SpiEncoder::new(
                config.timing,
                config.cycle_bits,
                VGA_WORD_BITS,
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

    /// Encoder payload for `setting`.
    #[must_use]
    pub fn frame(setting: GainSetting) -> u32 {
        reverse_bits(setting.word(), VGA_WORD_BITS)
    }
}

impl Framer for Vga {
    type Request = GainSetting;

    const DEVICE: &'static str = "vga";

    fn ready(&self) -> bool {
        self.encoder.is_idle()
    }

    fn busy(&self) -> bool {
        self.encoder.busy()
    }

    fn submit(&mut self, request: GainSetting) -> Result<SubmitOutcome, ConfigError> {
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
            (Pad::Scsb, lines.csn),
            (Pad::Sclk, lines.clock),
            (Pad::Sdi, lines.mosi),
        ]
    }
}

impl CsrBus for Vga {
    fn read(&self, offset: u16) -> Result<u32, CsrError> {
        self.encoder.read(offset)
    }

    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError> {
        self.encoder.write(offset, value)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{GainSetting, Vga, VgaChannel, VgaConfig};
    use crate::framer::Framer;
    use crate::{ConfigError, Pad};

    #[rstest]
    #[case(VgaChannel::A, 0, 0x0080)]
    #[case(VgaChannel::A, 0x3F, 0x00FE)]
    #[case(VgaChannel::B, 0x15, 0x01AA)]
    fn word_layout(#[case] channel: VgaChannel, #[case] gain: u8, #[case] word: u32) {
        let setting = GainSetting { channel, gain };
        assert_eq!(setting.word(), word);
        assert_eq!(GainSetting::from_word(word), setting);
    }

    #[test]
    fn seven_zero_bits_lead_the_frame() {
        let payload = Vga::frame(GainSetting {
            channel: VgaChannel::B,
            gain: 0x3F,
        });
        assert_eq!(payload & 0x7F, 0);
        assert_eq!((payload >> 7) & 1, 1);
    }

    #[test]
    fn wide_gain_is_rejected() {
        let mut framer = Vga::new(&VgaConfig::default()).expect("defaults");
        assert!(matches!(
            framer.submit(GainSetting {
                channel: VgaChannel::A,
                gain: 64
            }),
            Err(ConfigError::FieldOutOfRange { field: "gain", .. })
        ));
        assert!(framer.ready());
    }

    #[test]
    fn pads_report_vga_nets() {
        let framer = Vga::new(&VgaConfig::default()).expect("defaults");
        let names: Vec<Pad> = framer.pads().into_iter().map(|(pad, _)| pad).collect();
        assert_eq!(names, vec![Pad::Scsb, Pad::Sclk, Pad::Sdi]);
    }
}
