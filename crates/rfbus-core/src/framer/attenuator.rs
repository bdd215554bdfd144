//! 6-bit digital step attenuator (PE43602) with latched serial load.

use crate::encoder::{Encoder, LatchEncoder};
use crate::framer::{offer, reverse_bits, DeviceRequest, Framer};
use crate::{
    check_field, ConfigError, CsrBus, CsrError, LatchTiming, Pad, PadLevels, SerialTiming,
    SubmitOutcome,
};

/// Bits per transaction: two zero bits then the attenuation code.
pub const ATTENUATOR_WORD_BITS: u8 = 8;

const ATTENUATION_BITS: u8 = 6;

/// Construction parameters of an [`Attenuator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AttenuatorConfig {
    /// Cycle counter width, shared by the latch counter.
    pub cycle_bits: u8,
    /// Bit timing.
    pub timing: SerialTiming,
    /// Latch-enable pulse timing.
    pub latch: LatchTiming,
}

impl Default for AttenuatorConfig {
    fn default() -> Self {
        Self {
            cycle_bits: 8,
            timing: SerialTiming {
                end_cycle: 8,
                data: 0,
            },
            latch: LatchTiming::default(),
        }
    }
}

/// Attenuation code in device steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AttenuatorSetting {
    /// 6-bit attenuation code.
    pub attenuation: u8,
}

impl AttenuatorSetting {
    /// Device word in wire order.
    #[must_use]
    pub fn word(self) -> u32 {
        u32::from(self.attenuation & 0x3F)
    }

    /// Recovers the setting from a wire-order word.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            attenuation: word.to_le_bytes()[0] & 0x3F,
        }
    }
}

impl DeviceRequest for AttenuatorSetting {
    fn validate(&self) -> Result<(), ConfigError> {
        check_field("attenuation", u32::from(self.attenuation), ATTENUATION_BITS)
    }
}

/// Attenuator framer over the latching serial encoder.
#[derive(Debug, Clone)]
pub struct Attenuator {
    encoder: LatchEncoder,
    pending: Option<AttenuatorSetting>,
}

impl Attenuator {
    /// Builds the framer and its encoder.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid encoder configuration.
    pub fn new(config: &AttenuatorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            encoder: LatchEncoder::new(
                config.timing,
                config.latch,
                config.cycle_bits,
                ATTENUATOR_WORD_BITS,
            )?,
            pending: None,
        })
    }

    /// Underlying encoder.
    #[must_use]
    pub const fn encoder(&self) -> &LatchEncoder {
        &self.encoder
    }

    /// Encoder payload for `setting`.
    #[must_use]
    pub fn frame(setting: AttenuatorSetting) -> u32 {
        reverse_bits(setting.word(), ATTENUATOR_WORD_BITS)
    }
}

impl Framer for Attenuator {
    type Request = AttenuatorSetting;

    const DEVICE: &'static str = "attenuator";

    fn ready(&self) -> bool {
        self.encoder.is_idle()
    }

    fn busy(&self) -> bool {
        self.encoder.busy()
    }

    fn submit(&mut self, request: AttenuatorSetting) -> Result<SubmitOutcome, ConfigError> {
        offer(&mut self.pending, self.encoder.is_idle(), request, Self::DEVICE)
    }

    fn tick(&mut self) {
        let request = self.pending.take();
        let payload = request.map_or(0, Self::frame);
        self.encoder.tick(request.is_some(), payload);
    }

    fn set_return_line(&mut self, _level: bool) {}

    fn pads(&self) -> PadLevels {
        let lines = self.encoder.lines();
        vec![
            (Pad::D, lines.data),
            (Pad::Clk, lines.clock),
            (Pad::Le, lines.latch_enable),
        ]
    }
}

impl CsrBus for Attenuator {
    fn read(&self, offset: u16) -> Result<u32, CsrError> {
        self.encoder.read(offset)
    }

    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError> {
        self.encoder.write(offset, value)
    }
}
