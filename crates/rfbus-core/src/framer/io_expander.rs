//! 16-bit I2C I/O expander (PCA9555 register writes).

use crate::encoder::{Encoder, I2cEncoder, I2cPort};
use crate::framer::{offer, reverse_bits, DeviceRequest, Framer};
use crate::{
    check_field, BitBangConfig, ConfigError, CsrBus, CsrError, I2cTiming, Pad, PadLevels,
    SubmitOutcome,
};

/// Bits per transaction: address byte, register byte, two data bytes.
pub const IO_EXPANDER_WORD_BITS: u8 = 32;
/// Device address with all address pins tied low.
pub const IO_EXPANDER_DEFAULT_ADDRESS: u8 = 0x20;

/// Construction parameters of an [`IoExpander`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IoExpanderConfig {
    /// 7-bit device address.
    pub address: u8,
    /// Cycle counter width.
    pub cycle_bits: u8,
    /// Encoder timing.
    pub timing: I2cTiming,
    /// Initial bit-bang registers.
    pub bit_bang: BitBangConfig,
}

impl Default for IoExpanderConfig {
    fn default() -> Self {
        Self {
            address: IO_EXPANDER_DEFAULT_ADDRESS,
            cycle_bits: 9,
            timing: I2cTiming::default(),
            bit_bang: BitBangConfig::i2c(),
        }
    }
}

/// Write of one 16-bit register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterWrite {
    /// Command byte selecting the register.
    pub register: u8,
    /// Register pair contents, first byte in the high half.
    pub data: u16,
}

impl RegisterWrite {
    /// Device word in wire order, most significant bit first on the wire.
    #[must_use]
    pub fn word(self, address: u8) -> u32 {
        u32::from(self.data) | (u32::from(self.register) << 16) | (u32::from(address & 0x7F) << 25)
    }

    /// Splits a wire-order word into device address and request.
    #[must_use]
    pub const fn from_word(word: u32) -> (u8, Self) {
        let [head, register, high, low] = word.to_be_bytes();
        (
            head >> 1,
            Self {
                register,
                data: u16::from_be_bytes([high, low]),
            },
        )
    }
}

impl DeviceRequest for RegisterWrite {
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// I/O expander framer over the I2C port.
#[derive(Debug, Clone)]
pub struct IoExpander {
    port: I2cPort,
    address: u8,
    pending: Option<RegisterWrite>,
}

impl IoExpander {
    /// Builds the framer and its encoder.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an address wider than 7 bits or an
    /// invalid encoder configuration.
    pub fn new(config: &IoExpanderConfig) -> Result<Self, ConfigError> {
        check_field("address", u32::from(config.address), 7)?;
        let encoder = I2cEncoder::new(config.timing, config.cycle_bits, IO_EXPANDER_WORD_BITS)?;
        Ok(Self {
            port: I2cPort::new(encoder, config.bit_bang),
            address: config.address,
            pending: None,
        })
    }

    /// Device address.
    #[must_use]
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Underlying port.
    #[must_use]
    pub const fn port(&self) -> &I2cPort {
        &self.port
    }

    /// Encoder payload for `request`.
    #[must_use]
    pub fn frame(&self, request: RegisterWrite) -> u32 {
        reverse_bits(request.word(self.address), IO_EXPANDER_WORD_BITS)
    }
}

impl Framer for IoExpander {
    type Request = RegisterWrite;

    const DEVICE: &'static str = "io-expander";

    fn ready(&self) -> bool {
        self.port.is_idle()
    }

    fn busy(&self) -> bool {
        self.port.busy()
    }

    fn submit(&mut self, request: RegisterWrite) -> Result<SubmitOutcome, ConfigError> {
        offer(&mut self.pending, self.port.is_idle(), request, Self::DEVICE)
    }

    fn tick(&mut self) {
        let request = self.pending.take();
        let payload = request.map_or(0, |request| self.frame(request));
        self.port.tick(request.is_some(), payload);
    }

    fn set_return_line(&mut self, level: bool) {
        self.port.set_sda_input(level);
    }

    fn pads(&self) -> PadLevels {
        let lines = self.port.lines();
        vec![
            (Pad::Scl, lines.scl),
            (Pad::Sda, self.port.sda_level()),
            (Pad::SdaOe, lines.sda.output_enable),
        ]
    }
}

impl CsrBus for IoExpander {
    fn read(&self, offset: u16) -> Result<u32, CsrError> {
        self.port.read(offset)
    }

    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError> {
        self.port.write(offset, value)
    }
}
