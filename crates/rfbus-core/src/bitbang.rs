//! Manual line override registers.

/// Mask of the three-bit override vector.
pub const BIT_BANG_OUT_MASK: u8 = 0b111;

/// I2C override bit driving SDA output-enable.
pub const I2C_BB_SDA_OE: u8 = 0;
/// I2C override bit driving the SDA level.
pub const I2C_BB_SDA_OUT: u8 = 1;
/// I2C override bit driving SCL.
pub const I2C_BB_SCL: u8 = 2;

/// SPI override bit driving MOSI.
pub const SPI_BB_MOSI: u8 = 0;
/// SPI override bit driving chip-select.
pub const SPI_BB_CSN: u8 = 1;
/// SPI override bit driving the clock.
pub const SPI_BB_CLK: u8 = 2;

/// Bit-bang mode register and override vector for one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BitBangConfig {
    /// Lines follow `out` instead of the encoder.
    pub enable: bool,
    /// Override vector; bit meaning depends on the bus.
    pub out: u8,
}

impl BitBangConfig {
    /// Reset state for an I2C bus: encoder in control, vector cleared.
    #[must_use]
    pub const fn i2c() -> Self {
        Self {
            enable: false,
            out: 0,
        }
    }

    /// Reset state for an SPI bus: encoder in control, chip-select
    /// deasserted in the vector.
    #[must_use]
    pub const fn spi() -> Self {
        Self {
            enable: false,
            out: 1 << SPI_BB_CSN,
        }
    }

    /// Reads one override bit.
    #[must_use]
    pub const fn bit(self, index: u8) -> bool {
        self.out & (1 << index) != 0
    }

    /// Stores an override vector, dropping bits beyond the vector width.
    pub const fn set_out(&mut self, out: u8) {
        self.out = out & BIT_BANG_OUT_MASK;
    }
}
