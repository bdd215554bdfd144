use crate::bitbang::{SPI_BB_CLK, SPI_BB_CSN, SPI_BB_MOSI};
use crate::csr::{csr_field, csr_writable_field, CsrField, SPI_CSR_MAP};
use crate::encoder::{Encoder, SerialEncoder, SerialState, Transitions};
use crate::{
    BitBangConfig, ConfigError, CsrBus, CsrError, SerialEvents, SerialTiming, SetResetLine,
    Synchronizer, TimingWarning,
};

/// Extension states of the SPI-style encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiPhase {
    /// One clock period before the first data bit.
    FirstClock,
    /// One clock period after the last bit; chip-select rises here.
    ChipSelectRelease,
}

/// Pin levels of an SPI bus after the bit-bang overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiLines {
    /// Controller data out.
    pub mosi: bool,
    /// Chip select, active low.
    pub csn: bool,
    /// Serial clock.
    pub clock: bool,
}

/// Serial encoder with SPI framing, chip-select shaping and bit-bang
/// override.
#[derive(Debug, Clone)]
pub struct SpiEncoder {
    serial: SerialEncoder<SpiPhase>,
    csn: SetResetLine,
    bit_bang: BitBangConfig,
    miso_in: bool,
    miso: Synchronizer,
}

impl SpiEncoder {
    /// Creates an idle encoder with chip-select high.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the widths or the timing are invalid.
    pub fn new(
        timing: SerialTiming,
        cycle_bits: u8,
        data_bits: u8,
        bit_bang: BitBangConfig,
    ) -> Result<Self, ConfigError> {
        let transitions = Transitions {
            on_start: SerialState::Extra(SpiPhase::FirstClock),
            on_end: SerialState::Extra(SpiPhase::ChipSelectRelease),
        };
        let mut bit_bang = bit_bang;
        bit_bang.set_out(bit_bang.out);
        Ok(Self {
            serial: SerialEncoder::new(timing, cycle_bits, data_bits, transitions)?,
            csn: SetResetLine::new(true),
            bit_bang,
            miso_in: false,
            miso: Synchronizer::new(false),
        })
    }

    /// Serial timing registers.
    #[must_use]
    pub const fn timing(&self) -> &SerialTiming {
        self.serial.timing()
    }

    /// Validates and installs new timing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] from timing validation.
    pub fn set_timing(&mut self, timing: SerialTiming) -> Result<Vec<TimingWarning>, ConfigError> {
        self.serial.set_timing(timing)
    }

    /// This tick's event pulses.
    #[must_use]
    pub const fn events(&self) -> SerialEvents {
        self.serial.events()
    }

    /// Bit-bang registers.
    #[must_use]
    pub const fn bit_bang(&self) -> BitBangConfig {
        self.bit_bang
    }

    /// Replaces the bit-bang registers.
    pub const fn set_bit_bang(&mut self, bit_bang: BitBangConfig) {
        self.bit_bang.enable = bit_bang.enable;
        self.bit_bang.set_out(bit_bang.out);
    }

    /// Drives the MISO pad; it reaches [`SpiEncoder::miso`] through the
    /// synchronizer.
    pub const fn set_miso(&mut self, level: bool) {
        self.miso_in = level;
    }

    /// Synchronized MISO level.
    #[must_use]
    pub const fn miso(&self) -> bool {
        self.miso.output()
    }

    /// Chip-select as shaped by the encoder, before the overlay.
    #[must_use]
    pub const fn encoder_csn(&self) -> bool {
        self.csn.level()
    }

    /// Pin levels after the bit-bang overlay.
    #[must_use]
    pub const fn lines(&self) -> SpiLines {
        if self.bit_bang.enable {
            SpiLines {
                mosi: self.bit_bang.bit(SPI_BB_MOSI),
                csn: self.bit_bang.bit(SPI_BB_CSN),
                clock: self.bit_bang.bit(SPI_BB_CLK),
            }
        } else {
            SpiLines {
                mosi: self.serial.data(),
                csn: self.csn.level(),
                clock: self.serial.clock(),
            }
        }
    }
}

impl Encoder for SpiEncoder {
    type State = SerialState<SpiPhase>;

    fn state(&self) -> Self::State {
        self.serial.state()
    }

    fn is_idle(&self) -> bool {
        self.serial.state() == SerialState::Wait
    }

    fn counter(&self) -> u32 {
        self.serial.counter_value()
    }

    fn tick(&mut self, data_ready: bool, payload: u32) {
        let events = self.serial.events();
        let mut controls = self.serial.base_controls(data_ready, &events);
        // chip-select only ever moves on a data event
        let (csn_set, csn_clear) = match self.serial.state() {
            SerialState::Wait => (false, false),
            SerialState::Transfer => (false, events.data),
            SerialState::Extra(SpiPhase::FirstClock) => {
                controls.clock_from(&events);
                if events.end_of_cycle {
                    controls.next = SerialState::Transfer;
                }
                (false, false)
            }
            SerialState::Extra(SpiPhase::ChipSelectRelease) => {
                controls.clock_from(&events);
                if events.end_of_cycle {
                    controls.next = SerialState::Wait;
                }
                (events.data, false)
            }
        };
        self.miso.sample(self.miso_in);
        self.serial.commit(&controls, payload);
        self.csn.update(csn_set, csn_clear);
    }
}

impl CsrBus for SpiEncoder {
    fn read(&self, offset: u16) -> Result<u32, CsrError> {
        match csr_field(SPI_CSR_MAP, offset)? {
            CsrField::Timing(register) => self
                .serial
                .timing()
                .register(register)
                .ok_or(CsrError::Unmapped { offset }),
            CsrField::BitBangEnable => Ok(u32::from(self.bit_bang.enable)),
            CsrField::BitBangOut => Ok(u32::from(self.bit_bang.out)),
            CsrField::BitBangInput => Ok(u32::from(self.miso())),
        }
    }

    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError> {
        match csr_writable_field(SPI_CSR_MAP, offset)? {
            CsrField::Timing(register) => {
                let mut timing = *self.serial.timing();
                let slot = timing
                    .register_mut(register)
                    .ok_or(CsrError::Unmapped { offset })?;
                *slot = value;
                self.set_timing(timing)?;
            }
            CsrField::BitBangEnable => self.bit_bang.enable = value & 1 != 0,
            CsrField::BitBangOut => self.bit_bang.set_out(value.to_le_bytes()[0]),
            CsrField::BitBangInput => return Err(CsrError::ReadOnly { offset }),
        }
        Ok(())
    }
}
