use log::debug;

use crate::bitbang::{I2C_BB_SCL, I2C_BB_SDA_OE, I2C_BB_SDA_OUT};
use crate::csr::{csr_field, csr_writable_field, CsrField, I2C_CSR_MAP};
use crate::encoder::Encoder;
use crate::validate::validate_i2c_timing;
use crate::{
    BitBangConfig, BitShifter, ConfigError, CsrBus, CsrError, I2cEvents, I2cTiming, SetResetLine,
    Synchronizer, TimingBase, TimingWarning, TriState,
};

/// State of the I2C-style encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum I2cState {
    /// Idle: counter held, shifter reloaded every tick.
    Wait,
    /// Start condition: data falls while the clock is high.
    Start,
    /// Shifting a byte out.
    Transfer,
    /// Ninth clock of a byte; the acknowledge bit is not sampled.
    Ack,
    /// Stop condition: data rises while the clock is high.
    Stop,
}

/// Strobes computed for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct I2cControls {
    /// State after this tick.
    pub next: I2cState,
    /// Holds the counter at zero.
    pub hold: bool,
    /// Reloads the shifter from the payload.
    pub load: bool,
    /// Shifts one bit onto the data line.
    pub shift: bool,
    /// Pulls data low for the start condition.
    pub start: bool,
    /// Pulls data low ahead of the stop condition.
    pub stop_low: bool,
    /// Releases data high for the stop condition.
    pub stop_high: bool,
    /// Clock set strobe.
    pub clock_set: bool,
    /// Clock clear strobe.
    pub clock_clear: bool,
}

/// Five-state I2C write encoder.
#[derive(Debug, Clone)]
pub struct I2cEncoder {
    timing: I2cTiming,
    base: TimingBase,
    shifter: BitShifter,
    state: I2cState,
    data: bool,
    clock: SetResetLine,
}

impl I2cEncoder {
    /// Creates an idle encoder with both lines high.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the widths or the timing are invalid.
    pub fn new(timing: I2cTiming, cycle_bits: u8, data_bits: u8) -> Result<Self, ConfigError> {
        validate_i2c_timing(&timing, cycle_bits)?;
        Ok(Self {
            timing,
            base: TimingBase::new(cycle_bits)?,
            shifter: BitShifter::new(data_bits)?,
            state: I2cState::Wait,
            data: true,
            clock: SetResetLine::new(true),
        })
    }

    /// Active timing registers.
    #[must_use]
    pub const fn timing(&self) -> &I2cTiming {
        &self.timing
    }

    /// Validates and installs new timing; the old timing stays on error.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] from timing validation.
    pub fn set_timing(&mut self, timing: I2cTiming) -> Result<Vec<TimingWarning>, ConfigError> {
        let warnings = validate_i2c_timing(&timing, self.base.cycle_bits())?;
        self.timing = timing;
        Ok(warnings)
    }

    /// Bits left in the shifter.
    #[must_use]
    pub const fn remaining(&self) -> u8 {
        self.shifter.remaining()
    }

    /// Data line as driven by the encoder.
    #[must_use]
    pub const fn data(&self) -> bool {
        self.data
    }

    /// Clock line.
    #[must_use]
    pub const fn clock(&self) -> bool {
        self.clock.level()
    }

    /// This tick's event pulses.
    #[must_use]
    pub const fn events(&self) -> I2cEvents {
        self.timing.events(&self.base)
    }

    /// Strobes and next state for this tick.
    #[must_use]
    pub const fn controls(&self, data_ready: bool, events: &I2cEvents) -> I2cControls {
        let mut controls = I2cControls {
            next: self.state,
            hold: false,
            load: false,
            shift: false,
            start: false,
            stop_low: false,
            stop_high: false,
            clock_set: false,
            clock_clear: false,
        };
        match self.state {
            I2cState::Wait => {
                controls.hold = true;
                controls.load = true;
                if data_ready {
                    controls.next = I2cState::Start;
                }
            }
            I2cState::Start => {
                controls.clock_set = events.clock_high;
                controls.clock_clear = events.clock_low;
                controls.start = events.start;
                if events.end_of_cycle {
                    controls.next = I2cState::Transfer;
                }
            }
            I2cState::Transfer => {
                controls.clock_set = events.clock_high;
                controls.clock_clear = events.clock_low;
                controls.shift = events.data && !self.shifter.is_empty();
                if events.end_of_cycle && self.shifter.at_byte_boundary() {
                    controls.next = I2cState::Ack;
                }
            }
            I2cState::Ack => {
                controls.clock_set = events.clock_high;
                controls.clock_clear = events.clock_low;
                if events.end_of_cycle {
                    controls.next = if self.shifter.is_empty() {
                        I2cState::Stop
                    } else {
                        I2cState::Transfer
                    };
                }
            }
            I2cState::Stop => {
                // the clock is left high for the bus to idle
                controls.clock_set = events.clock_high;
                controls.stop_low = events.stop_low;
                controls.stop_high = events.stop_high;
                if events.end_of_cycle {
                    controls.next = I2cState::Wait;
                }
            }
        }
        controls
    }

    fn commit(&mut self, controls: &I2cControls, end_of_cycle: bool, payload: u32) {
        if controls.load {
            self.shifter.load(payload);
        } else if controls.shift {
            if let Some(bit) = self.shifter.shift() {
                self.data = bit;
            }
        } else if controls.start || controls.stop_low {
            self.data = false;
        } else if controls.stop_high {
            self.data = true;
        }
        self.clock.update(controls.clock_set, controls.clock_clear);
        self.base.advance(end_of_cycle, controls.hold);
        if controls.next != self.state {
            debug!("i2c encoder {:?} -> {:?}", self.state, controls.next);
        }
        self.state = controls.next;
    }
}

impl Encoder for I2cEncoder {
    type State = I2cState;

    fn state(&self) -> Self::State {
        self.state
    }

    fn is_idle(&self) -> bool {
        self.state == I2cState::Wait
    }

    fn counter(&self) -> u32 {
        self.base.counter()
    }

    fn tick(&mut self, data_ready: bool, payload: u32) {
        let events = self.events();
        let controls = self.controls(data_ready, &events);
        self.commit(&controls, events.end_of_cycle, payload);
    }
}

/// Pin levels of an I2C bus after the bit-bang overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cLines {
    /// Clock.
    pub scl: bool,
    /// Data driver.
    pub sda: TriState,
}

/// I2C encoder with bit-bang overlay and synchronized SDA read-back.
#[derive(Debug, Clone)]
pub struct I2cPort {
    encoder: I2cEncoder,
    bit_bang: BitBangConfig,
    sda_in: bool,
    sda_sync: Synchronizer,
}

impl I2cPort {
    /// Wraps `encoder` with the given overlay registers. The bus is assumed
    /// pulled up until [`I2cPort::set_sda_input`] says otherwise.
    #[must_use]
    pub const fn new(encoder: I2cEncoder, bit_bang: BitBangConfig) -> Self {
        let mut bit_bang = bit_bang;
        bit_bang.set_out(bit_bang.out);
        Self {
            encoder,
            bit_bang,
            sda_in: true,
            sda_sync: Synchronizer::new(true),
        }
    }

    /// Underlying encoder.
    #[must_use]
    pub const fn encoder(&self) -> &I2cEncoder {
        &self.encoder
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

    /// Level other parties leave on SDA while this side does not drive it.
    pub const fn set_sda_input(&mut self, level: bool) {
        self.sda_in = level;
    }

    /// Pin levels after the overlay.
    #[must_use]
    pub const fn lines(&self) -> I2cLines {
        if self.bit_bang.enable {
            I2cLines {
                scl: self.bit_bang.bit(I2C_BB_SCL),
                sda: TriState {
                    output_enable: self.bit_bang.bit(I2C_BB_SDA_OE),
                    output: self.bit_bang.bit(I2C_BB_SDA_OUT),
                },
            }
        } else {
            I2cLines {
                scl: self.encoder.clock(),
                sda: TriState {
                    output_enable: true,
                    output: self.encoder.data(),
                },
            }
        }
    }

    /// Resolved SDA wire level.
    #[must_use]
    pub const fn sda_level(&self) -> bool {
        self.lines().sda.resolve(self.sda_in)
    }

    /// Synchronized SDA read-back, available in either mode.
    #[must_use]
    pub const fn sda_readback(&self) -> bool {
        self.sda_sync.output()
    }
}

impl Encoder for I2cPort {
    type State = I2cState;

    fn state(&self) -> Self::State {
        self.encoder.state
    }

    fn is_idle(&self) -> bool {
        self.encoder.is_idle()
    }

    fn counter(&self) -> u32 {
        self.encoder.counter()
    }

    fn tick(&mut self, data_ready: bool, payload: u32) {
        self.sda_sync.sample(self.sda_level());
        self.encoder.tick(data_ready, payload);
    }
}

impl CsrBus for I2cPort {
    fn read(&self, offset: u16) -> Result<u32, CsrError> {
        match csr_field(I2C_CSR_MAP, offset)? {
            CsrField::Timing(register) => self
                .encoder
                .timing()
                .register(register)
                .ok_or(CsrError::Unmapped { offset }),
            CsrField::BitBangEnable => Ok(u32::from(self.bit_bang.enable)),
            CsrField::BitBangOut => Ok(u32::from(self.bit_bang.out)),
            CsrField::BitBangInput => Ok(u32::from(self.sda_readback())),
        }
    }

    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError> {
        match csr_writable_field(I2C_CSR_MAP, offset)? {
            CsrField::Timing(register) => {
                let mut timing = *self.encoder.timing();
                let slot = timing
                    .register_mut(register)
                    .ok_or(CsrError::Unmapped { offset })?;
                *slot = value;
                self.encoder.set_timing(timing)?;
            }
            CsrField::BitBangEnable => self.bit_bang.enable = value & 1 != 0,
            CsrField::BitBangOut => self.bit_bang.set_out(value.to_le_bytes()[0]),
            CsrField::BitBangInput => return Err(CsrError::ReadOnly { offset }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{I2cEncoder, I2cPort, I2cState};
    use crate::encoder::Encoder;
    use crate::{BitBangConfig, CsrBus, CsrError, I2cTiming};

    fn small_timing() -> I2cTiming {
        I2cTiming {
            end_cycle: 20,
            clock_high: 10,
            data: 5,
            start: 12,
            stop_low: 5,
            stop_high: 18,
        }
    }

    fn encoder(data_bits: u8) -> I2cEncoder {
        I2cEncoder::new(small_timing(), 8, data_bits).expect("valid configuration")
    }

    fn state_trace(enc: &mut I2cEncoder, payload: u32) -> Vec<I2cState> {
        enc.tick(true, payload);
        let mut states = vec![enc.state()];
        while enc.busy() {
            enc.tick(false, 0);
            if states.last() != Some(&enc.state()) {
                states.push(enc.state());
            }
        }
        states
    }

    #[test]
    fn resets_idle_with_both_lines_high() {
        let enc = encoder(8);
        assert!(enc.is_idle());
        assert!(enc.data());
        assert!(enc.clock());
    }

    #[test]
    fn one_byte_gets_one_ack_then_stop() {
        let mut enc = encoder(8);
        assert_eq!(
            state_trace(&mut enc, 0x5A),
            vec![
                I2cState::Start,
                I2cState::Transfer,
                I2cState::Ack,
                I2cState::Stop,
                I2cState::Wait,
            ]
        );
    }

    #[test]
    fn ack_follows_each_byte() {
        let mut enc = encoder(16);
        assert_eq!(
            state_trace(&mut enc, 0xBEEF),
            vec![
                I2cState::Start,
                I2cState::Transfer,
                I2cState::Ack,
                I2cState::Transfer,
                I2cState::Ack,
                I2cState::Stop,
                I2cState::Wait,
            ]
        );
    }

    #[rstest]
    #[case(8, 1 + 8 + 1 + 1)]
    #[case(16, 1 + 16 + 2 + 1)]
    #[case(32, 1 + 32 + 4 + 1)]
    fn transaction_length_counts_every_phase(#[case] bits: u8, #[case] periods: u32) {
        let mut enc = encoder(bits);
        enc.tick(true, u32::MAX);
        let mut ticks = 0;
        while enc.busy() {
            enc.tick(false, 0);
            ticks += 1;
        }
        assert_eq!(ticks, periods * 21);
    }

    #[test]
    fn start_and_stop_conditions_toggle_data_under_high_clock() {
        let mut enc = encoder(8);
        enc.tick(true, 0xFF);
        let mut samples = Vec::new();
        while enc.busy() {
            enc.tick(false, 0);
            samples.push((enc.clock(), enc.data()));
        }
        let start = samples
            .windows(2)
            .position(|w| w[0] == (true, true) && w[1] == (true, false));
        let stop = samples
            .windows(2)
            .rposition(|w| w[0] == (true, false) && w[1] == (true, true));
        assert!(start.is_some());
        assert!(stop.is_some());
        assert!(start < stop);
        assert_eq!(samples.last(), Some(&(true, true)));
    }

    #[test]
    fn port_overlay_follows_bit_bang_vector() {
        let mut port = I2cPort::new(encoder(8), BitBangConfig::i2c());
        let lines = port.lines();
        assert!(lines.scl);
        assert!(lines.sda.output_enable);

        port.write(0x07, 0b110).expect("bb_out is writable");
        port.write(0x06, 1).expect("bb_enable is writable");
        let lines = port.lines();
        assert!(lines.scl);
        assert!(!lines.sda.output_enable);
        assert!(lines.sda.output);
    }

    #[test]
    fn released_sda_reads_back_the_peer() {
        let mut port = I2cPort::new(encoder(8), BitBangConfig::i2c());
        port.write(0x07, 0b000).expect("bb_out is writable");
        port.write(0x06, 1).expect("bb_enable is writable");
        port.set_sda_input(false);
        assert!(!port.sda_level());
        port.tick(false, 0);
        assert_eq!(port.read(0x08), Ok(1));
        port.tick(false, 0);
        assert_eq!(port.read(0x08), Ok(0));
        assert_eq!(port.write(0x08, 1), Err(CsrError::ReadOnly { offset: 8 }));
    }

    #[test]
    fn timing_write_is_validated() {
        let mut port = I2cPort::new(encoder(8), BitBangConfig::i2c());
        assert!(matches!(port.write(0x02, 20), Err(CsrError::Rejected(_))));
        assert_eq!(port.read(0x02), Ok(5));
        port.write(0x02, 4).expect("data offset inside the period");
        assert_eq!(port.encoder().timing().data, 4);
    }
}
