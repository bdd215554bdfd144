use crate::csr::{csr_field, csr_writable_field, CsrField, LATCH_CSR_MAP};
use crate::encoder::{Encoder, SerialEncoder, SerialState, Transitions};
use crate::validate::validate_latch_timing;
use crate::{
    ConfigError, CsrBus, CsrError, CycleCounter, LatchTiming, SerialEvents, SerialTiming,
    SetResetLine, TimingWarning,
};

/// Extension state of the latching serial encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatchPhase {
    /// Latch-enable pulse in progress; carries the local latch counter.
    Pulse(CycleCounter),
}

/// Pin levels of a latching serial bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatchLines {
    /// Serial data.
    pub data: bool,
    /// Serial clock.
    pub clock: bool,
    /// Latch enable.
    pub latch_enable: bool,
}

/// Serial encoder followed by a latch-enable pulse.
///
/// The latch counter exists only inside [`LatchPhase::Pulse`], so it is
/// zero whenever the encoder is in `Wait` or `Transfer`.
#[derive(Debug, Clone)]
pub struct LatchEncoder {
    serial: SerialEncoder<LatchPhase>,
    latch: LatchTiming,
    latch_enable: SetResetLine,
}

impl LatchEncoder {
    /// Creates an idle encoder with every line low.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the widths or either timing set are
    /// invalid.
    pub fn new(
        timing: SerialTiming,
        latch: LatchTiming,
        cycle_bits: u8,
        data_bits: u8,
    ) -> Result<Self, ConfigError> {
        validate_latch_timing(&latch, cycle_bits)?;
        let transitions = Transitions {
            on_start: SerialState::Transfer,
            on_end: SerialState::Extra(LatchPhase::Pulse(CycleCounter::new(cycle_bits)?)),
        };
        Ok(Self {
            serial: SerialEncoder::new(timing, cycle_bits, data_bits, transitions)?,
            latch,
            latch_enable: SetResetLine::new(false),
        })
    }

    /// Serial timing registers.
    #[must_use]
    pub const fn timing(&self) -> &SerialTiming {
        self.serial.timing()
    }

    /// Latch pulse registers.
    #[must_use]
    pub const fn latch_timing(&self) -> &LatchTiming {
        &self.latch
    }

    /// Validates and installs new serial timing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] from timing validation.
    pub fn set_timing(&mut self, timing: SerialTiming) -> Result<Vec<TimingWarning>, ConfigError> {
        self.serial.set_timing(timing)
    }

    /// Validates and installs new latch pulse timing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] from latch validation.
    pub fn set_latch_timing(&mut self, latch: LatchTiming) -> Result<(), ConfigError> {
        validate_latch_timing(&latch, self.serial.cycle_bits())?;
        self.latch = latch;
        Ok(())
    }

    /// This tick's event pulses on the bit counter.
    #[must_use]
    pub const fn events(&self) -> SerialEvents {
        self.serial.events()
    }

    /// Current pin levels.
    #[must_use]
    pub const fn lines(&self) -> LatchLines {
        LatchLines {
            data: self.serial.data(),
            clock: self.serial.clock(),
            latch_enable: self.latch_enable.level(),
        }
    }

    /// Latch counter; zero outside the pulse phase.
    #[must_use]
    pub const fn latch_counter(&self) -> u32 {
        match self.serial.state() {
            SerialState::Extra(LatchPhase::Pulse(counter)) => counter.value(),
            SerialState::Wait | SerialState::Transfer => 0,
        }
    }
}

impl Encoder for LatchEncoder {
    type State = SerialState<LatchPhase>;

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
        let (rise, fall) = match self.serial.state() {
            SerialState::Wait | SerialState::Transfer => (false, false),
            SerialState::Extra(LatchPhase::Pulse(counter)) => {
                let rise = counter.value() == self.latch.latch_high;
                let fall = counter.value() == self.latch.latch_low;
                controls.next = if fall {
                    SerialState::Wait
                } else {
                    SerialState::Extra(LatchPhase::Pulse(counter.advanced(false)))
                };
                (rise, fall)
            }
        };
        self.serial.commit(&controls, payload);
        self.latch_enable.update(rise, fall);
    }
}

impl CsrBus for LatchEncoder {
    fn read(&self, offset: u16) -> Result<u32, CsrError> {
        let CsrField::Timing(register) = csr_field(LATCH_CSR_MAP, offset)? else {
            return Err(CsrError::Unmapped { offset });
        };
        self.serial
            .timing()
            .register(register)
            .or_else(|| self.latch.register(register))
            .ok_or(CsrError::Unmapped { offset })
    }

    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError> {
        let CsrField::Timing(register) = csr_writable_field(LATCH_CSR_MAP, offset)? else {
            return Err(CsrError::Unmapped { offset });
        };
        let mut timing = *self.serial.timing();
        if let Some(slot) = timing.register_mut(register) {
            *slot = value;
            self.set_timing(timing)?;
            return Ok(());
        }
        let mut latch = self.latch;
        let slot = latch
            .register_mut(register)
            .ok_or(CsrError::Unmapped { offset })?;
        *slot = value;
        self.set_latch_timing(latch)?;
        Ok(())
    }
}
