use std::fmt;

use log::debug;

use crate::encoder::Encoder;
use crate::validate::validate_serial_timing;
use crate::{
    BitShifter, ConfigError, SerialEvents, SerialTiming, SetResetLine, TimingBase, TimingWarning,
};

/// Extension slot for an encoder with no states beyond `Wait`/`Transfer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseOnly {}

/// State of the generic serial encoder; `X` carries extension states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialState<X> {
    /// Idle: counter held, shifter reloaded every tick.
    Wait,
    /// Shifting the payload out.
    Transfer,
    /// Protocol-specific extension state.
    Extra(X),
}

/// Injected start and end transitions, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transitions<X> {
    /// Taken from `Wait` when data is ready.
    pub on_start: SerialState<X>,
    /// Taken from `Transfer` at the end of the last bit period.
    pub on_end: SerialState<X>,
}

impl<X> Default for Transitions<X> {
    fn default() -> Self {
        Self {
            on_start: SerialState::Transfer,
            on_end: SerialState::Wait,
        }
    }
}

/// Strobes computed for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SerialControls<X> {
    /// State after this tick.
    pub next: SerialState<X>,
    /// The end-of-cycle event fired.
    pub end_of_cycle: bool,
    /// Holds the counter at zero.
    pub hold: bool,
    /// Reloads the shifter from the payload.
    pub load: bool,
    /// Shifts one bit onto the data line.
    pub shift: bool,
    /// Clock set strobe.
    pub clock_set: bool,
    /// Clock clear strobe.
    pub clock_clear: bool,
}

impl<X> SerialControls<X> {
    /// Drives both clock strobes from the clock events; extensions that run
    /// extra clock phases call this.
    pub const fn clock_from(&mut self, events: &SerialEvents) {
        self.clock_set = events.clock_high;
        self.clock_clear = events.clock_low;
    }
}

/// Two-state bit serializer with injectable transitions.
///
/// Protocol extensions wrap it: they take [`SerialEncoder::base_controls`],
/// override what their extra states need, then hand the result back to
/// [`SerialEncoder::commit`].
#[derive(Debug, Clone)]
pub struct SerialEncoder<X> {
    timing: SerialTiming,
    base: TimingBase,
    shifter: BitShifter,
    state: SerialState<X>,
    transitions: Transitions<X>,
    data: bool,
    clock: SetResetLine,
}

impl<X: Copy + Eq + fmt::Debug> SerialEncoder<X> {
    /// Creates an idle encoder with data and clock low.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the widths or the timing are invalid.
    pub fn new(
        timing: SerialTiming,
        cycle_bits: u8,
        data_bits: u8,
        transitions: Transitions<X>,
    ) -> Result<Self, ConfigError> {
        validate_serial_timing(&timing, cycle_bits)?;
        Ok(Self {
            timing,
            base: TimingBase::new(cycle_bits)?,
            shifter: BitShifter::new(data_bits)?,
            state: SerialState::Wait,
            transitions,
            data: false,
            clock: SetResetLine::new(false),
        })
    }

    /// Active timing registers.
    #[must_use]
    pub const fn timing(&self) -> &SerialTiming {
        &self.timing
    }

    /// Validates and installs new timing; the old timing stays on error.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] from timing validation.
    pub fn set_timing(&mut self, timing: SerialTiming) -> Result<Vec<TimingWarning>, ConfigError> {
        let warnings = validate_serial_timing(&timing, self.base.cycle_bits())?;
        self.timing = timing;
        Ok(warnings)
    }

    /// Cycle counter width.
    #[must_use]
    pub const fn cycle_bits(&self) -> u8 {
        self.base.cycle_bits()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> SerialState<X> {
        self.state
    }

    /// Bits left in the shifter.
    #[must_use]
    pub const fn remaining(&self) -> u8 {
        self.shifter.remaining()
    }

    /// Data line.
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
    pub const fn events(&self) -> SerialEvents {
        self.timing.events(&self.base)
    }

    /// Strobes of the two base states. Extension states get an inert
    /// control set that stays in place; the wrapper fills it in.
    #[must_use]
    pub fn base_controls(&self, data_ready: bool, events: &SerialEvents) -> SerialControls<X> {
        let mut controls = SerialControls {
            next: self.state,
            end_of_cycle: events.end_of_cycle,
            hold: false,
            load: false,
            shift: false,
            clock_set: false,
            clock_clear: false,
        };
        match self.state {
            SerialState::Wait => {
                controls.hold = true;
                controls.load = true;
                if data_ready {
                    controls.next = self.transitions.on_start;
                }
            }
            SerialState::Transfer => {
                controls.clock_from(events);
                controls.shift = events.data && !self.shifter.is_empty();
                if events.end_of_cycle && self.shifter.is_empty() {
                    controls.next = self.transitions.on_end;
                }
            }
            SerialState::Extra(_) => {}
        }
        controls
    }

    /// Ends the tick with `controls`.
    pub fn commit(&mut self, controls: &SerialControls<X>, payload: u32) {
        if controls.load {
            self.shifter.load(payload);
        } else if controls.shift {
            if let Some(bit) = self.shifter.shift() {
                self.data = bit;
            }
        }
        self.clock.update(controls.clock_set, controls.clock_clear);
        self.base.advance(controls.end_of_cycle, controls.hold);
        if controls.next != self.state {
            debug!("serial encoder {:?} -> {:?}", self.state, controls.next);
        }
        self.state = controls.next;
    }

    /// Counter value, shared with wrapping encoders.
    #[must_use]
    pub const fn counter_value(&self) -> u32 {
        self.base.counter()
    }
}

impl Encoder for SerialEncoder<BaseOnly> {
    type State = SerialState<BaseOnly>;

    fn state(&self) -> Self::State {
        self.state
    }

    fn is_idle(&self) -> bool {
        self.state == SerialState::Wait
    }

    fn counter(&self) -> u32 {
        self.base.counter()
    }

    fn tick(&mut self, data_ready: bool, payload: u32) {
        let events = self.events();
        let controls = self.base_controls(data_ready, &events);
        self.commit(&controls, payload);
    }
}
