use std::fmt;

use crate::ConfigError;

/// Narrowest supported cycle counter.
pub const MIN_CYCLE_BITS: u8 = 1;
/// Widest supported cycle counter.
pub const MAX_CYCLE_BITS: u8 = 16;

/// Largest value a `bits`-wide counter reaches before wrapping.
#[must_use]
pub const fn counter_max(bits: u8) -> u32 {
    (1_u32 << bits) - 1
}

/// Validates a cycle counter width.
///
/// # Errors
///
/// Returns [`ConfigError::CycleBitsOutOfRange`] outside
/// `MIN_CYCLE_BITS..=MAX_CYCLE_BITS`.
pub const fn check_cycle_bits(bits: u8) -> Result<(), ConfigError> {
    if bits < MIN_CYCLE_BITS || bits > MAX_CYCLE_BITS {
        return Err(ConfigError::CycleBitsOutOfRange { bits });
    }
    Ok(())
}

/// Wrapping counter of a fixed bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CycleCounter {
    bits: u8,
    value: u32,
}

impl CycleCounter {
    /// Creates a zeroed counter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CycleBitsOutOfRange`] for unsupported widths.
    pub const fn new(bits: u8) -> Result<Self, ConfigError> {
        match check_cycle_bits(bits) {
            Ok(()) => Ok(Self { bits, value: 0 }),
            Err(err) => Err(err),
        }
    }

    /// Counter width in bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.bits
    }

    /// Current count.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.value
    }

    /// Largest count before wrapping to zero.
    #[must_use]
    pub const fn max(self) -> u32 {
        counter_max(self.bits)
    }

    /// Value after one tick: zero when `reset`, otherwise incremented modulo
    /// the counter width.
    #[must_use]
    pub const fn advanced(self, reset: bool) -> Self {
        let value = if reset {
            0
        } else {
            (self.value + 1) & counter_max(self.bits)
        };
        Self {
            bits: self.bits,
            value,
        }
    }

    /// Applies one tick in place.
    pub const fn advance(&mut self, reset: bool) {
        *self = self.advanced(reset);
    }
}

/// Named timing registers across every encoder family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TimingRegister {
    /// Counter value closing a bit period; also the clock-low event.
    EndCycle,
    /// Clock rising edge (I2C only; serial encoders derive it).
    ClockHigh,
    /// Per-bit data event.
    Data,
    /// I2C start condition.
    Start,
    /// I2C stop condition, data low.
    StopLow,
    /// I2C stop condition, data high.
    StopHigh,
    /// Latch-enable rising edge on the latch counter.
    LatchHigh,
    /// Latch-enable falling edge on the latch counter.
    LatchLow,
}

impl TimingRegister {
    /// Register name as used in configuration maps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EndCycle => "end_cycle",
            Self::ClockHigh => "clk_high",
            Self::Data => "data",
            Self::Start => "start",
            Self::StopLow => "stop_low",
            Self::StopHigh => "stop_high",
            Self::LatchHigh => "le_high",
            Self::LatchLow => "le_low",
        }
    }
}

impl fmt::Display for TimingRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Free-running cycle counter with end-of-cycle wrap.
///
/// Events are plain comparisons against the current count; they are level
/// signals that hold for the single tick where the count matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingBase {
    counter: CycleCounter,
}

impl TimingBase {
    /// Creates a timing base with the counter at zero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CycleBitsOutOfRange`] for unsupported widths.
    pub const fn new(cycle_bits: u8) -> Result<Self, ConfigError> {
        match CycleCounter::new(cycle_bits) {
            Ok(counter) => Ok(Self { counter }),
            Err(err) => Err(err),
        }
    }

    /// Current counter value.
    #[must_use]
    pub const fn counter(&self) -> u32 {
        self.counter.value()
    }

    /// Counter width.
    #[must_use]
    pub const fn cycle_bits(&self) -> u8 {
        self.counter.bits()
    }

    /// Returns `true` on the tick where the counter equals `offset`.
    #[must_use]
    pub const fn fires(&self, offset: u32) -> bool {
        self.counter.value() == offset
    }

    /// Ends the tick: the counter resets when `end_of_cycle` fired or the
    /// owning state holds it, and increments otherwise.
    pub const fn advance(&mut self, end_of_cycle: bool, hold: bool) {
        self.counter.advance(end_of_cycle || hold);
    }
}

/// Timing registers of the I2C-style encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct I2cTiming {
    /// Bit period end; clock falls here.
    pub end_cycle: u32,
    /// Clock rising edge.
    pub clock_high: u32,
    /// Data bit update.
    pub data: u32,
    /// Start condition data edge.
    pub start: u32,
    /// Stop condition, data pulled low.
    pub stop_low: u32,
    /// Stop condition, data released high.
    pub stop_high: u32,
}

impl Default for I2cTiming {
    fn default() -> Self {
        Self {
            end_cycle: 300,
            clock_high: 175,
            data: 90,
            start: 200,
            stop_low: 90,
            stop_high: 275,
        }
    }
}

/// Event pulses of the I2C-style encoder for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct I2cEvents {
    /// Counter reached `end_cycle`.
    pub end_of_cycle: bool,
    /// Counter reached `clock_high`.
    pub clock_high: bool,
    /// Clock falling edge; shares the end-of-cycle comparator.
    pub clock_low: bool,
    /// Counter reached `data`.
    pub data: bool,
    /// Counter reached `start`.
    pub start: bool,
    /// Counter reached `stop_low`.
    pub stop_low: bool,
    /// Counter reached `stop_high`.
    pub stop_high: bool,
}

impl I2cTiming {
    /// Derives this tick's events from the timing base.
    #[must_use]
    pub const fn events(&self, base: &TimingBase) -> I2cEvents {
        I2cEvents {
            end_of_cycle: base.fires(self.end_cycle),
            clock_high: base.fires(self.clock_high),
            clock_low: base.fires(self.end_cycle),
            data: base.fires(self.data),
            start: base.fires(self.start),
            stop_low: base.fires(self.stop_low),
            stop_high: base.fires(self.stop_high),
        }
    }

    /// Mutable access to a register by name; `None` when this encoder has no
    /// such register.
    pub const fn register_mut(&mut self, register: TimingRegister) -> Option<&mut u32> {
        match register {
            TimingRegister::EndCycle => Some(&mut self.end_cycle),
            TimingRegister::ClockHigh => Some(&mut self.clock_high),
            TimingRegister::Data => Some(&mut self.data),
            TimingRegister::Start => Some(&mut self.start),
            TimingRegister::StopLow => Some(&mut self.stop_low),
            TimingRegister::StopHigh => Some(&mut self.stop_high),
            TimingRegister::LatchHigh | TimingRegister::LatchLow => None,
        }
    }

    /// Reads a register by name.
    #[must_use]
    pub const fn register(&self, register: TimingRegister) -> Option<u32> {
        match register {
            TimingRegister::EndCycle => Some(self.end_cycle),
            TimingRegister::ClockHigh => Some(self.clock_high),
            TimingRegister::Data => Some(self.data),
            TimingRegister::Start => Some(self.start),
            TimingRegister::StopLow => Some(self.stop_low),
            TimingRegister::StopHigh => Some(self.stop_high),
            TimingRegister::LatchHigh | TimingRegister::LatchLow => None,
        }
    }
}

/// Timing registers of the generic serial encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerialTiming {
    /// Bit period end; clock falls here and rises at half of it.
    pub end_cycle: u32,
    /// Data bit update, also the chip-select edge for SPI.
    pub data: u32,
}

impl Default for SerialTiming {
    fn default() -> Self {
        Self {
            end_cycle: 20,
            data: 0,
        }
    }
}

/// Event pulses of the generic serial encoder for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerialEvents {
    /// Counter reached `end_cycle`.
    pub end_of_cycle: bool,
    /// Counter reached `end_cycle / 2`.
    pub clock_high: bool,
    /// Clock falling edge; shares the end-of-cycle comparator.
    pub clock_low: bool,
    /// Counter reached `data`.
    pub data: bool,
}

impl SerialTiming {
    /// Clock rising offset, half of the bit period.
    #[must_use]
    pub const fn clock_high(&self) -> u32 {
        self.end_cycle >> 1
    }

    /// Derives this tick's events from the timing base.
    #[must_use]
    pub const fn events(&self, base: &TimingBase) -> SerialEvents {
        SerialEvents {
            end_of_cycle: base.fires(self.end_cycle),
            clock_high: base.fires(self.clock_high()),
            clock_low: base.fires(self.end_cycle),
            data: base.fires(self.data),
        }
    }

    /// Mutable access to a register by name.
    pub const fn register_mut(&mut self, register: TimingRegister) -> Option<&mut u32> {
        match register {
            TimingRegister::EndCycle => Some(&mut self.end_cycle),
            TimingRegister::Data => Some(&mut self.data),
            _ => None,
        }
    }

    /// Reads a register by name.
    #[must_use]
    pub const fn register(&self, register: TimingRegister) -> Option<u32> {
        match register {
            TimingRegister::EndCycle => Some(self.end_cycle),
            TimingRegister::Data => Some(self.data),
            _ => None,
        }
    }
}

/// Latch-enable pulse offsets, counted from entry into the latch phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LatchTiming {
    /// Latch-enable rises.
    pub latch_high: u32,
    /// Latch-enable falls and the encoder returns to idle.
    pub latch_low: u32,
}

impl Default for LatchTiming {
    fn default() -> Self {
        Self {
            latch_high: 5,
            latch_low: 15,
        }
    }
}

impl LatchTiming {
    /// Mutable access to a register by name.
    pub const fn register_mut(&mut self, register: TimingRegister) -> Option<&mut u32> {
        match register {
            TimingRegister::LatchHigh => Some(&mut self.latch_high),
            TimingRegister::LatchLow => Some(&mut self.latch_low),
            _ => None,
        }
    }

    /// Reads a register by name.
    #[must_use]
    pub const fn register(&self, register: TimingRegister) -> Option<u32> {
        match register {
            TimingRegister::LatchHigh => Some(self.latch_high),
            TimingRegister::LatchLow => Some(self.latch_low),
            _ => None,
        }
    }
}
