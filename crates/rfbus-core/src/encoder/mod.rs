//! Tick-driven protocol encoders.
//!
//! Every encoder follows the same three-step tick:
//! 1. Derive the event pulses from the current counter value.
//! 2. Compute all strobes and the next state from the current state with one
//!    exhaustive match.
//! 3. Commit registers, lines, counter and state together.
//!
//! Nothing observable changes between ticks.

use std::fmt;

mod i2c;
mod latch;
mod serial;
mod spi;

pub use i2c::{I2cControls, I2cEncoder, I2cLines, I2cPort, I2cState};
pub use latch::{LatchEncoder, LatchLines, LatchPhase};
pub use serial::{BaseOnly, SerialControls, SerialEncoder, SerialState, Transitions};
pub use spi::{SpiEncoder, SpiLines, SpiPhase};

/// Synchronous serial encoder driven one tick at a time.
pub trait Encoder {
    /// Protocol state type.
    type State: Copy + Eq + fmt::Debug;

    /// Current state.
    fn state(&self) -> Self::State;

    /// Returns `true` in the idle state, the only state accepting data.
    fn is_idle(&self) -> bool;

    /// Transaction in progress; the complement of [`Encoder::is_idle`].
    fn busy(&self) -> bool {
        !self.is_idle()
    }

    /// Current value of the bit-period counter.
    fn counter(&self) -> u32;

    /// Advances one tick. `payload` is only consumed while idle.
    fn tick(&mut self, data_ready: bool, payload: u32);
}
