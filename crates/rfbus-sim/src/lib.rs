//! Simulation harness for the rfbus encoders: drives a device framer through
//! a request sequence, records every pad change and turns the recording back
//! into device requests, JSON traces or VCD files.

use env_logger as _;

/// Recovery of transmitted words from recorded pads.
pub mod decode;
/// Tick loop, run limits and error type.
pub mod harness;
/// JSON scenario files.
pub mod scenario;
/// Value change dump export.
pub mod vcd;
/// Recorded pad transitions.
pub mod waveform;

pub use decode::{bits_to_word, i2c_frames, rising_edges, sample_on_rising, spi_frames};
pub use decode::{I2cFrame, SpiFrame};
pub use harness::{run, HarnessConfig, HarnessError, RunSummary};
pub use harness::{DEFAULT_MAX_TICKS, DEFAULT_QUIESCENT_TICKS};
pub use scenario::{DeviceScenario, Scenario, ScenarioReport};
pub use vcd::{save_vcd, write_vcd};
pub use waveform::{PadTrack, Waveform};
