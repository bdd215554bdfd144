//! Cycle-accurate serial bus encoders for programming RF front-end devices.

/// Boundary error types and request field checks.
pub mod error;
pub use error::{check_field, ConfigError, CsrError};

/// Cycle counters, timing registers and event derivation.
pub mod timing;
pub use timing::{
    check_cycle_bits, counter_max, CycleCounter, I2cEvents, I2cTiming, LatchTiming, SerialEvents,
    SerialTiming, TimingBase, TimingRegister, MAX_CYCLE_BITS, MIN_CYCLE_BITS,
};

/// Timing validation and hazard reporting.
pub mod validate;
pub use validate::{
    check_offset, validate_i2c_timing, validate_latch_timing, validate_serial_timing,
    TimingWarning,
};

/// LSB-first load/shift register.
pub mod shifter;
pub use shifter::{BitShifter, MAX_DATA_BITS};

/// Registered and tri-state bus lines.
pub mod line;
pub use line::{SetResetLine, TriState};

/// Input synchronizer for externally timed levels.
pub mod synchronizer;
pub use synchronizer::{Synchronizer, SYNCHRONIZER_STAGES};

/// Bit-bang override registers.
pub mod bitbang;
pub use bitbang::{
    BitBangConfig, BIT_BANG_OUT_MASK, I2C_BB_SCL, I2C_BB_SDA_OE, I2C_BB_SDA_OUT, SPI_BB_CLK,
    SPI_BB_CSN, SPI_BB_MOSI,
};

/// Configuration register maps.
pub mod csr;
pub use csr::{csr_field, csr_writable_field, CsrField, I2C_CSR_MAP, LATCH_CSR_MAP, SPI_CSR_MAP};

/// Public host-facing contracts.
pub mod api;
pub use api::{CsrBus, Pad, PadLevels, SubmitOutcome, TraceEvent, TraceSink};

/// Protocol encoders.
pub mod encoder;
pub use encoder::{
    BaseOnly, Encoder, I2cControls, I2cEncoder, I2cLines, I2cPort, I2cState, LatchEncoder,
    LatchLines, LatchPhase, SerialControls, SerialEncoder, SerialState, SpiEncoder, SpiLines,
    SpiPhase, Transitions,
};

/// Device framers.
pub mod framer;
pub use framer::{
    reverse_bits, Attenuator, AttenuatorConfig, AttenuatorSetting, DeviceRequest, Framer,
    GainSetting, IoExpander, IoExpanderConfig, RegisterWrite, Synthesizer, SynthesizerConfig,
    SynthesizerWrite, Vga, VgaChannel, VgaConfig, ATTENUATOR_WORD_BITS,
    IO_EXPANDER_DEFAULT_ADDRESS, IO_EXPANDER_WORD_BITS, SYNTHESIZER_WORD_BITS, VGA_WORD_BITS,
};

#[cfg(test)]
use proptest as _;
