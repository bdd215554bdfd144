//! Host-facing contracts: pads, submission handshake, configuration bus and
//! trace hooks.

use std::fmt;

use crate::CsrError;

/// Named device pads driven or sampled by a framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Pad {
    /// I2C clock.
    Scl,
    /// I2C data, resolved wire level.
    Sda,
    /// I2C data drive enable.
    SdaOe,
    /// Attenuator serial data.
    D,
    /// Attenuator serial clock.
    Clk,
    /// Attenuator latch enable.
    Le,
    /// Synthesizer chip enable (active low).
    Enx,
    /// SPI serial clock.
    Sclk,
    /// Synthesizer serial data in.
    Sdata,
    /// VGA chip select (active low).
    Scsb,
    /// VGA serial data in.
    Sdi,
}

impl Pad {
    /// Pad name as wired on the board.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scl => "scl",
            Self::Sda => "sda",
            Self::SdaOe => "sda_oe",
            Self::D => "d",
            Self::Clk => "clk",
            Self::Le => "le",
            Self::Enx => "enx",
            Self::Sclk => "sclk",
            Self::Sdata => "sdata",
            Self::Scsb => "scsb",
            Self::Sdi => "sdi",
        }
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pad levels sampled after a tick, in a fixed per-device order.
pub type PadLevels = Vec<(Pad, bool)>;

/// Answer to a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SubmitOutcome {
    /// The request is latched and leaves with the next tick.
    Accepted,
    /// The encoder is mid-transaction; retry on a later tick.
    Busy,
}

/// Register-level configuration surface of one encoder.
pub trait CsrBus {
    /// Reads the register at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CsrError::Unmapped`] when nothing lives at `offset`.
    fn read(&self, offset: u16) -> Result<u32, CsrError>;

    /// Writes the register at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CsrError::Unmapped`] or [`CsrError::ReadOnly`] for bad
    /// offsets and [`CsrError::Rejected`] when the resulting configuration
    /// fails validation; the register keeps its old value in both cases.
    fn write(&mut self, offset: u16, value: u32) -> Result<(), CsrError>;
}

/// Timestamped observations recorded while driving a framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum TraceEvent {
    /// A pad changed level (or was first sampled, at time zero).
    LineChanged {
        /// Ticks elapsed when the level was observed.
        time: u64,
        /// Pad that changed.
        pad: Pad,
        /// New level.
        level: bool,
    },
    /// The framer accepted a request on the tick starting at `time`.
    RequestAccepted {
        /// Tick index of the acceptance.
        time: u64,
    },
    /// The busy output changed.
    BusyChanged {
        /// Ticks elapsed when the change was observed.
        time: u64,
        /// New busy level.
        busy: bool,
    },
}

impl TraceEvent {
    /// Timestamp of the event.
    #[must_use]
    pub const fn time(&self) -> u64 {
        match *self {
            Self::LineChanged { time, .. }
            | Self::RequestAccepted { time }
            | Self::BusyChanged { time, .. } => time,
        }
    }
}

/// Sink for trace events, in tick order.
pub trait TraceSink {
    /// Records one event.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}
