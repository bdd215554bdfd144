//! Recover transmitted words from a recorded waveform.

use std::collections::BTreeSet;

use rfbus_core::Pad;
use serde::Serialize;

use crate::waveform::PadTrack;
use crate::Waveform;

/// Bytes seen between one I2C start and stop condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct I2cFrame {
    /// Time of the start condition.
    pub start: u64,
    /// Time of the stop condition.
    pub stop: u64,
    /// Data bytes, acknowledge clocks removed.
    pub bytes: Vec<u8>,
}

/// Bits clocked while chip-select was low.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpiFrame {
    /// Time chip-select fell.
    pub select: u64,
    /// Bits in wire order.
    pub bits: Vec<bool>,
}

impl SpiFrame {
    /// Bits packed most significant first.
    #[must_use]
    pub fn word(&self) -> u32 {
        bits_to_word(&self.bits)
    }
}

/// Packs bits most significant first; only the last 32 bits survive.
#[must_use]
pub fn bits_to_word(bits: &[bool]) -> u32 {
    bits.iter()
        .fold(0_u32, |word, bit| (word << 1) | u32::from(*bit))
}

/// Times at which `clock` rises.
#[must_use]
pub fn rising_edges(wave: &Waveform, clock: Pad) -> Vec<u64> {
    wave.transitions(clock)
        .windows(2)
        .filter(|pair| !pair[0].1 && pair[1].1)
        .map(|pair| pair[1].0)
        .collect()
}

/// `data` sampled on every rising edge of `clock`.
#[must_use]
pub fn sample_on_rising(wave: &Waveform, clock: Pad, data: Pad) -> Vec<bool> {
    let data = wave.track(data);
    rising_edges(wave, clock)
        .into_iter()
        .filter_map(|time| data.level_at(time))
        .collect()
}

/// Times at which any of `tracks` changed, in order.
fn change_times(tracks: &[&PadTrack]) -> Vec<u64> {
    tracks
        .iter()
        .flat_map(|track| track.changes().iter().map(|&(time, _)| time))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Decodes I2C write frames: bytes are sampled on SCL rising edges between a
/// start condition (SDA falls while SCL is high) and a stop condition (SDA
/// rises while SCL is high). Every ninth clock is the acknowledge slot and
/// is dropped, as is any incomplete trailing group.
#[must_use]
pub fn i2c_frames(wave: &Waveform, scl: Pad, sda: Pad) -> Vec<I2cFrame> {
    let mut frames = Vec::new();
    let (scl, sda) = (wave.track(scl), wave.track(sda));
    let mut open: Option<(u64, Vec<bool>)> = None;
    let mut prev: Option<(bool, bool)> = None;
    for time in change_times(&[&scl, &sda]) {
        let (Some(clock), Some(data)) = (scl.level_at(time), sda.level_at(time)) else {
            continue;
        };
        if let Some((was_clock, was_data)) = prev {
            if was_clock && clock && was_data && !data {
                open = Some((time, Vec::new()));
            } else if was_clock && clock && !was_data && data {
                if let Some((start, bits)) = open.take() {
                    frames.push(I2cFrame {
                        start,
                        stop: time,
                        bytes: bits
                            .chunks_exact(9)
                            .map(|chunk| bits_to_word(&chunk[..8]).to_le_bytes()[0])
                            .collect(),
                    });
                }
            } else if !was_clock && clock {
                if let Some((_, bits)) = open.as_mut() {
                    bits.push(data);
                }
            }
        }
        prev = Some((clock, data));
    }
    frames
}

/// Decodes SPI frames: `data` is sampled on `clock` rising edges while
/// `select` is low, one frame per chip-select window.
#[must_use]
pub fn spi_frames(wave: &Waveform, select: Pad, clock: Pad, data: Pad) -> Vec<SpiFrame> {
    let mut frames = Vec::new();
    let (select, clock, data) = (wave.track(select), wave.track(clock), wave.track(data));
    let mut open: Option<SpiFrame> = None;
    let mut prev: Option<(bool, bool)> = None;
    for time in change_times(&[&select, &clock]) {
        let (Some(selected_high), Some(level)) = (select.level_at(time), clock.level_at(time))
        else {
            continue;
        };
        if let Some((was_high, was_level)) = prev {
            if was_high && !selected_high {
                open = Some(SpiFrame {
                    select: time,
                    bits: Vec::new(),
                });
            } else if !was_high && selected_high {
                frames.extend(open.take());
            }
            if !selected_high && !was_level && level {
                if let (Some(frame), Some(bit)) = (open.as_mut(), data.level_at(time)) {
                    frame.bits.push(bit);
                }
            }
        }
        prev = Some((selected_high, level));
    }
    frames
}

#[cfg(test)]
mod tests {
    use rfbus_core::{Pad, TraceEvent, TraceSink};

    use super::{bits_to_word, i2c_frames, rising_edges, spi_frames};
    use crate::Waveform;

    fn wave(changes: &[(u64, Pad, bool)]) -> Waveform {
        let mut wave = Waveform::new();
        for &(time, pad, level) in changes {
            wave.on_event(TraceEvent::LineChanged { time, pad, level });
        }
        wave
    }

    #[test]
    fn packs_msb_first() {
        assert_eq!(bits_to_word(&[true, false, true, true]), 0b1011);
        assert_eq!(bits_to_word(&[]), 0);
    }

    #[test]
    fn finds_rising_edges_only() {
        let wave = wave(&[
            (0, Pad::Clk, false),
            (2, Pad::Clk, true),
            (4, Pad::Clk, false),
            (6, Pad::Clk, true),
        ]);
        assert_eq!(rising_edges(&wave, Pad::Clk), vec![2, 6]);
    }

    #[test]
    fn decodes_single_i2c_byte() {
        // start, 0xA1 with ack clock, stop
        let mut changes = vec![(0, Pad::Scl, true), (0, Pad::Sda, true), (1, Pad::Sda, false)];
        let mut time = 2;
        changes.push((time, Pad::Scl, false));
        for bit in [true, false, true, false, false, false, false, true, false] {
            time += 1;
            changes.push((time, Pad::Sda, bit));
            time += 1;
            changes.push((time, Pad::Scl, true));
            time += 1;
            changes.push((time, Pad::Scl, false));
        }
        time += 1;
        changes.push((time, Pad::Sda, false));
        time += 1;
        changes.push((time, Pad::Scl, true));
        time += 1;
        changes.push((time, Pad::Sda, true));

        let frames = i2c_frames(&wave(&changes), Pad::Scl, Pad::Sda);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].start, 1);
        assert_eq!(frames[0].stop, time);
        assert_eq!(frames[0].bytes, vec![0xA1]);
    }

    #[test]
    fn spi_bits_outside_chip_select_are_ignored() {
        let wave = wave(&[
            (0, Pad::Scsb, true),
            (0, Pad::Sclk, false),
            (0, Pad::Sdi, true),
            (1, Pad::Sclk, true),
            (2, Pad::Sclk, false),
            (3, Pad::Scsb, false),
            (4, Pad::Sclk, true),
            (5, Pad::Sclk, false),
            (5, Pad::Sdi, false),
            (6, Pad::Sclk, true),
            (7, Pad::Scsb, true),
            (8, Pad::Sclk, false),
            (9, Pad::Sclk, true),
        ]);
        let frames = spi_frames(&wave, Pad::Scsb, Pad::Sclk, Pad::Sdi);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].select, 3);
        assert_eq!(frames[0].bits, vec![true, false]);
        assert_eq!(frames[0].word(), 0b10);
    }
}
