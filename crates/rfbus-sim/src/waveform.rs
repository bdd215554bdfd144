//! Recorded pad transitions.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rfbus_core::{Pad, TraceEvent, TraceSink};
use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// Timestamped trace of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waveform {
    events: Vec<TraceEvent>,
}

/// Changes of one pad in time order, indexed for repeated lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadTrack {
    changes: Vec<(u64, bool)>,
}

impl PadTrack {
    /// Changes as `(time, level)`, starting with the initial sample.
    #[must_use]
    pub fn changes(&self) -> &[(u64, bool)] {
        &self.changes
    }

    /// Level at `time`; `None` before the first sample. Several changes at
    /// the same time resolve to the last one.
    #[must_use]
    pub fn level_at(&self, time: u64) -> Option<bool> {
        let after = self.changes.partition_point(|(at, _)| *at <= time);
        after
            .checked_sub(1)
            .and_then(|index| self.changes.get(index))
            .map(|&(_, level)| level)
    }
}

impl TraceSink for Waveform {
    fn on_event(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

impl Waveform {
    /// Creates an empty trace.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// All recorded events in tick order.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Pads seen in the trace, in a stable order.
    #[must_use]
    pub fn pads(&self) -> Vec<Pad> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                TraceEvent::LineChanged { pad, .. } => Some(pad),
                TraceEvent::RequestAccepted { .. } | TraceEvent::BusyChanged { .. } => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Changes of `pad` as `(time, level)`, starting with its initial level.
    #[must_use]
    pub fn transitions(&self, pad: Pad) -> Vec<(u64, bool)> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                TraceEvent::LineChanged {
                    time,
                    pad: changed,
                    level,
                } if changed == pad => Some((time, level)),
                _ => None,
            })
            .collect()
    }

    /// Changes of `pad` collected once for repeated level queries.
    #[must_use]
    pub fn track(&self, pad: Pad) -> PadTrack {
        PadTrack {
            changes: self.transitions(pad),
        }
    }

    /// Level of `pad` at `time`; `None` before its first sample. Scans the
    /// whole trace, so use [`Waveform::track`] for repeated queries.
    #[must_use]
    pub fn level_at(&self, pad: Pad, time: u64) -> Option<bool> {
        self.track(pad).level_at(time)
    }

    /// Tick indices on which requests were accepted.
    #[must_use]
    pub fn accepted_at(&self) -> Vec<u64> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                TraceEvent::RequestAccepted { time } => Some(time),
                _ => None,
            })
            .collect()
    }

    /// Time of the last recorded event.
    #[must_use]
    pub fn end_time(&self) -> u64 {
        self.events.last().map_or(0, TraceEvent::time)
    }

    /// Writes the trace as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] or [`HarnessError::Json`].
    pub fn save_json(&self, path: &Path) -> Result<(), HarnessError> {
        let io = |source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = BufWriter::new(File::create(path).map_err(io)?);
        serde_json::to_writer_pretty(&mut file, self)?;
        file.flush().map_err(io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rfbus_core::{Pad, TraceEvent, TraceSink};

    use super::Waveform;

    fn sample() -> Waveform {
        let mut wave = Waveform::new();
        for event in [
            TraceEvent::LineChanged {
                time: 0,
                pad: Pad::Clk,
                level: false,
            },
            TraceEvent::LineChanged {
                time: 0,
                pad: Pad::D,
                level: false,
            },
            TraceEvent::RequestAccepted { time: 0 },
            TraceEvent::LineChanged {
                time: 3,
                pad: Pad::Clk,
                level: true,
            },
            TraceEvent::LineChanged {
                time: 7,
                pad: Pad::Clk,
                level: false,
            },
        ] {
            wave.on_event(event);
        }
        wave
    }

    #[test]
    fn level_follows_last_change() {
        let wave = sample();
        assert_eq!(wave.level_at(Pad::Clk, 2), Some(false));
        assert_eq!(wave.level_at(Pad::Clk, 3), Some(true));
        assert_eq!(wave.level_at(Pad::Clk, 100), Some(false));
        assert_eq!(wave.level_at(Pad::Le, 3), None);
    }

    #[test]
    fn track_lookup_matches_change_list() {
        let mut wave = sample();
        wave.on_event(TraceEvent::LineChanged {
            time: 7,
            pad: Pad::Clk,
            level: true,
        });
        let track = wave.track(Pad::Clk);
        assert_eq!(track.changes(), &[(0, false), (3, true), (7, false), (7, true)]);
        assert_eq!(track.level_at(0), Some(false));
        assert_eq!(track.level_at(6), Some(true));
        assert_eq!(track.level_at(7), Some(true));
        assert_eq!(wave.track(Pad::Le).level_at(100), None);
    }

    #[test]
    fn pads_are_listed_once() {
        assert_eq!(sample().pads(), vec![Pad::D, Pad::Clk]);
    }

    #[test]
    fn json_round_trip_keeps_events() {
        let wave = sample();
        let text = serde_json::to_string(&wave).expect("serializable");
        assert!(text.contains("\"kind\":\"line_changed\""));
        let back: Waveform = serde_json::from_str(&text).expect("deserializable");
        assert_eq!(back, wave);
        assert_eq!(back.accepted_at(), vec![0]);
        assert_eq!(back.end_time(), 7);
    }

    #[test]
    fn json_is_written_to_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("trace.json");
        sample().save_json(&path).expect("write succeeds");
        let text = std::fs::read_to_string(&path).expect("readable");
        assert!(text.contains("request_accepted"));
    }
}
