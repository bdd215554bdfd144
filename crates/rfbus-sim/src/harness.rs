//! Tick loop driving one framer through an ordered request sequence.

use std::path::PathBuf;

use log::{debug, info};
use rfbus_core::{ConfigError, DeviceRequest, Framer, SubmitOutcome, TraceEvent, TraceSink};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ticks `busy` must stay low after the last request before a run ends.
pub const DEFAULT_QUIESCENT_TICKS: u64 = 8;
/// Upper bound on the length of a run.
pub const DEFAULT_MAX_TICKS: u64 = 1_000_000;

/// Run-level knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Quiet window closing the run.
    pub quiescent_ticks: u64,
    /// Ticks after which a run that has not gone quiet fails.
    pub max_ticks: u64,
    /// Level the device leaves on its return line (pull-up by default).
    pub peer_level: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            quiescent_ticks: DEFAULT_QUIESCENT_TICKS,
            max_ticks: DEFAULT_MAX_TICKS,
            peer_level: true,
        }
    }
}

/// Failures surfaced by the simulation layer.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The device configuration was rejected.
    #[error("invalid device configuration: {0}")]
    Config(#[from] ConfigError),
    /// A request did not fit the device word.
    #[error("request {index} rejected: {source}")]
    Request {
        /// Position in the request sequence.
        index: usize,
        /// Underlying field error.
        #[source]
        source: ConfigError,
    },
    /// The bus was still active when the tick limit was reached.
    #[error("bus did not go quiet within {max_ticks} ticks")]
    Timeout {
        /// Configured limit.
        max_ticks: u64,
    },
    /// Reading or writing a file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A scenario or trace could not be (de)serialized.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Device name.
    pub device: String,
    /// Ticks executed.
    pub ticks: u64,
    /// Tick index on which each request was accepted.
    pub accepted_at: Vec<u64>,
}

/// Drives `framer` until every request has been accepted, the last
/// transaction has finished and `busy` has stayed low for the quiet window,
/// reporting every pad change to `sink`. An empty quiet window ends the run
/// on the tick that drops `busy`; registered outputs settling after that tick
/// are then not recorded.
///
/// Pads are sampled once before the first tick (time zero) and after every
/// tick; a request accepted at time `t` is clocked in by the tick that ends
/// at `t + 1`.
///
/// # Errors
///
/// Returns [`HarnessError::Request`] before any tick when a request does not
/// fit the device, and [`HarnessError::Timeout`] when the run exceeds
/// `config.max_ticks`.
pub fn run<F, S>(
    framer: &mut F,
    requests: &[F::Request],
    config: &HarnessConfig,
    sink: &mut S,
) -> Result<RunSummary, HarnessError>
where
    F: Framer,
    S: TraceSink,
{
    for (index, request) in requests.iter().enumerate() {
        request
            .validate()
            .map_err(|source| HarnessError::Request { index, source })?;
    }

    let mut time = 0_u64;
    let mut pads = framer.pads();
    for &(pad, level) in &pads {
        sink.on_event(TraceEvent::LineChanged { time, pad, level });
    }
    let mut busy = framer.busy();
    sink.on_event(TraceEvent::BusyChanged { time, busy });

    let mut next = 0;
    let mut accepted_at = Vec::with_capacity(requests.len());
    let mut quiet = 0;
    while next < requests.len() || busy || quiet < config.quiescent_ticks {
        if time >= config.max_ticks {
            return Err(HarnessError::Timeout {
                max_ticks: config.max_ticks,
            });
        }
        if let Some(&request) = requests.get(next) {
            let outcome = framer
                .submit(request)
                .map_err(|source| HarnessError::Request {
                    index: next,
                    source,
                })?;
            if outcome == SubmitOutcome::Accepted {
                debug!("{}: request {next} accepted at tick {time}", F::DEVICE);
                sink.on_event(TraceEvent::RequestAccepted { time });
                accepted_at.push(time);
                next += 1;
            }
        }
        framer.set_return_line(config.peer_level);
        framer.tick();
        time += 1;

        let now = framer.pads();
        for (&(pad, level), &(_, before)) in now.iter().zip(&pads) {
            if level != before {
                sink.on_event(TraceEvent::LineChanged { time, pad, level });
            }
        }
        pads = now;
        if framer.busy() != busy {
            busy = framer.busy();
            sink.on_event(TraceEvent::BusyChanged { time, busy });
        }

        if next == requests.len() && !busy {
            quiet += 1;
        } else {
            quiet = 0;
        }
    }

    info!(
        "{}: {} request(s) in {time} ticks",
        F::DEVICE,
        accepted_at.len()
    );
    Ok(RunSummary {
        device: F::DEVICE.to_string(),
        ticks: time,
        accepted_at,
    })
}

#[cfg(test)]
mod tests {
    use rfbus_core::{
        Attenuator, AttenuatorConfig, AttenuatorSetting, ConfigError, LatchTiming, TraceEvent,
    };

    use super::{run, HarnessConfig, HarnessError};

    #[test]
    fn empty_sequence_stops_after_quiet_window() {
        let mut framer = Attenuator::new(&AttenuatorConfig::default()).expect("defaults");
        let mut events = Vec::new();
        let summary = run(&mut framer, &[], &HarnessConfig::default(), &mut events)
            .expect("idle run succeeds");
        assert_eq!(summary.ticks, 8);
        assert!(summary.accepted_at.is_empty());
        // three initial pad samples plus the initial busy level
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn acceptance_times_follow_transaction_length() {
        let mut framer = Attenuator::new(&AttenuatorConfig::default()).expect("defaults");
        let requests = [
            AttenuatorSetting { attenuation: 41 },
            AttenuatorSetting { attenuation: 1 },
        ];
        let mut events = Vec::new();
        let summary = run(&mut framer, &requests, &HarnessConfig::default(), &mut events)
            .expect("run succeeds");
        assert_eq!(summary.accepted_at, vec![0, 89]);
        // the tick that ends the second transaction opens the quiet window
        assert_eq!(summary.ticks, 89 + 89 + 7);
        assert!(events.contains(&TraceEvent::BusyChanged {
            time: 89,
            busy: false
        }));
    }

    #[test]
    fn empty_quiet_window_still_drives_every_request() {
        let mut framer = Attenuator::new(&AttenuatorConfig::default()).expect("defaults");
        let harness = HarnessConfig {
            quiescent_ticks: 0,
            ..HarnessConfig::default()
        };
        let requests = [
            AttenuatorSetting { attenuation: 41 },
            AttenuatorSetting { attenuation: 2 },
        ];
        let mut events = Vec::new();
        let summary = run(&mut framer, &requests, &harness, &mut events).expect("run succeeds");
        assert_eq!(summary.accepted_at, vec![0, 89]);
        assert_eq!(summary.ticks, 2 * 89);
        assert_eq!(
            events.last(),
            Some(&TraceEvent::BusyChanged {
                time: 2 * 89,
                busy: false
            })
        );
    }

    #[test]
    fn invalid_request_fails_before_any_tick() {
        let mut framer = Attenuator::new(&AttenuatorConfig::default()).expect("defaults");
        let requests = [
            AttenuatorSetting { attenuation: 3 },
            AttenuatorSetting { attenuation: 99 },
        ];
        let mut events = Vec::new();
        let err = run(&mut framer, &requests, &HarnessConfig::default(), &mut events)
            .expect_err("second request is too wide");
        assert!(matches!(
            err,
            HarnessError::Request {
                index: 1,
                source: ConfigError::FieldOutOfRange { .. }
            }
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn long_transaction_hits_the_tick_limit() {
        let config = AttenuatorConfig {
            latch: LatchTiming {
                latch_high: 5,
                latch_low: 200,
            },
            ..AttenuatorConfig::default()
        };
        let mut framer = Attenuator::new(&config).expect("valid config");
        let harness = HarnessConfig {
            max_ticks: 100,
            ..HarnessConfig::default()
        };
        let mut events = Vec::new();
        let err = run(
            &mut framer,
            &[AttenuatorSetting { attenuation: 7 }],
            &harness,
            &mut events,
        )
        .expect_err("latch phase outlasts the limit");
        assert!(matches!(err, HarnessError::Timeout { max_ticks: 100 }));
    }
}
