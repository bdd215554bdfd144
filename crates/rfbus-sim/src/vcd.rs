//! Value change dump export for waveform viewers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rfbus_core::TraceEvent;

use crate::{HarnessError, Waveform};

/// Identifier of the busy trace; pads use `!`, `"`, `#`, ... in pad order.
const BUSY_ID: char = '~';

fn pad_id(index: usize) -> char {
    // printable range between '!' and '}' leaves room for the busy id
    let offset = u8::try_from(index % 93).unwrap_or(0);
    char::from(b'!' + offset)
}

/// Writes `wave` as a VCD document under scope `module`, one tick per
/// nanosecond.
///
/// # Errors
///
/// Propagates failures of `out`.
pub fn write_vcd<W: Write>(wave: &Waveform, module: &str, out: &mut W) -> io::Result<()> {
    let pads = wave.pads();
    writeln!(out, "$version rfbus-sim {} $end", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "$timescale 1ns $end")?;
    writeln!(out, "$scope module {module} $end")?;
    for (index, pad) in pads.iter().enumerate() {
        writeln!(out, "$var wire 1 {} {} $end", pad_id(index), pad.name())?;
    }
    writeln!(out, "$var wire 1 {BUSY_ID} busy $end")?;
    writeln!(out, "$upscope $end")?;
    writeln!(out, "$enddefinitions $end")?;

    let mut current: Option<u64> = None;
    let mut dumping = false;
    for event in wave.events() {
        let (time, id, level) = match *event {
            TraceEvent::LineChanged { time, pad, level } => {
                let Some(index) = pads.iter().position(|known| *known == pad) else {
                    continue;
                };
                (time, pad_id(index), level)
            }
            TraceEvent::BusyChanged { time, busy } => (time, BUSY_ID, busy),
            TraceEvent::RequestAccepted { .. } => continue,
        };
        if current != Some(time) {
            if dumping {
                writeln!(out, "$end")?;
            }
            writeln!(out, "#{time}")?;
            dumping = current.is_none();
            if dumping {
                writeln!(out, "$dumpvars")?;
            }
            current = Some(time);
        }
        writeln!(out, "{}{id}", u8::from(level))?;
    }
    if dumping {
        writeln!(out, "$end")?;
    }
    writeln!(out, "#{}", wave.end_time())?;
    Ok(())
}

/// Writes `wave` to a `.vcd` file.
///
/// # Errors
///
/// Returns [`HarnessError::Io`] when the file cannot be written.
pub fn save_vcd(wave: &Waveform, module: &str, path: &Path) -> Result<(), HarnessError> {
    let io = |source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = BufWriter::new(File::create(path).map_err(io)?);
    write_vcd(wave, module, &mut file).map_err(io)?;
    file.flush().map_err(io)
}

#[cfg(test)]
mod tests {
    use rfbus_core::{Pad, TraceEvent, TraceSink};

    use super::{save_vcd, write_vcd};
    use crate::Waveform;

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
                pad: Pad::Le,
                level: false,
            },
            TraceEvent::BusyChanged {
                time: 0,
                busy: false,
            },
            TraceEvent::RequestAccepted { time: 0 },
            TraceEvent::BusyChanged {
                time: 1,
                busy: true,
            },
            TraceEvent::LineChanged {
                time: 4,
                pad: Pad::Clk,
                level: true,
            },
        ] {
            wave.on_event(event);
        }
        wave
    }

    #[test]
    fn header_declares_every_pad() {
        let mut out = Vec::new();
        write_vcd(&sample(), "attenuator", &mut out).expect("in-memory write");
        let text = String::from_utf8(out).expect("ascii output");
        assert!(text.contains("$scope module attenuator $end"));
        assert!(text.contains("$var wire 1 ! clk $end"));
        assert!(text.contains("$var wire 1 \" le $end"));
        assert!(text.contains("$var wire 1 ~ busy $end"));
    }

    #[test]
    fn changes_are_grouped_by_time() {
        let mut out = Vec::new();
        write_vcd(&sample(), "attenuator", &mut out).expect("in-memory write");
        let text = String::from_utf8(out).expect("ascii output");
        let body: Vec<&str> = text
            .lines()
            .skip_while(|line| !line.starts_with("$enddefinitions"))
            .skip(1)
            .collect();
        assert_eq!(
            body,
            vec!["#0", "$dumpvars", "0!", "0\"", "0~", "$end", "#1", "1~", "#4", "1!", "#4"]
        );
    }

    #[test]
    fn initial_values_block_closes_at_any_start_time() {
        let mut wave = Waveform::new();
        for event in [
            TraceEvent::LineChanged {
                time: 5,
                pad: Pad::Sclk,
                level: false,
            },
            TraceEvent::LineChanged {
                time: 9,
                pad: Pad::Sclk,
                level: true,
            },
        ] {
            wave.on_event(event);
        }
        let mut out = Vec::new();
        write_vcd(&wave, "vga", &mut out).expect("in-memory write");
        let text = String::from_utf8(out).expect("ascii output");
        let body: Vec<&str> = text
            .lines()
            .skip_while(|line| !line.starts_with("$enddefinitions"))
            .skip(1)
            .collect();
        assert_eq!(body, vec!["#5", "$dumpvars", "0!", "$end", "#9", "1!", "#9"]);
    }

    #[test]
    fn single_timestamp_trace_is_terminated() {
        let mut wave = Waveform::new();
        wave.on_event(TraceEvent::LineChanged {
            time: 3,
            pad: Pad::Le,
            level: true,
        });
        let mut out = Vec::new();
        write_vcd(&wave, "attenuator", &mut out).expect("in-memory write");
        let text = String::from_utf8(out).expect("ascii output");
        assert!(text.ends_with("#3\n$dumpvars\n1!\n$end\n#3\n"));
    }

    #[test]
    fn file_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("trace.vcd");
        save_vcd(&sample(), "attenuator", &path).expect("write succeeds");
        let text = std::fs::read_to_string(&path).expect("readable");
        assert!(text.starts_with("$version"));
    }

    #[test]
    fn unwritable_path_reports_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing").join("trace.vcd");
        let err = save_vcd(&sample(), "attenuator", &path).expect_err("parent is missing");
        assert!(matches!(err, crate::HarnessError::Io { .. }));
    }
}
