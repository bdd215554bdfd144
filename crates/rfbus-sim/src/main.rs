//! CLI entry point for the rfbus simulator.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use log::{error, info};
use rfbus_core as _;
use rfbus_sim::{save_vcd, HarnessError, Scenario, ScenarioReport};
use serde as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use thiserror as _;

const USAGE_TEXT: &str = "\
Usage: rfbus-sim <command> [options]

Commands:
  run  <scenario.json> [options]  Simulate a scenario file
  demo [options]                  Simulate the attenuator walking-one demo

Options:
  --vcd <file>   Write the pad waveform as a value change dump
  --json <file>  Write the raw trace as JSON
  -h, --help     Show this help message

Logging is controlled with RUST_LOG (for example RUST_LOG=debug).

Examples:
  rfbus-sim demo --vcd attenuator.vcd
  rfbus-sim run scenarios/io_expander.json --json trace.json
";

#[derive(Debug, PartialEq, Eq)]
enum Source {
    File(PathBuf),
    Demo,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    source: Source,
    vcd: Option<PathBuf>,
    json: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Run(RunArgs),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args, true).map(ParseResult::Run),
        "demo" => parse_run_args(args, false).map(ParseResult::Run),
        other => Err(format!("unknown command: {other}")),
    }
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(
    mut args: impl Iterator<Item = OsString>,
    needs_input: bool,
) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut vcd: Option<PathBuf> = None;
    let mut json: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--vcd" || arg == "--json" {
            let value = args
                .next()
                .ok_or_else(|| format!("missing value for {}", arg.to_string_lossy()))?;
            if arg == "--vcd" {
                vcd = Some(PathBuf::from(value));
            } else {
                json = Some(PathBuf::from(value));
            }
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if !needs_input {
            return Err("demo takes no scenario path".to_string());
        }
        if input.is_some() {
            return Err("multiple scenario paths provided".to_string());
        }
        input = Some(PathBuf::from(arg));
    }

    let source = if needs_input {
        Source::File(input.ok_or_else(|| "missing scenario path".to_string())?)
    } else {
        Source::Demo
    };
    Ok(RunArgs { source, vcd, json })
}

fn simulate(args: &RunArgs) -> Result<ScenarioReport, HarnessError> {
    let scenario = match &args.source {
        Source::File(path) => Scenario::load(path)?,
        Source::Demo => Scenario::attenuator_demo(),
    };
    info!("simulating {}", scenario.device_name());
    let report = scenario.run()?;

    if let Some(path) = &args.vcd {
        save_vcd(&report.waveform, scenario.device_name(), path)?;
        info!("wrote {}", path.display());
    }
    if let Some(path) = &args.json {
        report.waveform.save_json(path)?;
        info!("wrote {}", path.display());
    }
    Ok(report)
}

fn run_command(args: &RunArgs) -> Result<(), i32> {
    let report = simulate(args).map_err(|e| {
        error!("{e}");
        eprintln!("error: {e}");
        1
    })?;

    println!(
        "{}: {} request(s) in {} ticks",
        report.summary.device,
        report.summary.accepted_at.len(),
        report.summary.ticks
    );
    for (accepted, line) in report.summary.accepted_at.iter().zip(&report.decoded) {
        println!("  accepted @{accepted}: {line}");
    }
    if report.decoded.len() != report.summary.accepted_at.len() {
        eprintln!(
            "error: decoded {} request(s) from the pads, expected {}",
            report.decoded.len(),
            report.summary.accepted_at.len()
        );
        return Err(2);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(args)) => match run_command(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
