//! Deterministic waveform fingerprint used for cross-host comparison.
//!
//! Drives one representative transaction through every framer and hashes the
//! pad levels after each tick.

use log as _;
use proptest as _;
use rfbus_core::{
    Attenuator, AttenuatorConfig, AttenuatorSetting, Framer, GainSetting, IoExpander,
    IoExpanderConfig, RegisterWrite, Synthesizer, SynthesizerConfig, SynthesizerWrite, Vga,
    VgaChannel, VgaConfig,
};
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const QUIET_TICKS: u32 = 8;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn hash_run<F: Framer>(hash: &mut u64, framer: &mut F, request: F::Request) {
    let mut pending = Some(request);
    let mut quiet = 0;
    let mut ticks = 0_u64;
    while quiet < QUIET_TICKS {
        if let Some(request) = pending {
            if matches!(framer.submit(request), Ok(rfbus_core::SubmitOutcome::Accepted)) {
                pending = None;
            }
        }
        framer.tick();
        ticks += 1;
        for (pad, level) in framer.pads() {
            hash_bytes(hash, pad.name().as_bytes());
            hash_bytes(hash, &[u8::from(level)]);
        }
        if pending.is_none() && !framer.busy() {
            quiet += 1;
        } else {
            quiet = 0;
        }
    }
    hash_bytes(hash, F::DEVICE.as_bytes());
    hash_bytes(hash, &ticks.to_le_bytes());
}

fn fingerprint() -> String {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;

    let mut expander =
        IoExpander::new(&IoExpanderConfig::default()).expect("default expander config");
    hash_run(
        &mut hash,
        &mut expander,
        RegisterWrite {
            register: 0x06,
            data: 0x00FF,
        },
    );

    let mut attenuator =
        Attenuator::new(&AttenuatorConfig::default()).expect("default attenuator config");
    hash_run(
        &mut hash,
        &mut attenuator,
        AttenuatorSetting {
            attenuation: 0b10_1001,
        },
    );

    let mut synthesizer =
        Synthesizer::new(&SynthesizerConfig::default()).expect("default synthesizer config");
    hash_run(
        &mut hash,
        &mut synthesizer,
        SynthesizerWrite {
            address: 0x09,
            data: 0x2B40,
        },
    );

    let mut vga = Vga::new(&VgaConfig::default()).expect("default vga config");
    hash_run(
        &mut hash,
        &mut vga,
        GainSetting {
            channel: VgaChannel::B,
            gain: 0x20,
        },
    );

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
