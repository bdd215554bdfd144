//! JSON scenario files: one device, its configuration and a request list.

use std::fs;
use std::path::Path;

use log::info;
use rfbus_core::{
    Attenuator, AttenuatorConfig, AttenuatorSetting, Framer, GainSetting, IoExpander,
    IoExpanderConfig, Pad, RegisterWrite, Synthesizer, SynthesizerConfig, SynthesizerWrite, Vga,
    VgaConfig,
};
use serde::{Deserialize, Serialize};

use crate::decode::{bits_to_word, i2c_frames, sample_on_rising, spi_frames};
use crate::harness::{run, HarnessConfig, HarnessError, RunSummary};
use crate::Waveform;

/// Device under test with its construction parameters and requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceScenario {
    /// I2C I/O expander register writes.
    IoExpander {
        /// Framer configuration.
        #[serde(default)]
        config: IoExpanderConfig,
        /// Writes in submission order.
        requests: Vec<RegisterWrite>,
    },
    /// Latched attenuator codes.
    Attenuator {
        /// Framer configuration.
        #[serde(default)]
        config: AttenuatorConfig,
        /// Codes in submission order.
        requests: Vec<AttenuatorSetting>,
    },
    /// SPI synthesizer register writes.
    Synthesizer {
        /// Framer configuration.
        #[serde(default)]
        config: SynthesizerConfig,
        /// Writes in submission order.
        requests: Vec<SynthesizerWrite>,
    },
    /// SPI variable-gain amplifier updates.
    Vga {
        /// Framer configuration.
        #[serde(default)]
        config: VgaConfig,
        /// Gain updates in submission order.
        requests: Vec<GainSetting>,
    },
}

/// A complete simulation input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Device and requests.
    pub device: DeviceScenario,
    /// Run limits.
    #[serde(default)]
    pub harness: HarnessConfig,
}

/// Everything produced by running a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Harness result.
    pub summary: RunSummary,
    /// Recorded pad activity.
    pub waveform: Waveform,
    /// Requests recovered from the pads, one line each.
    pub decoded: Vec<String>,
}

impl Scenario {
    /// Reads a scenario from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Io`] when the file cannot be read and
    /// [`HarnessError::Json`] when it does not parse.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Attenuator demonstration: code 41, then a walking one over all six
    /// bits, back to back.
    #[must_use]
    pub fn attenuator_demo() -> Self {
        let requests = std::iter::once(41)
            .chain((0..6).map(|shift| 1 << shift))
            .map(|attenuation| AttenuatorSetting { attenuation })
            .collect();
        Self {
            device: DeviceScenario::Attenuator {
                config: AttenuatorConfig::default(),
                requests,
            },
            harness: HarnessConfig::default(),
        }
    }

    /// Name of the simulated device.
    #[must_use]
    pub const fn device_name(&self) -> &'static str {
        match self.device {
            DeviceScenario::IoExpander { .. } => IoExpander::DEVICE,
            DeviceScenario::Attenuator { .. } => Attenuator::DEVICE,
            DeviceScenario::Synthesizer { .. } => Synthesizer::DEVICE,
            DeviceScenario::Vga { .. } => Vga::DEVICE,
        }
    }

    /// Builds the framer, drives every request through it and decodes the
    /// resulting pads.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] for a rejected configuration and any
    /// error of [`run`].
    pub fn run(&self) -> Result<ScenarioReport, HarnessError> {
        let mut waveform = Waveform::new();
        let summary = match &self.device {
            DeviceScenario::IoExpander { config, requests } => {
                run(&mut IoExpander::new(config)?, requests, &self.harness, &mut waveform)?
            }
            DeviceScenario::Attenuator { config, requests } => {
                run(&mut Attenuator::new(config)?, requests, &self.harness, &mut waveform)?
            }
            DeviceScenario::Synthesizer { config, requests } => {
                run(&mut Synthesizer::new(config)?, requests, &self.harness, &mut waveform)?
            }
            DeviceScenario::Vga { config, requests } => {
                run(&mut Vga::new(config)?, requests, &self.harness, &mut waveform)?
            }
        };
        let decoded = self.decode(&waveform);
        info!(
            "{}: decoded {} request(s) from the pads",
            self.device_name(),
            decoded.len()
        );
        Ok(ScenarioReport {
            summary,
            waveform,
            decoded,
        })
    }

    fn decode(&self, wave: &Waveform) -> Vec<String> {
        match self.device {
            DeviceScenario::IoExpander { .. } => i2c_frames(wave, Pad::Scl, Pad::Sda)
                .into_iter()
                .filter_map(|frame| {
                    let bytes: [u8; 4] = frame.bytes.as_slice().try_into().ok()?;
                    let (address, write) = RegisterWrite::from_word(u32::from_be_bytes(bytes));
                    Some(format!(
                        "@{} address {address:#04x} register {:#04x} data {:#06x}",
                        frame.start, write.register, write.data
                    ))
                })
                .collect(),
            DeviceScenario::Attenuator { .. } => sample_on_rising(wave, Pad::Clk, Pad::D)
                .chunks_exact(8)
                .map(|bits| {
                    let setting = AttenuatorSetting::from_word(bits_to_word(bits));
                    format!("attenuation {}", setting.attenuation)
                })
                .collect(),
            DeviceScenario::Synthesizer { .. } => spi_frames(wave, Pad::Enx, Pad::Sclk, Pad::Sdata)
                .into_iter()
                .map(|frame| {
                    let write = SynthesizerWrite::from_word(frame.word());
                    format!(
                        "@{} address {:#04x} data {:#06x}",
                        frame.select, write.address, write.data
                    )
                })
                .collect(),
            DeviceScenario::Vga { .. } => spi_frames(wave, Pad::Scsb, Pad::Sclk, Pad::Sdi)
                .into_iter()
                .map(|frame| {
                    let setting = GainSetting::from_word(frame.word());
                    format!(
                        "@{} channel {:?} gain {}",
                        frame.select, setting.channel, setting.gain
                    )
                })
                .collect(),
        }
    }
}
