//! Device profiles: which logical commands a model implements and the literal command
//! templates it understands.
//!
//! Profiles are either built in (see [`rigol_dp800`], [`hp_6632b`] and [`chroma_62000`]) or
//! loaded from TOML:
//!
//! ```toml
//! vendor = "Rigol"
//! model = "DP832"
//! channels = ["1", "2", "3"]
//!
//! [[commands]]
//! command = "get_meas_voltage"
//! template = ":MEAS:VOLT? CH{channel}"
//! ```

use std::{collections::HashSet, path::Path};

use serde::Deserialize;
use strfmt::strfmt;

use crate::{command::ScpiCommand, error::ConfigError, types::Channel};

/// One entry of a [`CapabilityTable`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Capability {
    pub command: ScpiCommand,
    /// Command string with `{channel}`/`{value}` placeholders.
    pub template: String,
}

/// Ordered set of the logical commands a model implements.
///
/// Built through [`CapabilityTable::new`], which rejects duplicates and templates using
/// placeholders their command does not provide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityTable {
    entries: Vec<Capability>,
}

impl CapabilityTable {
    pub fn new(entries: Vec<Capability>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.command) {
                return Err(ConfigError::DuplicateCommand(entry.command));
            }
            // Formatting with stand-in arguments catches unknown placeholders and bad braces.
            strfmt(&entry.template, &entry.command.placeholder_arguments()).map_err(|e| {
                ConfigError::InvalidTemplate {
                    command: entry.command,
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(Self { entries })
    }

    /// Build a table from static `(command, template)` pairs.
    pub fn from_static(entries: &[(ScpiCommand, &str)]) -> Result<Self, ConfigError> {
        Self::new(
            entries
                .iter()
                .map(|(command, template)| Capability {
                    command: *command,
                    template: template.to_string(),
                })
                .collect(),
        )
    }

    /// Template for `command`, or `None` if this model doesn't implement it.
    pub fn template(&self, command: ScpiCommand) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.command == command)
            .map(|entry| entry.template.as_str())
    }

    pub fn supports(&self, command: ScpiCommand) -> bool {
        self.template(command).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Capability table plus identification of the model it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub vendor: String,
    pub model: String,
    /// Natural channel order of the model. May be empty if the session supplies channels.
    pub channels: Vec<String>,
    pub commands: CapabilityTable,
}

/// On-disk shape of a profile, before validation.
#[derive(Debug, Deserialize)]
struct ProfileFile {
    vendor: String,
    model: String,
    #[serde(default)]
    channels: Vec<String>,
    #[serde(default)]
    commands: Vec<Capability>,
}

impl DeviceProfile {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ProfileFile = toml::from_str(content)?;
        Ok(Self {
            vendor: file.vendor,
            model: file.model,
            channels: file.channels,
            commands: CapabilityTable::new(file.commands)?,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// The model's channels, all enabled.
    pub fn default_channels(&self) -> Vec<Channel> {
        self.channels
            .iter()
            .map(|name| Channel::new(name.as_str(), true))
            .collect()
    }

    fn from_static(
        vendor: &str,
        model: &str,
        channels: &[&str],
        commands: &[(ScpiCommand, &str)],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            vendor: vendor.to_string(),
            model: model.to_string(),
            channels: channels.iter().map(|name| name.to_string()).collect(),
            commands: CapabilityTable::from_static(commands)?,
        })
    }
}

const RIGOL_DP800_COMMANDS: &[(ScpiCommand, &str)] = &[
    (ScpiCommand::Remote, "SYST:REMOTE"),
    (ScpiCommand::Local, "SYST:LOCAL"),
    (ScpiCommand::BeeperEnable, "SYST:BEEP:STAT ON"),
    (ScpiCommand::BeeperDisable, "SYST:BEEP:STAT OFF"),
    (ScpiCommand::SelectChannel, ":INST:NSEL {channel}"),
    (ScpiCommand::GetMeasVoltage, ":MEAS:VOLT? CH{channel}"),
    (ScpiCommand::GetMeasCurrent, ":MEAS:CURR? CH{channel}"),
    (ScpiCommand::SetVoltageTarget, ":SOUR{channel}:VOLT {value}"),
    (ScpiCommand::SetCurrentLimit, ":SOUR{channel}:CURR {value}"),
    (ScpiCommand::SetOutputEnable, ":OUTP CH{channel},ON"),
    (ScpiCommand::SetOutputDisable, ":OUTP CH{channel},OFF"),
    (
        ScpiCommand::SetOverVoltageProtectionThreshold,
        ":OUTP:OVP:VAL CH{channel},{value}",
    ),
    (
        ScpiCommand::SetOverCurrentProtectionThreshold,
        ":OUTP:OCP:VAL CH{channel},{value}",
    ),
];

const HP_6632B_COMMANDS: &[(ScpiCommand, &str)] = &[
    (ScpiCommand::Remote, "SYST:REM"),
    (ScpiCommand::Local, "SYST:LOC"),
    (ScpiCommand::GetMeasVoltage, "MEAS:VOLT?"),
    (ScpiCommand::GetMeasCurrent, "MEAS:CURR?"),
    (ScpiCommand::SetVoltageTarget, "VOLT {value}"),
    (ScpiCommand::SetCurrentLimit, "CURR {value}"),
    (ScpiCommand::SetOutputEnable, "OUTP ON"),
    (ScpiCommand::SetOutputDisable, "OUTP OFF"),
    (ScpiCommand::SetOverVoltageProtectionThreshold, "VOLT:PROT {value}"),
];

const CHROMA_62000_COMMANDS: &[(ScpiCommand, &str)] = &[
    (ScpiCommand::Remote, "CONF:REM ON"),
    (ScpiCommand::Local, "CONF:REM OFF"),
    (ScpiCommand::BeeperEnable, "CONF:BEEP ON"),
    (ScpiCommand::BeeperDisable, "CONF:BEEP OFF"),
    (ScpiCommand::GetMeasVoltage, ":MEAS:VOLT?"),
    (ScpiCommand::GetMeasCurrent, ":MEAS:CURR?"),
    (ScpiCommand::SetVoltageTarget, ":SOUR:VOLT {value}"),
    (ScpiCommand::SetCurrentLimit, ":SOUR:CURR {value}"),
    (ScpiCommand::SetOutputEnable, ":CONF:OUTP ON"),
    (ScpiCommand::SetOutputDisable, ":CONF:OUTP OFF"),
    (ScpiCommand::SetOverVoltageProtectionThreshold, ":SOUR:VOLT:PROT:HIGH {value}"),
    (ScpiCommand::SetOverCurrentProtectionThreshold, ":SOUR:CURR:PROT:HIGH {value}"),
];

/// Rigol DP800 series, three channels.
pub fn rigol_dp800() -> Result<DeviceProfile, ConfigError> {
    DeviceProfile::from_static("Rigol", "DP800", &["1", "2", "3"], RIGOL_DP800_COMMANDS)
}

/// HP/Agilent 6632B, single channel. Its commands carry no channel qualifier.
pub fn hp_6632b() -> Result<DeviceProfile, ConfigError> {
    DeviceProfile::from_static("HP", "6632B", &["1"], HP_6632B_COMMANDS)
}

/// Chroma 62000 series, single channel.
pub fn chroma_62000() -> Result<DeviceProfile, ConfigError> {
    DeviceProfile::from_static("Chroma", "62000", &["1"], CHROMA_62000_COMMANDS)
}
