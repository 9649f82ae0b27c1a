//! Logical commands understood by the driver, independent of any vendor syntax.
//!
//! A [`ScpiCommand`] names an operation. A [`Request`] is that operation together with the
//! arguments it needs, so a template can never be filled with the wrong number or kind of
//! values.

use std::collections::HashMap;

use serde::Deserialize;
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// All logical commands a device profile may implement.
///
/// Only the two measurement queries produce a reply. Everything else is write-only, so issuing
/// it while polling can't be confused with a measurement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScpiCommand {
    /// Put the instrument into remote control mode.
    Remote,
    /// Return the instrument to front panel control.
    Local,
    BeeperEnable,
    BeeperDisable,
    /// Make a channel the target of following unqualified commands.
    SelectChannel,
    /// Query the measured output voltage of a channel.
    GetMeasVoltage,
    /// Query the measured output current of a channel.
    GetMeasCurrent,
    /// Set the output voltage target, in volts.
    SetVoltageTarget,
    /// Set the output current limit, in amps.
    SetCurrentLimit,
    SetOutputEnable,
    SetOutputDisable,
    /// Set the over-voltage protection threshold, in volts.
    SetOverVoltageProtectionThreshold,
    /// Set the over-current protection threshold, in amps.
    SetOverCurrentProtectionThreshold,
}

/// A named argument that a command substitutes into its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Parameter {
    /// The channel name, substituted verbatim as `{channel}`.
    Channel,
    /// A numeric setting, substituted as `{value}`.
    Value,
}

impl Parameter {
    /// Placeholder key used for this parameter inside templates.
    pub const fn key(&self) -> &'static str {
        match self {
            Parameter::Channel => "channel",
            Parameter::Value => "value",
        }
    }
}

impl ScpiCommand {
    /// The parameters this command provides to its template.
    pub const fn parameters(&self) -> &'static [Parameter] {
        use ScpiCommand as SC;
        match self {
            SC::Remote | SC::Local | SC::BeeperEnable | SC::BeeperDisable => &[],
            SC::SelectChannel
            | SC::GetMeasVoltage
            | SC::GetMeasCurrent
            | SC::SetOutputEnable
            | SC::SetOutputDisable => &[Parameter::Channel],
            SC::SetVoltageTarget
            | SC::SetCurrentLimit
            | SC::SetOverVoltageProtectionThreshold
            | SC::SetOverCurrentProtectionThreshold => &[Parameter::Channel, Parameter::Value],
        }
    }

    /// Whether the instrument answers this command with a numeric reply.
    pub const fn is_query(&self) -> bool {
        matches!(self, ScpiCommand::GetMeasVoltage | ScpiCommand::GetMeasCurrent)
    }

    /// Stand-in arguments for checking a template without a real channel or value.
    pub(crate) fn placeholder_arguments(&self) -> HashMap<String, String> {
        self.parameters()
            .iter()
            .map(|parameter| {
                let value = match parameter {
                    Parameter::Channel => "CH1".to_string(),
                    Parameter::Value => format_value(0.0),
                };
                (parameter.key().to_string(), value)
            })
            .collect()
    }
}

/// A logical command with its typed arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request<'a> {
    Remote,
    Local,
    BeeperEnable,
    BeeperDisable,
    SelectChannel { channel: &'a str },
    GetMeasVoltage { channel: &'a str },
    GetMeasCurrent { channel: &'a str },
    SetVoltageTarget { channel: &'a str, volts: f32 },
    SetCurrentLimit { channel: &'a str, amps: f32 },
    SetOutputEnable { channel: &'a str },
    SetOutputDisable { channel: &'a str },
    SetOverVoltageProtectionThreshold { channel: &'a str, volts: f32 },
    SetOverCurrentProtectionThreshold { channel: &'a str, amps: f32 },
}

impl Request<'_> {
    /// The logical command this request is an instance of.
    pub const fn command(&self) -> ScpiCommand {
        use Request as R;
        use ScpiCommand as SC;
        match self {
            R::Remote => SC::Remote,
            R::Local => SC::Local,
            R::BeeperEnable => SC::BeeperEnable,
            R::BeeperDisable => SC::BeeperDisable,
            R::SelectChannel { .. } => SC::SelectChannel,
            R::GetMeasVoltage { .. } => SC::GetMeasVoltage,
            R::GetMeasCurrent { .. } => SC::GetMeasCurrent,
            R::SetVoltageTarget { .. } => SC::SetVoltageTarget,
            R::SetCurrentLimit { .. } => SC::SetCurrentLimit,
            R::SetOutputEnable { .. } => SC::SetOutputEnable,
            R::SetOutputDisable { .. } => SC::SetOutputDisable,
            R::SetOverVoltageProtectionThreshold { .. } => SC::SetOverVoltageProtectionThreshold,
            R::SetOverCurrentProtectionThreshold { .. } => SC::SetOverCurrentProtectionThreshold,
        }
    }

    /// The channel this request targets, if any.
    pub const fn channel(&self) -> Option<&str> {
        use Request as R;
        match self {
            R::Remote | R::Local | R::BeeperEnable | R::BeeperDisable => None,
            R::SelectChannel { channel }
            | R::GetMeasVoltage { channel }
            | R::GetMeasCurrent { channel }
            | R::SetOutputEnable { channel }
            | R::SetOutputDisable { channel }
            | R::SetVoltageTarget { channel, .. }
            | R::SetCurrentLimit { channel, .. }
            | R::SetOverVoltageProtectionThreshold { channel, .. }
            | R::SetOverCurrentProtectionThreshold { channel, .. } => Some(*channel),
        }
    }

    /// The numeric setting carried by this request, if any.
    pub const fn value(&self) -> Option<f32> {
        use Request as R;
        match self {
            R::SetVoltageTarget { volts, .. } | R::SetOverVoltageProtectionThreshold { volts, .. } => {
                Some(*volts)
            }
            R::SetCurrentLimit { amps, .. } | R::SetOverCurrentProtectionThreshold { amps, .. } => {
                Some(*amps)
            }
            _ => None,
        }
    }

    /// Template arguments keyed by placeholder name.
    pub fn arguments(&self) -> HashMap<String, String> {
        let mut arguments = HashMap::new();
        if let Some(channel) = self.channel() {
            arguments.insert(Parameter::Channel.key().to_string(), channel.to_string());
        }
        if let Some(value) = self.value() {
            arguments.insert(Parameter::Value.key().to_string(), format_value(value));
        }
        arguments
    }
}

/// Numeric settings are always sent with six decimal places.
fn format_value(value: f32) -> String {
    format!("{value:.6}")
}
