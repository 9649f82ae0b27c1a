//! Our error types for the SCPI PSUs.

use thiserror::Error;

use crate::command::ScpiCommand;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Custom error type for SCPI PSU communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Command template error: {0}")]
    TemplateError(String),
    #[error("No enabled channels to poll")]
    NoEnabledChannels,
    #[error("Acquisition is already running")]
    AcquisitionRunning,
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
    #[error("Device does not support {0}")]
    Unsupported(ScpiCommand),
}

/// Errors raised while loading a device profile.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read profile: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Command {0} is defined more than once")]
    DuplicateCommand(ScpiCommand),
    #[error("Invalid template for {command}: {reason}")]
    InvalidTemplate {
        command: ScpiCommand,
        reason: String,
    },
}
