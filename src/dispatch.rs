//! Translation of logical commands into the command strings of a particular model.

use strfmt::strfmt;
use tracing::{debug, trace};

use crate::{
    command::Request,
    error::{Error, Result},
    profile::CapabilityTable,
    transport::ScpiTransport,
};

/// Outcome of a [`dispatch`] that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The command string was handed to the transport.
    Sent,
    /// The model doesn't implement the command. Nothing was sent, and that's OK.
    Unsupported,
}

/// Format `request` with the model's template and submit it.
///
/// At most one command string is sent per call. A transport failure is returned as
/// [`Error::SerialError`].
pub fn dispatch<T: ScpiTransport>(
    table: &CapabilityTable,
    transport: &mut T,
    request: &Request<'_>,
) -> Result<Dispatch, T::Error> {
    let command = request.command();
    let Some(template) = table.template(command) else {
        trace!(%command, "Command not implemented by this model");
        return Ok(Dispatch::Unsupported);
    };

    let command_string = strfmt(template, &request.arguments())
        .map_err(|e| Error::TemplateError(e.to_string()))?;

    debug!(%command, %command_string, "Sending command");
    transport
        .send(&command_string)
        .map_err(Error::SerialError)?;
    Ok(Dispatch::Sent)
}
