//! The measurement poll loop.
//!
//! While acquisition runs, exactly one measurement query is outstanding. Each call of
//! [`ScpiPps::receive_data`] consumes the reply to that query, emits it as a [`Sample`] and
//! requests the next measurement: voltage then current for one channel, then on to the next
//! enabled channel.

use tracing::{debug, info, trace};

use crate::{
    command::{Request, ScpiCommand},
    dispatch::dispatch,
    error::{Error, Result},
    psu::ScpiPps,
    transport::ScpiTransport,
    types::{Channel, MeasuredQuantity, Sample, SampleSink},
};

/// What the poll loop is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// Not polling. Callbacks do nothing.
    #[default]
    Stopped,
    /// A voltage query for the current channel is outstanding.
    AwaitingVoltage,
    /// A current query for the current channel is outstanding.
    AwaitingCurrent,
}

impl PollState {
    /// The quantity of the reply being waited for.
    pub const fn awaited(&self) -> Option<MeasuredQuantity> {
        match self {
            PollState::Stopped => None,
            PollState::AwaitingVoltage => Some(MeasuredQuantity::Voltage),
            PollState::AwaitingCurrent => Some(MeasuredQuantity::Current),
        }
    }
}

/// The next enabled channel after `from`, wrapping around. Looks at most one full lap.
fn next_enabled(channels: &[Channel], from: usize) -> Option<usize> {
    let count = channels.len();
    (1..=count)
        .map(|step| (from + step) % count)
        .find(|&index| channels[index].enabled)
}

impl<T: ScpiTransport> ScpiPps<'_, T> {
    pub fn poll_state(&self) -> PollState {
        self.state
    }

    /// The channel currently being measured, if polling.
    pub fn current_channel(&self) -> Option<&Channel> {
        match self.state {
            PollState::Stopped => None,
            _ => self.channels.get(self.current),
        }
    }

    /// Arm the poll loop and request the first voltage reading.
    ///
    /// At least one channel must be enabled, and the profile must support both measurement
    /// queries. A reply to a query from an earlier run which arrived after the stop is
    /// discarded first.
    pub fn start_acquisition(&mut self) -> Result<(), T::Error> {
        if self.state != PollState::Stopped {
            return Err(Error::AcquisitionRunning);
        }
        for command in [ScpiCommand::GetMeasVoltage, ScpiCommand::GetMeasCurrent] {
            if !self.profile.commands.supports(command) {
                return Err(Error::Unsupported(command));
            }
        }
        let first = self
            .channels
            .iter()
            .position(|channel| channel.enabled)
            .ok_or(Error::NoEnabledChannels)?;

        if let Some(value) = self.transport.read_one_numeric() {
            debug!(value, "Discarded stale reply before start");
        }

        self.current = first;
        self.state = PollState::AwaitingVoltage;
        info!(channel = %self.channels[first].name, "Starting acquisition");

        let request = Request::GetMeasVoltage {
            channel: &self.channels[first].name,
        };
        dispatch(&self.profile.commands, &mut self.transport, &request)?;
        Ok(())
    }

    /// Stop polling. A reply that already arrived is read and thrown away.
    ///
    /// A reply still on its way is dropped by the next
    /// [`start_acquisition`](Self::start_acquisition). One that arrives later than that is read
    /// as the first voltage.
    pub fn stop_acquisition(&mut self) {
        if self.state == PollState::Stopped {
            return;
        }
        self.state = PollState::Stopped;
        if let Some(value) = self.transport.read_one_numeric() {
            debug!(value, "Discarded reply after stop");
        }
        info!("Acquisition stopped");
    }

    /// Poll callback, to be invoked by the scheduler whenever a reply may be available.
    ///
    /// Returns `Ok(true)` to stay registered. A missing reply is not an error, the callback just
    /// does nothing until the next call. A transport error while requesting the next measurement
    /// is returned, the poll state already reflects that request.
    pub fn receive_data<K: SampleSink + ?Sized>(
        &mut self,
        sink: &mut K,
    ) -> Result<bool, T::Error> {
        let Some(quantity) = self.state.awaited() else {
            return Ok(true);
        };

        let Some(value) = self.transport.read_one_numeric() else {
            trace!(%quantity, "No reply yet");
            return Ok(true);
        };

        let channel = &self.channels[self.current];
        sink.emit(&Sample::dc(channel, quantity, value));

        let request = match quantity {
            MeasuredQuantity::Voltage => {
                self.state = PollState::AwaitingCurrent;
                Request::GetMeasCurrent {
                    channel: &channel.name,
                }
            }
            MeasuredQuantity::Current => {
                // The current channel is enabled, so the search always finds one.
                self.current = next_enabled(&self.channels, self.current).unwrap_or(self.current);
                self.state = PollState::AwaitingVoltage;
                Request::GetMeasVoltage {
                    channel: &self.channels[self.current].name,
                }
            }
        };
        dispatch(&self.profile.commands, &mut self.transport, &request)?;
        Ok(true)
    }
}
