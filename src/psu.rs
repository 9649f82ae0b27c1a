use tracing::info;

use crate::{
    acquisition::PollState,
    command::Request,
    dispatch::{Dispatch, dispatch},
    error::{Error, Result},
    profile::DeviceProfile,
    transport::ScpiTransport,
    types::{Channel, State},
};

/// One programmable power supply, and everything the driver tracks about it.
///
/// You can create a ScpiPps using any [`ScpiTransport`], a profile describing the model, and the
/// channels to work with in their natural order.
///
/// All methods take `&mut self`, so polling, arming and configuration of one device are always
/// serialized.
pub struct ScpiPps<'p, T: ScpiTransport> {
    pub(crate) transport: T,
    pub(crate) profile: &'p DeviceProfile,
    pub(crate) channels: Vec<Channel>,
    pub(crate) state: PollState,
    /// Index into `channels` of the channel being measured.
    pub(crate) current: usize,
}

impl<'p, T: ScpiTransport> ScpiPps<'p, T> {
    pub fn new(transport: T, profile: &'p DeviceProfile, channels: Vec<Channel>) -> Self {
        Self {
            transport,
            profile,
            channels,
            state: PollState::Stopped,
            current: 0,
        }
    }

    /// Create a ScpiPps with the profile's own channels, all enabled.
    pub fn with_default_channels(transport: T, profile: &'p DeviceProfile) -> Self {
        Self::new(transport, profile, profile.default_channels())
    }

    pub fn profile(&self) -> &DeviceProfile {
        self.profile
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Enable or disable polling of a channel. Only allowed while acquisition is stopped.
    pub fn set_channel_enabled(
        &mut self,
        name: &str,
        enabled: impl Into<State>,
    ) -> Result<(), T::Error> {
        if self.state != PollState::Stopped {
            return Err(Error::AcquisitionRunning);
        }
        let index = self.channel_index(name)?;
        let state: State = enabled.into();
        self.channels[index].enabled = state.into();
        Ok(())
    }

    /// Put the instrument under remote control.
    pub fn open(&mut self) -> Result<Dispatch, T::Error> {
        info!(vendor = %self.profile.vendor, model = %self.profile.model, "Opening device");
        self.send(&Request::Remote)
    }

    /// Hand the instrument back to its front panel.
    pub fn close(&mut self) -> Result<Dispatch, T::Error> {
        self.stop_acquisition();
        self.send(&Request::Local)
    }

    pub fn select_channel(&mut self, channel: &str) -> Result<Dispatch, T::Error> {
        self.channel_index(channel)?;
        self.send(&Request::SelectChannel { channel })
    }

    /// Set the output voltage target of a channel, in volts.
    pub fn set_voltage_target(&mut self, channel: &str, volts: f32) -> Result<Dispatch, T::Error> {
        self.channel_index(channel)?;
        self.send(&Request::SetVoltageTarget { channel, volts })
    }

    /// Set the output current limit of a channel, in amps.
    pub fn set_current_limit(&mut self, channel: &str, amps: f32) -> Result<Dispatch, T::Error> {
        self.channel_index(channel)?;
        self.send(&Request::SetCurrentLimit { channel, amps })
    }

    /// Enable/disable a channel's output.
    pub fn set_output_enabled(
        &mut self,
        channel: &str,
        state: impl Into<State>,
    ) -> Result<Dispatch, T::Error> {
        self.channel_index(channel)?;
        match state.into() {
            State::On => self.send(&Request::SetOutputEnable { channel }),
            State::Off => self.send(&Request::SetOutputDisable { channel }),
        }
    }

    /// Enable/disable the beeper.
    pub fn set_beeper(&mut self, state: impl Into<State>) -> Result<Dispatch, T::Error> {
        match state.into() {
            State::On => self.send(&Request::BeeperEnable),
            State::Off => self.send(&Request::BeeperDisable),
        }
    }

    /// Set the over-voltage protection threshold of a channel, in volts.
    pub fn set_over_voltage_protection(
        &mut self,
        channel: &str,
        volts: f32,
    ) -> Result<Dispatch, T::Error> {
        self.channel_index(channel)?;
        self.send(&Request::SetOverVoltageProtectionThreshold { channel, volts })
    }

    /// Set the over-current protection threshold of a channel, in amps.
    pub fn set_over_current_protection(
        &mut self,
        channel: &str,
        amps: f32,
    ) -> Result<Dispatch, T::Error> {
        self.channel_index(channel)?;
        self.send(&Request::SetOverCurrentProtectionThreshold { channel, amps })
    }

    fn send(&mut self, request: &Request<'_>) -> Result<Dispatch, T::Error> {
        // A reply here would be taken for a measurement by the poll loop.
        debug_assert!(!request.command().is_query());
        dispatch(&self.profile.commands, &mut self.transport, request)
    }

    fn channel_index(&self, name: &str) -> Result<usize, T::Error> {
        self.channels
            .iter()
            .position(|channel| channel.name == name)
            .ok_or_else(|| Error::UnknownChannel(name.to_string()))
    }
}
