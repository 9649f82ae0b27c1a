//! This module contains the channel and measurement data types shared by the driver.

use chrono::{DateTime, Utc};
use modular_bitfield::prelude::*;
use strum_macros::{Display, EnumIter};

/// One output channel of a power supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Name substituted into command templates, e.g. `CH1`.
    pub name: String,
    /// Disabled channels are skipped while polling.
    pub enabled: bool,
}

impl Channel {
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }
}

/// Used to be less ambiguous and whether something is on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// Disabled.
    #[default]
    Off,
    /// Enabled.
    On,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// The kind of quantity a sample measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum MeasuredQuantity {
    Voltage,
    Current,
}

impl MeasuredQuantity {
    /// The unit readings of this quantity are reported in.
    pub const fn unit(&self) -> Unit {
        match self {
            MeasuredQuantity::Voltage => Unit::Volt,
            MeasuredQuantity::Current => Unit::Ampere,
        }
    }
}

/// Units attached to samples. Values are passed through exactly as the instrument reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Unit {
    #[strum(serialize = "V")]
    Volt,
    #[strum(serialize = "A")]
    Ampere,
}

/// Flags qualifying a measured quantity.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MqFlags {
    pub ac: bool,
    pub dc: bool,
    pub rms: bool,
    pub diode: bool,
    pub hold: bool,
    pub relative: bool,
    #[skip]
    __: B2,
}

impl MqFlags {
    /// Flags for a direct current reading.
    pub fn dc_only() -> Self {
        MqFlags::new().with_dc(true)
    }
}

/// A single tagged reading from one channel.
///
/// Samples only live for the duration of one poll callback, so the channel is borrowed.
#[derive(Debug, Clone)]
pub struct Sample<'a> {
    pub channel: &'a Channel,
    pub quantity: MeasuredQuantity,
    pub unit: Unit,
    pub flags: MqFlags,
    pub value: f32,
    /// Always `1`, each reply carries one value.
    pub num_samples: usize,
    pub timestamp: DateTime<Utc>,
}

impl<'a> Sample<'a> {
    /// Build a DC sample of `quantity` taken now.
    pub fn dc(channel: &'a Channel, quantity: MeasuredQuantity, value: f32) -> Self {
        Self {
            channel,
            quantity,
            unit: quantity.unit(),
            flags: MqFlags::dc_only(),
            value,
            num_samples: 1,
            timestamp: Utc::now(),
        }
    }
}

/// Downstream consumer of samples.
///
/// Emission is fire and forget, there is no acknowledgement or backpressure.
pub trait SampleSink {
    fn emit(&mut self, sample: &Sample<'_>);
}

impl<F> SampleSink for F
where
    F: FnMut(&Sample<'_>),
{
    fn emit(&mut self, sample: &Sample<'_>) {
        self(sample)
    }
}
