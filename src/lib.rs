//! This crate provides a polling driver for multi-channel programmable power supplies which speak
//! SCPI style text commands.
//!
//! The driver does two things:
//! * Map a logical operation, like "read the output voltage of channel 2", to the command string
//!   a particular model understands. See [`profile`] and [`dispatch`].
//! * Run a round-robin poll loop which reads voltage then current of every enabled channel and
//!   hands each reading to a [`SampleSink`](types::SampleSink). See [`acquisition`].
//!
//! Only one query is ever outstanding. The poll loop is a callback,
//! [`ScpiPps::receive_data`](psu::ScpiPps::receive_data), which your event loop calls whenever
//! the connection may have data. It never blocks.
//!
//! Models with a built-in profile:
//! * Rigol DP800 series
//! * HP 6632B
//! * Chroma 62000 series
//!
//! Others can be described in a TOML profile, see [`profile`].
//!
//! When talking over serial, the port should be configured as the instrument's manual says. Most
//! use 8 data bits, 1 stop bit, no parity, and terminate replies with a newline.

pub mod acquisition;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod profile;
pub mod psu;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock_serial;
