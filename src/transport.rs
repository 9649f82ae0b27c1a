//! The connection to the instrument.
//!
//! [`ScpiTransport`] is what the driver needs from a connection. [`SerialScpi`] provides it
//! over anything implementing [`embedded_io::Read`] & [`embedded_io::Write`].

use embedded_io::Error as _;
use tracing::{debug, warn};

/// Fire-and-forget command submission and non-blocking numeric reply reads.
pub trait ScpiTransport {
    type Error: embedded_io::Error;

    /// Submit one command. Does not wait for a reply.
    fn send(&mut self, command: &str) -> Result<(), Self::Error>;

    /// Take one numeric reply if a complete one is available. Never blocks.
    fn read_one_numeric(&mut self) -> Option<f32>;
}

/// Line based SCPI over a byte stream.
///
/// Commands are terminated with `\n`. Replies are buffered until a full line is available, `L`
/// is the capacity of that buffer.
pub struct SerialScpi<S: embedded_io::Read + embedded_io::Write, const L: usize = 128> {
    interface: S,
    rx: heapless::Vec<u8, L>,
    /// Set while skipping the rest of a reply that didn't fit in `rx`.
    discarding: bool,
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> SerialScpi<S, L> {
    pub fn new(interface: S) -> Self {
        Self {
            interface,
            rx: heapless::Vec::new(),
            discarding: false,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.interface
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.interface
    }

    pub fn into_inner(self) -> S {
        self.interface
    }

    /// Remove the first complete line from the buffer and parse it.
    fn take_line(&mut self) -> Option<Option<f32>> {
        let end = self.rx.iter().position(|&b| b == b'\n')?;
        let value = core::str::from_utf8(&self.rx[..end])
            .ok()
            .and_then(|line| line.trim().parse::<f32>().ok());
        if value.is_none() {
            warn!(line = ?&self.rx[..end], "Discarding non-numeric reply");
        }
        let rest: heapless::Vec<u8, L> = self.rx[end + 1..].iter().copied().collect();
        self.rx = rest;
        Some(value)
    }

    /// Append received bytes to the line buffer.
    ///
    /// A reply longer than `L` is dropped as a whole, up to and including its newline.
    fn buffer(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.discarding {
                if byte == b'\n' {
                    self.discarding = false;
                }
                continue;
            }
            if let Err(byte) = self.rx.push(byte) {
                warn!(capacity = L, "Reply too long, discarding it");
                // Complete lines already buffered are kept.
                let keep = self
                    .rx
                    .iter()
                    .rposition(|&b| b == b'\n')
                    .map_or(0, |end| end + 1);
                self.rx.truncate(keep);
                self.discarding = byte != b'\n';
            }
        }
    }
}

impl<S: embedded_io::Read + embedded_io::Write, const L: usize> ScpiTransport
    for SerialScpi<S, L>
{
    type Error = S::Error;

    fn send(&mut self, command: &str) -> Result<(), Self::Error> {
        self.interface.write_all(command.as_bytes())?;
        self.interface.write_all(b"\n")?;
        self.interface.flush()
    }

    fn read_one_numeric(&mut self) -> Option<f32> {
        let mut temp_buf = [0u8; 16];
        loop {
            if let Some(value) = self.take_line() {
                return value;
            }
            match self.interface.read(&mut temp_buf) {
                Ok(0) => return None,
                Ok(bytes_read) => self.buffer(&temp_buf[..bytes_read]),
                // Nothing more available right now.
                Err(e)
                    if matches!(
                        e.kind(),
                        embedded_io::ErrorKind::Other | embedded_io::ErrorKind::TimedOut
                    ) =>
                {
                    return None;
                }
                Err(e) => {
                    debug!(kind = ?e.kind(), "Serial read failed");
                    return None;
                }
            }
        }
    }
}
