//! We use this mocking module in unit tests to emulate the serial link to a PSU.

/// Our mock type used to emulate a serial port.
pub struct MockSerial {
    /// Everything the driver wrote.
    write_buffer: heapless::Vec<u8, 1024>,
    /// Replies waiting to be read by the driver.
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    should_error_on_write: bool,
    should_error_on_read: bool,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
    /// Would block - no data available
    WouldBlock,
    /// Simulated broken connection
    Disconnected,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MockSerialError::BufferOverflow => write!(f, "mock buffer overflow"),
            MockSerialError::SimulatedError => write!(f, "simulated error"),
            MockSerialError::WouldBlock => write!(f, "no data available"),
            MockSerialError::Disconnected => write!(f, "disconnected"),
        }
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
            MockSerialError::WouldBlock => embedded_io::ErrorKind::Other,
            MockSerialError::Disconnected => embedded_io::ErrorKind::BrokenPipe,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::Disconnected);
        }
        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::Disconnected);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        let pending = &self.read_buffer[self.read_position..];
        if pending.is_empty() {
            return Err(MockSerialError::WouldBlock);
        }

        let bytes_to_read = core::cmp::min(buf.len(), pending.len());
        buf[..bytes_to_read].copy_from_slice(&pending[..bytes_to_read]);
        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl MockSerial {
    /// Create a new MockSerial instance with empty buffers
    pub fn new() -> Self {
        Self {
            write_buffer: heapless::Vec::new(),
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Replace any pending reply data.
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.push_read_data(data)
    }

    /// Queue more reply data behind whatever has not been read yet.
    pub fn push_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        // Drop what has already been consumed so long sessions don't run out of room.
        let pending: heapless::Vec<u8, 256> =
            self.read_buffer[self.read_position..].iter().copied().collect();
        self.read_buffer = pending;
        self.read_position = 0;
        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Return everything written so far as text, and clear it.
    pub fn take_written(&mut self) -> String {
        let written = String::from_utf8_lossy(&self.write_buffer).into_owned();
        self.write_buffer.clear();
        written
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_then_take() {
        let mut mock = MockSerial::new();
        mock.write_all(b"SYST:REM\n").unwrap();
        mock.write_all(b"MEAS:VOLT?\n").unwrap();
        assert_eq!(mock.take_written(), "SYST:REM\nMEAS:VOLT?\n");
        assert!(mock.written_data().is_empty());
    }

    #[test]
    fn test_push_keeps_unread_data() {
        let mut mock = MockSerial::new();
        mock.set_read_data(b"1.0\n2.0\n").unwrap();

        let mut buffer = [0u8; 4];
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
        assert_eq!(&buffer, b"1.0\n");

        mock.push_read_data(b"3.0\n").unwrap();
        let mut buffer = [0u8; 16];
        let n = mock.read(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], b"2.0\n3.0\n");
    }

    #[test]
    fn test_would_block_when_drained() {
        let mut mock = MockSerial::new();
        let mut buffer = [0u8; 8];
        let err = mock.read(&mut buffer).unwrap_err();
        assert!(matches!(err, MockSerialError::WouldBlock));
        assert!(matches!(err.kind(), embedded_io::ErrorKind::Other));
    }

    #[test]
    fn test_error_flags() {
        let mut mock = MockSerial::new();
        mock.set_write_error(true);
        assert!(matches!(
            mock.write(b"x").unwrap_err(),
            MockSerialError::Disconnected
        ));
        assert!(mock.flush().is_err());
        mock.set_write_error(false);
        assert!(mock.write(b"x").is_ok());

        mock.set_read_data(b"1\n").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 4];
        assert!(mock.read(&mut buffer).is_err());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(MockSerialError::Disconnected.to_string(), "disconnected");
        let err: &dyn core::error::Error = &MockSerialError::WouldBlock;
        assert_eq!(err.to_string(), "no data available");
    }

    #[test]
    fn test_read_overflow() {
        let mut mock = MockSerial::new();
        let result = mock.set_read_data(&[0u8; 300]);
        assert!(matches!(result, Err(MockSerialError::BufferOverflow)));
    }
}
