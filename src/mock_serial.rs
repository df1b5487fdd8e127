//! In-memory serial link and delay for unit tests.

use crate::transport::Transport;

const CAPACITY: usize = 256;

/// A scripted serial port.
///
/// Bytes queued with [`MockSerial::set_read_data`] are handed out by `read`, and
/// everything the driver writes is captured for inspection.
pub struct MockSerial {
    sent: heapless::Vec<u8, CAPACITY>,
    incoming: heapless::Vec<u8, CAPACITY>,
    cursor: usize,
    open: bool,
    fail_writes: bool,
    fail_reads: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSerialError {
    /// More bytes were written than the capture buffer holds.
    BufferOverflow,
    /// Injected with `set_write_error` / `set_read_error`.
    SimulatedError,
    /// Read with nothing queued.
    WouldBlock,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            Self::SimulatedError | Self::WouldBlock => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(MockSerialError::SimulatedError);
        }
        self.sent
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_reads {
            return Err(MockSerialError::SimulatedError);
        }
        let pending = &self.incoming[self.cursor..];
        if pending.is_empty() {
            return Err(MockSerialError::WouldBlock);
        }
        let n = buf.len().min(pending.len());
        buf[..n].copy_from_slice(&pending[..n]);
        self.cursor += n;
        Ok(n)
    }
}

impl Transport for MockSerial {
    fn is_open(&self) -> bool {
        self.open
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        if self.fail_reads {
            return Err(MockSerialError::SimulatedError);
        }
        Ok(self.incoming.len() - self.cursor)
    }
}

impl MockSerial {
    /// An open port with nothing queued.
    pub fn new() -> Self {
        Self {
            sent: heapless::Vec::new(),
            incoming: heapless::Vec::new(),
            cursor: 0,
            open: true,
            fail_writes: false,
            fail_reads: false,
        }
    }

    /// Replace whatever is waiting to be read.
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        self.cursor = 0;
        self.incoming.clear();
        self.incoming
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    pub fn written_data(&self) -> &[u8] {
        &self.sent
    }

    pub fn clear_written_data(&mut self) {
        self.sent.clear();
    }

    pub fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    pub fn set_write_error(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn set_read_error(&mut self, fail: bool) {
        self.fail_reads = fail;
    }
}

/// Delay that only records how long it was asked to wait.
#[derive(Debug, Default)]
pub struct MockDelay {
    total_ns: u64,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;
    use embedded_io::{Read, Write};

    #[test]
    fn captures_writes() {
        let mut port = MockSerial::new();
        let request = [0x17, 0xE8, 0xFF, 0xFF];

        assert_eq!(port.write(&request).unwrap(), 4);
        assert_eq!(port.written_data(), &request);

        port.clear_written_data();
        assert!(port.written_data().is_empty());
    }

    #[test]
    fn write_past_capacity_overflows() {
        let mut port = MockSerial::new();
        let result = port.write(&[0u8; CAPACITY + 1]);
        assert_eq!(result, Err(MockSerialError::BufferOverflow));
    }

    #[test]
    fn bytes_available_drains_with_reads() {
        let mut port = MockSerial::new();
        port.set_read_data(&[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        assert_eq!(port.bytes_available().unwrap(), 9);

        let mut chunk = [0u8; 8];
        assert_eq!(port.read(&mut chunk).unwrap(), 8);
        assert_eq!(port.bytes_available().unwrap(), 1);
        assert_eq!(port.read(&mut chunk).unwrap(), 1);
        assert_eq!(chunk[0], 9);

        assert_eq!(port.read(&mut chunk), Err(MockSerialError::WouldBlock));
    }

    #[test]
    fn injected_failures() {
        let mut port = MockSerial::new();
        port.set_write_error(true);
        assert!(port.write(b"x").is_err());
        assert!(port.flush().is_err());

        port.set_read_data(b"data").unwrap();
        port.set_read_error(true);
        assert!(port.bytes_available().is_err());
        assert!(port.read(&mut [0u8; 4]).is_err());
    }

    #[test]
    fn open_flag() {
        let mut port = MockSerial::new();
        assert!(port.is_open());
        port.set_open(false);
        assert!(!port.is_open());
    }

    #[test]
    fn delay_accumulates() {
        let mut delay = MockDelay::new();
        delay.delay_ms(100);
        delay.delay_us(5);
        assert_eq!(delay.total_ns(), 100_005_000);
    }
}
