//! The byte stream the supply is attached to.

/// A serial link to the supply.
///
/// Opening and closing the underlying port is up to the host; the control loop
/// only asks whether it is open.
pub trait Transport: embedded_io::Read + embedded_io::Write {
    /// Whether the port is currently usable.
    fn is_open(&self) -> bool;

    /// Bytes received and waiting to be read.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;
}
