//! Request frame builder for the TrueDC serial protocol.
//!
//! Every frame has the same 23 byte base layout:
//!
//! | Offset | Field | Encoding |
//! |---|---|---|
//! | 0 | length | u8 |
//! | 1 | length complement | u8, `!length` |
//! | 2-3 | destination | u16 big-endian |
//! | 4-5 | source | u16 big-endian |
//! | 6-7 | command | u16 big-endian |
//! | 8-11 | voltage | f32 little-endian |
//! | 12-15 | current | f32 little-endian |
//! | 16-19 | power | f32 little-endian |
//! | 20 | control byte | [`ControlFlags`] |
//! | 21.. | parameters | u8 each, optional |
//! | last 2 | checksum | u16 big-endian |
//!
//! Note the integers are big-endian while the floats are little-endian. The
//! supply expects exactly this layout.

use crate::{error::FrameError, flags::ControlFlags};

/// Length of a frame without any parameters.
pub const BASE_FRAME_LEN: usize = 23;
/// Number of checksum bytes at the end of every frame.
pub const CHECKSUM_LEN: usize = 2;
/// Command code written by [`Frame::new`].
pub const DEFAULT_COMMAND: u16 = 0x6040;

const LENGTH_OFFSET: usize = 0;
const DESTINATION_OFFSET: usize = 2;
const SOURCE_OFFSET: usize = 4;
const COMMAND_OFFSET: usize = 6;
const VOLTAGE_OFFSET: usize = 8;
const CURRENT_OFFSET: usize = 12;
const POWER_OFFSET: usize = 16;
const CONTROL_OFFSET: usize = 20;
/// First byte covered by the checksum.
const CHECKSUM_START: usize = 2;

/// Additive checksum used by the supply.
///
/// A plain sum of every byte truncated to 16 bits. There is no polynomial
/// involved, even though the device documentation calls it a CRC.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, &byte| acc.wrapping_add(u16::from(byte)))
}

/// Argument accepted by [`Frame::set_length`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length<'a> {
    /// A byte count.
    Count(usize),
    /// A byte count written in base 16, with or without a `0x` prefix.
    Hex(&'a str),
}

impl Length<'_> {
    fn resolve(self) -> Result<u8, FrameError> {
        match self {
            Length::Count(count) => u8::try_from(count).map_err(|_| FrameError::InvalidLength),
            Length::Hex(text) => {
                let digits = text
                    .trim()
                    .trim_start_matches("0x")
                    .trim_start_matches("0X");
                u8::from_str_radix(digits, 16).map_err(|_| FrameError::InvalidLength)
            }
        }
    }
}

impl From<usize> for Length<'_> {
    fn from(count: usize) -> Self {
        Length::Count(count)
    }
}

impl From<u8> for Length<'_> {
    fn from(count: u8) -> Self {
        Length::Count(count.into())
    }
}

impl<'a> From<&'a str> for Length<'a> {
    fn from(text: &'a str) -> Self {
        Length::Hex(text)
    }
}

/// An outbound request frame.
///
/// `L` is the capacity of the backing buffer and bounds how many parameters
/// can be appended.
#[derive(Debug, Clone)]
pub struct Frame<const L: usize = 64> {
    bytes: heapless::Vec<u8, L>,
    flags: ControlFlags,
}

impl<const L: usize> Default for Frame<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const L: usize> Frame<L> {
    /// Create a zeroed frame with a placeholder length and the default command.
    pub fn new() -> Self {
        const { assert!(L >= BASE_FRAME_LEN, "frame buffer cannot hold the base layout") };

        let mut bytes: heapless::Vec<u8, L> = heapless::Vec::new();
        // Cannot fail, capacity is asserted above.
        let _ = bytes.resize(BASE_FRAME_LEN, 0);

        let mut frame = Self {
            bytes,
            flags: ControlFlags::new(),
        };
        frame.write_length(0);
        frame.set_command(DEFAULT_COMMAND);
        frame
    }

    /// Write the length byte and its complement.
    pub fn set_length<'a>(&mut self, length: impl Into<Length<'a>>) -> Result<(), FrameError> {
        let length = length.into().resolve()?;
        self.write_length(length);
        Ok(())
    }

    /// Value of the length byte. Only meaningful after [`Self::finish`].
    pub fn length(&self) -> u8 {
        self.bytes[LENGTH_OFFSET]
    }

    pub fn set_destination(&mut self, address: u16) {
        self.write_u16(DESTINATION_OFFSET, address);
    }

    pub fn destination(&self) -> u16 {
        self.read_u16(DESTINATION_OFFSET)
    }

    pub fn set_source(&mut self, address: u16) {
        self.write_u16(SOURCE_OFFSET, address);
    }

    pub fn source(&self) -> u16 {
        self.read_u16(SOURCE_OFFSET)
    }

    pub fn set_command(&mut self, command: u16) {
        self.write_u16(COMMAND_OFFSET, command);
    }

    pub fn command(&self) -> u16 {
        self.read_u16(COMMAND_OFFSET)
    }

    /// Set the requested voltage. Stored as single precision.
    pub fn set_voltage(&mut self, volts: f64) {
        self.write_f32(VOLTAGE_OFFSET, volts as f32);
    }

    /// The requested voltage as it will be sent.
    pub fn voltage(&self) -> f32 {
        self.read_f32(VOLTAGE_OFFSET)
    }

    /// Set the requested current. Stored as single precision.
    pub fn set_current(&mut self, amps: f64) {
        self.write_f32(CURRENT_OFFSET, amps as f32);
    }

    /// The requested current as it will be sent.
    pub fn current(&self) -> f32 {
        self.read_f32(CURRENT_OFFSET)
    }

    /// Set the requested power. Stored as single precision.
    pub fn set_power(&mut self, watts: f64) {
        self.write_f32(POWER_OFFSET, watts as f32);
    }

    /// The requested power as it will be sent.
    pub fn power(&self) -> f32 {
        self.read_f32(POWER_OFFSET)
    }

    /// Merge the given bits into the control byte.
    ///
    /// Bits that are already set stay set; use [`Self::clear_bits`] to remove any.
    pub fn set_bits(&mut self, bits: impl Into<ControlFlags>) {
        self.update_flags(self.flags.merge(bits.into()));
    }

    /// Clear the given bits from the control byte.
    pub fn clear_bits(&mut self, bits: impl Into<ControlFlags>) {
        self.update_flags(self.flags.without(bits.into()));
    }

    pub fn power_on(&mut self) {
        self.update_flags(self.flags.with_power(true));
    }

    pub fn power_off(&mut self) {
        self.update_flags(self.flags.with_power(false));
    }

    pub fn relay_on(&mut self) {
        self.update_flags(self.flags.with_relay(true));
    }

    pub fn relay_off(&mut self) {
        self.update_flags(self.flags.with_relay(false));
    }

    /// The control flags currently written to the frame.
    pub fn flags(&self) -> ControlFlags {
        self.flags
    }

    /// Append a parameter byte just ahead of the checksum.
    pub fn add_parameter(&mut self, value: u8) -> Result<(), FrameError> {
        // The length header is a single byte.
        if self.bytes.len() >= usize::from(u8::MAX) {
            return Err(FrameError::CapacityExceeded);
        }
        let at = self.bytes.len() - CHECKSUM_LEN;
        self.bytes
            .insert(at, value)
            .map_err(|_| FrameError::CapacityExceeded)
    }

    /// Read any byte of the frame by its absolute index.
    pub fn get_parameter(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// The appended parameter bytes.
    pub fn parameters(&self) -> &[u8] {
        &self.bytes[BASE_FRAME_LEN - CHECKSUM_LEN..self.bytes.len() - CHECKSUM_LEN]
    }

    /// Total number of bytes in the frame.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false, a frame holds at least the base layout.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Checksum over everything after the length header, excluding the checksum itself.
    pub fn compute_crc(&self) -> u16 {
        checksum(&self.bytes[CHECKSUM_START..self.checksum_offset()])
    }

    /// The checksum currently stored in the trailer.
    pub fn stored_crc(&self) -> u16 {
        self.read_u16(self.checksum_offset())
    }

    /// Write the checksum trailer and length header, returning the wire bytes.
    ///
    /// Safe to call more than once; the checksum never covers its own bytes.
    pub fn finish(&mut self) -> &[u8] {
        let crc = self.compute_crc();
        self.write_u16(self.checksum_offset(), crc);
        // Bounded by the check in `add_parameter`.
        self.write_length(self.bytes.len() as u8);
        &self.bytes
    }

    /// The frame as it currently stands.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn checksum_offset(&self) -> usize {
        self.bytes.len() - CHECKSUM_LEN
    }

    fn update_flags(&mut self, flags: ControlFlags) {
        self.flags = flags;
        self.bytes[CONTROL_OFFSET] = flags.raw();
    }

    fn write_length(&mut self, length: u8) {
        self.bytes[LENGTH_OFFSET] = length;
        self.bytes[LENGTH_OFFSET + 1] = !length;
    }

    fn write_u16(&mut self, offset: usize, value: u16) {
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    }

    fn read_u16(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.bytes[offset], self.bytes[offset + 1]])
    }

    fn write_f32(&mut self, offset: usize, value: f32) {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn read_f32(&self, offset: usize) -> f32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[offset..offset + 4]);
        f32::from_le_bytes(raw)
    }
}

impl<const L: usize> AsRef<[u8]> for Frame<L> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
