//! This module contains the value types exchanged with the supply.

use core::fmt;

/// Used to be less ambiguous and whether something is on or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
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

/// Ack bytes the supply sends when it accepted a request.
pub const ACK_OK: [u8; 2] = [0x40, 0x00];

/// Outcome reported by the ack bytes of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    /// Ack bytes were `0x40, 0x00`.
    Ok,
    /// Any other ack bytes.
    Fault,
}

impl From<[u8; 2]> for AckStatus {
    fn from(ack: [u8; 2]) -> Self {
        if ack == ACK_OK {
            AckStatus::Ok
        } else {
            AckStatus::Fault
        }
    }
}

impl fmt::Display for AckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AckStatus::Ok => f.write_str("OK"),
            AckStatus::Fault => f.write_str("Fault"),
        }
    }
}

/// Values echoed back by the supply.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurements {
    /// Volts.
    pub voltage: f32,
    /// Amps.
    pub current: f32,
    /// Watts.
    pub power: f32,
}

/// Cumulative arc event counters. Each wraps at 65536.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArcCounts {
    /// Micro-arcs detected from voltage drops.
    pub du: u16,
    /// Current spikes.
    pub im: u16,
    /// Voltage times current events.
    pub uxi: u16,
}

impl ArcCounts {
    pub const fn new(du: u16, im: u16, uxi: u16) -> Self {
        Self { du, im, uxi }
    }
}

/// Everything decoded from one response.
///
/// Only the ack bytes are guaranteed; the rest is present when the response was long enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readout {
    pub ack: [u8; 2],
    pub status: AckStatus,
    pub measurements: Option<Measurements>,
    pub arcs: Option<ArcCounts>,
}
