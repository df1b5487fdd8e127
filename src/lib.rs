//! This crate provides an interface for driving TrueDC series DC plasma power supplies over their serial link.
//!
//! Two pieces do the work:
//! * [`frame`] / [`response`] - the fixed-layout binary request and response frames, with their
//!   additive checksum and mixed byte order.
//! * [`psu::TrueDc`] - a periodic control loop which ramps power, voltage and current toward the
//!   operator's setpoints, exchanges one frame per tick and tracks arc-event rates.
//!
//! The transport is anything implementing [`transport::Transport`], which builds on
//! [embedded_io::Read] & [embedded_io::Write]. The settle delay between request and response
//! comes from any [embedded_hal::delay::DelayNs].
//!
//! The serial port used for PSU comms should be configured like so:
//! * Default baud rate: 38400
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None

pub mod arc_rate;
pub mod config;
pub mod error;
pub mod flags;
pub mod frame;
pub mod psu;
pub mod ramp;
pub mod response;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock_serial;
