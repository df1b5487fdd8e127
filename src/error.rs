//! Our error types for the TrueDC link.

use thiserror::Error;

pub type Result<T, I> = core::result::Result<T, Error<I>>;

/// Errors raised while building or decoding a frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("Invalid length argument")]
    InvalidLength,
    #[error("Buffer too short: need {needed} bytes, have {available}")]
    ShortBuffer { needed: usize, available: usize },
    #[error("Frame capacity exceeded")]
    CapacityExceeded,
    #[error("Device rejected request, ack bytes {ack:02X?}")]
    ProtocolMismatch { ack: [u8; 2] },
}

/// Custom error type for TrueDC communications.
#[derive(Error, Debug)]
pub enum Error<I: embedded_io::Error> {
    #[error("Serial communication error")]
    SerialError(I),
    #[error("Frame error: {0}")]
    Frame(FrameError),
    #[error("Response did not fit the receive buffer")]
    BufferError,
    #[error("Link is not open")]
    LinkClosed,
}

impl<I: embedded_io::Error> From<FrameError> for Error<I> {
    fn from(err: FrameError) -> Self {
        Error::Frame(err)
    }
}

/// Rejected [`Config`](crate::config::Config) values.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Tick period must be non-zero")]
    ZeroTickPeriod,
    #[error("Sample interval must be at least one tick period")]
    SampleIntervalTooShort,
    #[error("Settle delay must be shorter than the tick period")]
    SettleDelayTooLong,
}
