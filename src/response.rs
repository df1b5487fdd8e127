//! Decoding of the frames the supply sends back.
//!
//! The response header is two bytes longer than the request header, so the
//! echoed floats sit at 10/14/18 instead of 8/12/16.

use crate::{
    error::FrameError,
    types::{AckStatus, ArcCounts, Measurements, Readout, ACK_OK},
};

const ACK_OFFSET: usize = 6;
const VOLTAGE_OFFSET: usize = 10;
const CURRENT_OFFSET: usize = 14;
const POWER_OFFSET: usize = 18;
const ARC_IM_OFFSET: usize = 25;
const ARC_UXI_OFFSET: usize = 27;
const ARC_DU_OFFSET: usize = 29;

/// Anything this short is not treated as a response at all.
pub const MIN_RESPONSE_LEN: usize = 9;
/// Shortest response carrying all three arc counters.
pub const FULL_RESPONSE_LEN: usize = ARC_DU_OFFSET + 2;

/// A borrowed view over received bytes.
#[derive(Debug, Clone, Copy)]
pub struct Response<'a> {
    bytes: &'a [u8],
}

impl<'a> Response<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether enough bytes arrived to be worth decoding.
    pub fn is_complete(&self) -> bool {
        self.bytes.len() >= MIN_RESPONSE_LEN
    }

    /// The two ack bytes.
    pub fn ack(&self) -> Result<[u8; 2], FrameError> {
        self.field::<2>(ACK_OFFSET)
    }

    /// Whether the supply accepted the request.
    pub fn status(&self) -> Result<AckStatus, FrameError> {
        self.ack().map(AckStatus::from)
    }

    /// Like [`Self::status`], but a rejection is an error.
    pub fn expect_ok(&self) -> Result<(), FrameError> {
        let ack = self.ack()?;
        if ack == ACK_OK {
            Ok(())
        } else {
            Err(FrameError::ProtocolMismatch { ack })
        }
    }

    /// Echoed voltage.
    pub fn voltage(&self) -> Result<f32, FrameError> {
        self.f32_le(VOLTAGE_OFFSET)
    }

    /// Echoed current.
    pub fn current(&self) -> Result<f32, FrameError> {
        self.f32_le(CURRENT_OFFSET)
    }

    /// Echoed power.
    pub fn power(&self) -> Result<f32, FrameError> {
        self.f32_le(POWER_OFFSET)
    }

    pub fn arc_im_count(&self) -> Result<u16, FrameError> {
        self.u16_be(ARC_IM_OFFSET)
    }

    pub fn arc_uxi_count(&self) -> Result<u16, FrameError> {
        self.u16_be(ARC_UXI_OFFSET)
    }

    pub fn arc_du_count(&self) -> Result<u16, FrameError> {
        self.u16_be(ARC_DU_OFFSET)
    }

    pub fn measurements(&self) -> Result<Measurements, FrameError> {
        Ok(Measurements {
            voltage: self.voltage()?,
            current: self.current()?,
            power: self.power()?,
        })
    }

    pub fn arc_counts(&self) -> Result<ArcCounts, FrameError> {
        Ok(ArcCounts {
            du: self.arc_du_count()?,
            im: self.arc_im_count()?,
            uxi: self.arc_uxi_count()?,
        })
    }

    /// Decode everything available.
    ///
    /// Fails with [`FrameError::ShortBuffer`] only when the response is too short to
    /// count as one; missing measurements or counters are left as `None`.
    pub fn readout(&self) -> Result<Readout, FrameError> {
        if !self.is_complete() {
            return Err(FrameError::ShortBuffer {
                needed: MIN_RESPONSE_LEN,
                available: self.bytes.len(),
            });
        }
        let ack = self.ack()?;
        Ok(Readout {
            ack,
            status: AckStatus::from(ack),
            measurements: self.measurements().ok(),
            arcs: self.arc_counts().ok(),
        })
    }

    fn field<const N: usize>(&self, offset: usize) -> Result<[u8; N], FrameError> {
        let needed = offset + N;
        let slice = self.bytes.get(offset..needed).ok_or(FrameError::ShortBuffer {
            needed,
            available: self.bytes.len(),
        })?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(slice);
        Ok(raw)
    }

    fn f32_le(&self, offset: usize) -> Result<f32, FrameError> {
        self.field::<4>(offset).map(f32::from_le_bytes)
    }

    fn u16_be(&self, offset: usize) -> Result<u16, FrameError> {
        self.field::<2>(offset).map(u16::from_be_bytes)
    }
}
