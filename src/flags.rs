//! The control/status byte carried at offset 20 of every frame.

use modular_bitfield::prelude::*;

/// Named bits of the control byte.
///
/// Bit 3 has no documented meaning; it is kept as-is when a raw byte is merged in.
#[bitfield(bits = 8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlags {
    /// `0x01` - Output relay closed.
    pub relay: bool,
    /// `0x02` - Power stage enabled.
    pub power: bool,
    /// `0x04` - Fault reset request.
    pub reset: bool,
    #[skip]
    __: B1,
    /// `0x10` - Analog interface in control.
    pub analog: bool,
    /// `0x20` - Remote control active.
    pub ctrl: bool,
    /// `0x40` - Profibus interface in control.
    pub prof_bus: bool,
    /// `0x80` - Display/front panel.
    pub disp: bool,
}

impl ControlFlags {
    pub const RELAY: u8 = 0x01;
    pub const POWER: u8 = 0x02;
    pub const RESET: u8 = 0x04;
    pub const ANALOG: u8 = 0x10;
    pub const CTRL: u8 = 0x20;
    pub const PROF_BUS: u8 = 0x40;
    pub const DISP: u8 = 0x80;

    /// Interpret a raw control byte.
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_bytes([raw])
    }

    /// The control byte as it goes on the wire.
    pub const fn raw(self) -> u8 {
        self.into_bytes()[0]
    }

    /// Union of both flag sets.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self::from_raw(self.raw() | other.raw())
    }

    /// Remove every bit set in `other`.
    #[must_use]
    pub const fn without(self, other: Self) -> Self {
        Self::from_raw(self.raw() & !other.raw())
    }
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u8> for ControlFlags {
    fn from(raw: u8) -> Self {
        Self::from_raw(raw)
    }
}

impl From<ControlFlags> for u8 {
    fn from(flags: ControlFlags) -> Self {
        flags.raw()
    }
}
