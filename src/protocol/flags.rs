//! Flag bytes carried in every RIPC frame header.
//!
//! The bit assignment below is the single place the wire layout of the flag
//! byte and the extended-flags byte is defined:
//!
//! | Bit    | Frame flag           | Extended flag      |
//! |--------|----------------------|--------------------|
//! | `0x01` | `HAS_OPTIONAL_FLAGS` |                    |
//! | `0x02` | `DATA`               |                    |
//! | `0x04` | `COMPRESSION`        | `FRAGMENT_HEADER`  |
//! | `0x08` | `COMP_FRAGMENT`      | `FRAGMENT`         |
//! | `0x10` | `PACKING`            |                    |
//!
//! Older RIPC write-ups number `DATA` as bit 0. On the wire bit 0 is
//! `HAS_OPTIONAL_FLAGS` and `DATA` is `0x02`, so a plain data frame carries
//! the flag byte `0x02`.

use bitflags::bitflags;

bitflags! {
    /// Flags byte at offset 2 of every frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RipcFlags: u8 {
        /// An extended-flags byte follows the fixed header.
        const HAS_OPTIONAL_FLAGS = 0x01;
        /// The frame carries application data.
        const DATA = 0x02;
        /// The payload is compressed.
        const COMPRESSION = 0x04;
        /// First half of a compressed payload split across two frames.
        const COMP_FRAGMENT = 0x08;
        /// The payload holds length-prefixed packed messages.
        const PACKING = 0x10;
    }
}

bitflags! {
    /// Extended flags byte present when [`RipcFlags::HAS_OPTIONAL_FLAGS`] is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExtendedFlags: u8 {
        /// First fragment of a fragmented message; carries the total length.
        const FRAGMENT_HEADER = 0x04;
        /// Continuation fragment of a fragmented message.
        const FRAGMENT = 0x08;
    }
}

impl RipcFlags {
    /// Interpret a raw flags byte, keeping bits this crate does not know.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self { Self::from_bits_retain(byte) }

    /// Raw byte written to the wire.
    #[must_use]
    pub const fn to_byte(self) -> u8 { self.bits() }

    /// Whether the payload is compressed.
    #[must_use]
    pub const fn is_compressed(self) -> bool { self.contains(Self::COMPRESSION) }

    /// Whether the payload is the first half of a CompFragment pair.
    #[must_use]
    pub const fn is_comp_fragment(self) -> bool { self.contains(Self::COMP_FRAGMENT) }

    /// Whether the payload holds packed sub-messages.
    #[must_use]
    pub const fn is_packed(self) -> bool { self.contains(Self::PACKING) }

    /// Whether an extended-flags byte follows.
    #[must_use]
    pub const fn has_optional_flags(self) -> bool { self.contains(Self::HAS_OPTIONAL_FLAGS) }
}

impl ExtendedFlags {
    /// Interpret a raw extended-flags byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self { Self::from_bits_retain(byte) }

    /// Raw byte written to the wire.
    #[must_use]
    pub const fn to_byte(self) -> u8 { self.bits() }
}
