//! Encoding and decoding of RIPC frame headers.
//!
//! Every frame starts with a fixed three-byte header:
//!
//! ```text
//! offset 0: u16 length   total frame length including this header
//! offset 2: u8  flags    see `RipcFlags`
//! ```
//!
//! Frames with [`RipcFlags::HAS_OPTIONAL_FLAGS`] continue with a fragment
//! header:
//!
//! ```text
//! offset 3: u8  extended flags
//! FRAGMENT_HEADER: u32 total message length, fragment id
//! FRAGMENT:        fragment id
//! ```
//!
//! The functions here are pure: they never hold state between frames.

use bytes::{BufMut, BytesMut};

use super::{ExtendedFlags, FramingError, RipcFlags};
use crate::{
    byte_order::{read_u16_at, read_u32_at},
    fragment::{FragmentId, FragmentIdWidth},
};

/// Size of the fixed frame header.
pub const HEADER_LEN: usize = 3;

/// Largest frame the 16-bit length field can describe.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

const EXTENDED_FLAGS_LEN: usize = 1;
const TOTAL_LEN_FIELD: usize = 4;

/// Fixed header present at the start of every frame.
///
/// # Examples
///
/// ```
/// use ripcframe::protocol::{FrameHeader, RipcFlags};
///
/// let header = FrameHeader::decode(&[0x00, 0x0e, 0x02]).expect("three header bytes");
/// assert_eq!(header.length(), 14);
/// assert_eq!(header.flags(), RipcFlags::DATA);
/// assert!(!header.is_ping());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    length: u16,
    flags: RipcFlags,
}

impl FrameHeader {
    /// Build a header from its parts.
    #[must_use]
    pub const fn new(length: u16, flags: RipcFlags) -> Self { Self { length, flags } }

    /// Header of a ping: a data frame with no payload.
    #[must_use]
    pub const fn ping() -> Self {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "HEADER_LEN is a small constant."
        )]
        let length = HEADER_LEN as u16;
        Self::new(length, RipcFlags::DATA)
    }

    /// Decode the fixed header from the first three bytes of `bytes`.
    ///
    /// Returns `None` when fewer than [`HEADER_LEN`] bytes are available.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let length = read_u16_at(bytes, 0)?;
        let flags = RipcFlags::from_byte(*bytes.get(2)?);
        Some(Self::new(length, flags))
    }

    /// Append the encoded header to `dst`.
    pub fn encode(self, dst: &mut BytesMut) {
        dst.put_u16(self.length);
        dst.put_u8(self.flags.to_byte());
    }

    /// Total frame length including this header.
    #[must_use]
    pub const fn length(self) -> usize { self.length as usize }

    /// Frame flags.
    #[must_use]
    pub const fn flags(self) -> RipcFlags { self.flags }

    /// A frame that is nothing but its header is a ping.
    #[must_use]
    pub const fn is_ping(self) -> bool { self.length as usize == HEADER_LEN }

    /// Reject lengths that cannot hold the fixed header.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::InvalidFrameLength`] when the declared length
    /// is shorter than [`HEADER_LEN`].
    pub const fn validate(self) -> Result<Self, FramingError> {
        if (self.length as usize) < HEADER_LEN {
            return Err(FramingError::InvalidFrameLength {
                length: self.length as usize,
                minimum: HEADER_LEN,
            });
        }
        Ok(self)
    }
}

/// Fragmentation header following the fixed header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentHeader {
    /// First fragment, announcing the reassembled length.
    First {
        /// Length of the complete message once reassembled.
        total_len: u32,
        /// Identifier shared by all fragments of the message.
        id: FragmentId,
    },
    /// Any later fragment.
    Continuation {
        /// Identifier shared by all fragments of the message.
        id: FragmentId,
    },
}

impl FragmentHeader {
    /// Identifier carried by the header.
    #[must_use]
    pub const fn id(self) -> FragmentId {
        match self {
            Self::First { id, .. } | Self::Continuation { id } => id,
        }
    }

    /// Encoded size of a first-fragment header, extended flags included.
    #[must_use]
    pub const fn first_len(width: FragmentIdWidth) -> usize {
        EXTENDED_FLAGS_LEN + TOTAL_LEN_FIELD + width.encoded_len()
    }

    /// Encoded size of a continuation header, extended flags included.
    #[must_use]
    pub const fn continuation_len(width: FragmentIdWidth) -> usize {
        EXTENDED_FLAGS_LEN + width.encoded_len()
    }

    /// Encoded size of this header.
    #[must_use]
    pub const fn encoded_len(self, width: FragmentIdWidth) -> usize {
        match self {
            Self::First { .. } => Self::first_len(width),
            Self::Continuation { .. } => Self::continuation_len(width),
        }
    }

    /// Decode a fragment header from `bytes`, which must start at the
    /// extended-flags byte.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::TruncatedHeader`] when `bytes` is too short
    /// and [`FramingError::UnknownExtendedFlags`] when the extended flags do
    /// not describe a fragment.
    pub fn decode(bytes: &[u8], width: FragmentIdWidth) -> Result<Self, FramingError> {
        let truncated = |need: usize| FramingError::TruncatedHeader {
            have: bytes.len(),
            need,
        };
        let raw = *bytes.first().ok_or_else(|| truncated(EXTENDED_FLAGS_LEN))?;
        let extended = ExtendedFlags::from_byte(raw);

        if extended.contains(ExtendedFlags::FRAGMENT_HEADER) {
            let need = Self::first_len(width);
            let total_len = read_u32_at(bytes, EXTENDED_FLAGS_LEN).ok_or_else(|| truncated(need))?;
            let id = width
                .read(bytes, EXTENDED_FLAGS_LEN + TOTAL_LEN_FIELD)
                .ok_or_else(|| truncated(need))?;
            Ok(Self::First { total_len, id })
        } else if extended.contains(ExtendedFlags::FRAGMENT) {
            let id = width
                .read(bytes, EXTENDED_FLAGS_LEN)
                .ok_or_else(|| truncated(Self::continuation_len(width)))?;
            Ok(Self::Continuation { id })
        } else {
            Err(FramingError::UnknownExtendedFlags { flags: raw })
        }
    }

    /// Append the encoded header, extended flags first.
    pub fn encode(self, width: FragmentIdWidth, dst: &mut BytesMut) {
        match self {
            Self::First { total_len, id } => {
                dst.put_u8(ExtendedFlags::FRAGMENT_HEADER.to_byte());
                dst.put_u32(total_len);
                width.put(id, dst);
            }
            Self::Continuation { id } => {
                dst.put_u8(ExtendedFlags::FRAGMENT.to_byte());
                width.put(id, dst);
            }
        }
    }
}
