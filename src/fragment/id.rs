use bytes::{BufMut, BytesMut};
use derive_more::{Display, From, Into};

use crate::byte_order::read_u16_at;

/// Identifier shared by every fragment of one fragmented message.
///
/// Identifiers are scoped to a channel and direction. Zero is never issued
/// by [`Fragmenter`](crate::fragment::Fragmenter).
///
/// # Examples
///
/// ```
/// use ripcframe::fragment::FragmentId;
/// let id = FragmentId::new(42);
/// assert_eq!(id.get(), 42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct FragmentId(u16);

impl FragmentId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u16) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u16 { self.0 }
}

/// On-wire width of a fragment identifier, fixed by the negotiated version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FragmentIdWidth {
    /// One byte, used before RIPC 13.
    OneByte,
    /// Two bytes in network order, used from RIPC 13.
    TwoBytes,
}

impl FragmentIdWidth {
    /// Number of bytes the identifier occupies.
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        match self {
            Self::OneByte => 1,
            Self::TwoBytes => 2,
        }
    }

    /// Largest identifier representable at this width.
    #[must_use]
    pub const fn max_id(self) -> FragmentId {
        match self {
            Self::OneByte => FragmentId(u8::MAX as u16),
            Self::TwoBytes => FragmentId(u16::MAX),
        }
    }

    /// Read an identifier starting at `offset`.
    #[must_use]
    pub fn read(self, bytes: &[u8], offset: usize) -> Option<FragmentId> {
        match self {
            Self::OneByte => bytes.get(offset).map(|id| FragmentId(u16::from(*id))),
            Self::TwoBytes => read_u16_at(bytes, offset).map(FragmentId),
        }
    }

    /// Append an identifier, truncating to the low byte for one-byte widths.
    pub fn put(self, id: FragmentId, dst: &mut BytesMut) {
        match self {
            Self::OneByte => dst.put_u8(id.0.to_le_bytes()[0]),
            Self::TwoBytes => dst.put_u16(id.0),
        }
    }
}
