//! Negotiated RIPC protocol versions.

use derive_more::Display;

use crate::fragment::FragmentIdWidth;

/// RIPC connection version agreed during the connection handshake.
///
/// The version only affects this crate through the width of fragment
/// identifiers: versions before 13 use one byte, later versions two.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RipcVersion {
    /// RIPC 11.
    #[display("RIPC11")]
    V11,
    /// RIPC 12.
    #[display("RIPC12")]
    V12,
    /// RIPC 13, the first version with two-byte fragment identifiers.
    #[display("RIPC13")]
    V13,
    /// RIPC 14.
    #[display("RIPC14")]
    V14,
}

impl RipcVersion {
    /// Most recent version this crate speaks.
    pub const LATEST: Self = Self::V14;

    /// Numeric version code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::V11 => 11,
            Self::V12 => 12,
            Self::V13 => 13,
            Self::V14 => 14,
        }
    }

    /// Look up a version by its numeric code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            11 => Some(Self::V11),
            12 => Some(Self::V12),
            13 => Some(Self::V13),
            14 => Some(Self::V14),
            _ => None,
        }
    }

    /// Width of fragment identifiers under this version.
    #[must_use]
    pub const fn fragment_id_width(self) -> FragmentIdWidth {
        match self {
            Self::V11 | Self::V12 => FragmentIdWidth::OneByte,
            Self::V13 | Self::V14 => FragmentIdWidth::TwoBytes,
        }
    }
}

impl Default for RipcVersion {
    fn default() -> Self { Self::LATEST }
}
