//! Per-variant protocol behaviour selected once per channel.
//!
//! The read state machine and the frame writer are generic over
//! [`ProtocolFunctions`], so the variant is fixed at channel creation and
//! header parsing is monomorphised rather than dispatched per frame.

use std::fmt;

use super::{FragmentHeader, FrameHeader, FramingError, HEADER_LEN, RipcVersion};
use crate::fragment::FragmentIdWidth;

/// Framing rules that differ between RIPC protocol variants.
pub trait ProtocolFunctions: Copy + fmt::Debug + Send + Sync + 'static {
    /// Select the functions for a negotiated `version`, or `None` when this
    /// variant does not speak it.
    fn for_version(version: RipcVersion) -> Option<Self>;

    /// Version negotiated for the channel.
    fn version(&self) -> RipcVersion;

    /// Width of fragment identifiers on the wire.
    fn fragment_id_width(&self) -> FragmentIdWidth;

    /// Whether payloads carry RWF-encoded messages.
    fn is_rwf(&self) -> bool { true }

    /// Size of the fixed frame header.
    fn header_len(&self) -> usize { HEADER_LEN }

    /// Header bytes of a first fragment, fixed header included.
    fn first_fragment_header_len(&self) -> usize {
        self.header_len() + FragmentHeader::first_len(self.fragment_id_width())
    }

    /// Header bytes of a continuation fragment, fixed header included.
    fn continuation_header_len(&self) -> usize {
        self.header_len() + FragmentHeader::continuation_len(self.fragment_id_width())
    }

    /// Decode the fixed header of the frame starting at `frame_start`.
    ///
    /// Returns `None` until the whole fixed header has arrived.
    fn frame_header(&self, bytes: &[u8], frame_start: usize) -> Option<FrameHeader> {
        FrameHeader::decode(bytes.get(frame_start..)?)
    }

    /// Decode the fragment header of a complete frame.
    ///
    /// # Errors
    ///
    /// Returns a [`FramingError`] when the optional header is truncated or
    /// its extended flags are not understood.
    fn fragment_header(&self, frame: &[u8]) -> Result<FragmentHeader, FramingError> {
        let optional = frame.get(self.header_len()..).unwrap_or_default();
        FragmentHeader::decode(optional, self.fragment_id_width())
    }
}

/// RIPC 13 and later: two-byte fragment identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RipcFunctions {
    version: RipcVersion,
}

impl RipcFunctions {
    /// Select the functions for `version`.
    ///
    /// Returns `None` for versions that predate two-byte fragment
    /// identifiers; use [`LegacyRipcFunctions`] for those.
    #[must_use]
    pub const fn new(version: RipcVersion) -> Option<Self> {
        match version.fragment_id_width() {
            FragmentIdWidth::TwoBytes => Some(Self { version }),
            FragmentIdWidth::OneByte => None,
        }
    }
}

impl Default for RipcFunctions {
    fn default() -> Self {
        Self {
            version: RipcVersion::LATEST,
        }
    }
}

impl ProtocolFunctions for RipcFunctions {
    fn for_version(version: RipcVersion) -> Option<Self> { Self::new(version) }

    fn version(&self) -> RipcVersion { self.version }

    fn fragment_id_width(&self) -> FragmentIdWidth { FragmentIdWidth::TwoBytes }
}

/// RIPC 11 and 12: one-byte fragment identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyRipcFunctions {
    version: RipcVersion,
}

impl LegacyRipcFunctions {
    /// Select the functions for `version`.
    ///
    /// Returns `None` for versions that use two-byte fragment identifiers.
    #[must_use]
    pub const fn new(version: RipcVersion) -> Option<Self> {
        match version.fragment_id_width() {
            FragmentIdWidth::OneByte => Some(Self { version }),
            FragmentIdWidth::TwoBytes => None,
        }
    }
}

impl Default for LegacyRipcFunctions {
    fn default() -> Self {
        Self {
            version: RipcVersion::V12,
        }
    }
}

impl ProtocolFunctions for LegacyRipcFunctions {
    fn for_version(version: RipcVersion) -> Option<Self> { Self::new(version) }

    fn version(&self) -> RipcVersion { self.version }

    fn fragment_id_width(&self) -> FragmentIdWidth { FragmentIdWidth::OneByte }
}
