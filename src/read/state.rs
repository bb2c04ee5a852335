use derive_more::Display;

/// Result of one receive attempt, as reported to
/// [`advance_on_socket_read`](super::ReadBufferStateMachine::advance_on_socket_read).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes were appended to the receive buffer.
    Data(usize),
    /// Nothing was received this time.
    WouldBlock,
    /// The peer closed the stream.
    Closed,
}

/// Where the receive buffer stands relative to the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum ReadState {
    /// Every received byte has been consumed.
    #[default]
    #[display("no data")]
    NoData,
    /// Part of a frame header has arrived and the rest fits the buffer.
    #[display("length unknown, incomplete")]
    LengthUnknownIncomplete,
    /// The frame header would run past the end of the buffer.
    #[display("length unknown, insufficient space")]
    LengthUnknownInsufficient,
    /// The frame length is known and the rest of the frame fits the buffer.
    #[display("length known, incomplete")]
    LengthKnownIncomplete,
    /// The frame is longer than the space left after its start.
    #[display("length known, insufficient space")]
    LengthKnownInsufficient,
    /// A message or ping is ready for the application.
    #[display("complete")]
    Complete,
    /// The peer closed the stream.
    #[display("end of stream")]
    EndOfStream,
}

impl ReadState {
    /// Whether the caller must compact or grow the receive buffer.
    #[must_use]
    pub const fn is_insufficient(self) -> bool {
        matches!(
            self,
            Self::LengthUnknownInsufficient | Self::LengthKnownInsufficient
        )
    }

    /// Whether more bytes must be received before anything changes.
    #[must_use]
    pub const fn needs_data(self) -> bool {
        matches!(
            self,
            Self::NoData | Self::LengthUnknownIncomplete | Self::LengthKnownIncomplete
        )
    }
}

/// How the current complete frame is being delivered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum ReadSubState {
    /// One message, or a ping.
    #[default]
    #[display("normal")]
    Normal,
    /// Length-prefixed sub-messages read in place.
    #[display("packed")]
    Packed,
    /// Length-prefixed sub-messages read from the decompressed body.
    #[display("packed compressed")]
    PackedCompressed,
    /// Fragment being appended to its reassembly.
    #[display("fragmented")]
    Fragmented,
    /// Compressed fragment being decompressed into its reassembly.
    #[display("fragmented compressed")]
    FragmentedCompressed,
    /// A reassembled message is exposed.
    #[display("fragment complete")]
    FragmentCompleteReassembled,
}
