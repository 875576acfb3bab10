/// Errors that can occur during value framing and deframing.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The value could not be serialized.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    /// The length line is not a non-negative decimal integer.
    #[error("invalid frame length {line:?}")]
    InvalidLength { line: String },

    /// The byte following a payload is not the frame terminator.
    #[error("missing frame terminator (found byte 0x{found:02x})")]
    MissingTerminator { found: u8 },

    /// The payload is not a valid encoding of the expected value.
    #[error("failed to decode payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A previous framing or decoding error left the stream unusable.
    #[error("stream desynchronized by an earlier error")]
    Desynchronized,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True for errors that mean the reader no longer agrees with the sender
    /// on where frames begin.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidLength { .. }
                | FrameError::MissingTerminator { .. }
                | FrameError::PayloadTooLarge { .. }
                | FrameError::Desynchronized
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
