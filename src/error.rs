// Error types for the Ogg Opus writer
//
// Every failure raised by `write` leaves the writer unusable. The writer keeps
// a replayable copy of the first failure so later calls report the same thing.

use crate::encoder::EncodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OggOpusError {
    /// PCM input that does not end on a whole multi-channel sample
    #[error("PCM input of {len} bytes is not aligned to {align}-byte sample frames")]
    InvalidInput { len: usize, align: usize },

    #[error("cannot write to a closed Ogg Opus writer")]
    Closed,

    #[error("encoding failed: {0}")]
    EncodingFailed(#[from] EncodeError),

    #[error("failed to write page to sink: {0}")]
    SinkWrite(#[source] std::io::Error),

    #[error("invalid stream configuration: {0}")]
    InvalidConfig(String),

    /// Opening or creating the destination failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed data met while inspecting an existing stream
    #[error("format error: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, OggOpusError>;

impl OggOpusError {
    /// Build an equivalent error (same variant, same message).
    ///
    /// `std::io::Error` is not `Clone`, so I/O variants are rebuilt from their
    /// kind and rendered message.
    pub(crate) fn replay(&self) -> OggOpusError {
        match self {
            OggOpusError::InvalidInput { len, align } => OggOpusError::InvalidInput {
                len: *len,
                align: *align,
            },
            OggOpusError::Closed => OggOpusError::Closed,
            OggOpusError::EncodingFailed(e) => OggOpusError::EncodingFailed(e.clone()),
            OggOpusError::SinkWrite(e) => {
                OggOpusError::SinkWrite(std::io::Error::new(e.kind(), e.to_string()))
            }
            OggOpusError::InvalidConfig(msg) => OggOpusError::InvalidConfig(msg.clone()),
            OggOpusError::Io(e) => OggOpusError::Io(std::io::Error::new(e.kind(), e.to_string())),
            OggOpusError::Format(msg) => OggOpusError::Format(msg.clone()),
        }
    }

    /// Whether the error came from the destination rather than the data
    pub fn is_sink_error(&self) -> bool {
        matches!(self, OggOpusError::SinkWrite(_) | OggOpusError::Io(_))
    }
}

/// `into_inner` failed to finish the stream.
///
/// Carries the caller-supplied destination so it is never lost with the
/// writer, in the manner of `std::io::IntoInnerError`.
#[derive(Error)]
#[error("failed to finish Ogg Opus stream: {error}")]
pub struct IntoInnerError<W> {
    #[source]
    error: OggOpusError,
    sink: Option<W>,
}

impl<W> IntoInnerError<W> {
    pub(crate) fn new(error: OggOpusError, sink: Option<W>) -> Self {
        IntoInnerError { error, sink }
    }

    pub fn error(&self) -> &OggOpusError {
        &self.error
    }

    /// The destination, `None` when the writer opened it itself
    pub fn into_inner(self) -> Option<W> {
        self.sink
    }

    pub fn into_parts(self) -> (OggOpusError, Option<W>) {
        (self.error, self.sink)
    }
}

impl<W> std::fmt::Debug for IntoInnerError<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntoInnerError")
            .field("error", &self.error)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl<W> From<IntoInnerError<W>> for OggOpusError {
    fn from(e: IntoInnerError<W>) -> Self {
        e.error
    }
}
