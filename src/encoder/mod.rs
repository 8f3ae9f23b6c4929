// Frame encoder capability
//
// The muxer never depends on a concrete codec. Anything that can turn one
// frame of interleaved i16 PCM into one compressed packet, and report its
// algorithmic lookahead, can drive the writer.

use crate::config::EncoderConfig;
use thiserror::Error;

#[cfg(feature = "libopus")]
pub mod libopus;

#[cfg(feature = "libopus")]
pub use libopus::LibopusEncoder;

/// Failure reported by an encoder, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EncodeError {
    message: String,
}

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        EncodeError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub trait FrameEncoder {
    /// Input format and frame size the encoder was configured with
    fn config(&self) -> &EncoderConfig;

    /// Algorithmic delay in samples, used unconverted as the default pre-skip.
    ///
    /// Pre-skip and granule positions are counted at 48 kHz. Encoders running
    /// at another input rate should report 48 kHz samples here if decoders
    /// are to trim the stream exactly.
    fn lookahead(&mut self) -> Result<u16, EncodeError>;

    /// Encode exactly one frame (`frame_samples * channels` interleaved samples)
    fn encode_frame(&mut self, pcm: &[i16]) -> Result<Vec<u8>, EncodeError>;

    /// Vendor string written to the comment header
    fn vendor(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

impl<E: FrameEncoder + ?Sized> FrameEncoder for Box<E> {
    fn config(&self) -> &EncoderConfig {
        (**self).config()
    }

    fn lookahead(&mut self) -> Result<u16, EncodeError> {
        (**self).lookahead()
    }

    fn encode_frame(&mut self, pcm: &[i16]) -> Result<Vec<u8>, EncodeError> {
        (**self).encode_frame(pcm)
    }

    fn vendor(&self) -> String {
        (**self).vendor()
    }
}

/// Decode one frame of s16le bytes into interleaved samples
pub(crate) fn frame_to_samples(frame: &[u8]) -> Vec<i16> {
    frame
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}
