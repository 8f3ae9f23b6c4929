//! opusmux - streaming Ogg Opus muxer
//!
//! Feed raw interleaved 16-bit PCM in chunks of any size; get a standard
//! `.opus` (Ogg-encapsulated Opus) bitstream out, written page by page.
//! Perceptual encoding is delegated to a [`FrameEncoder`]; this crate handles
//! frame segmentation, the Opus header packets, granule positions and Ogg
//! page framing.
//!
//! ```no_run
//! # use opusmux::{EncoderConfig, FrameEncoder, EncodeError, OggOpusWriter};
//! # struct MyEncoder(EncoderConfig);
//! # impl FrameEncoder for MyEncoder {
//! #     fn config(&self) -> &EncoderConfig { &self.0 }
//! #     fn lookahead(&mut self) -> Result<u16, EncodeError> { Ok(312) }
//! #     fn encode_frame(&mut self, _pcm: &[i16]) -> Result<Vec<u8>, EncodeError> { Ok(vec![0xf8]) }
//! # }
//! # fn main() -> opusmux::Result<()> {
//! # let encoder = MyEncoder(EncoderConfig::new(48_000, 2, opusmux::FrameDuration::Ms20));
//! let mut writer = OggOpusWriter::create("out.opus", encoder)?;
//! writer.write(&[0u8; 3840])?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod ogg;
pub mod opus;
pub mod pcm;
pub mod sink;
pub mod utils;
pub mod writer;

pub use config::{
    Application, EncoderConfig, FrameDuration, StreamConfig, WriterOptions, BYTES_PER_SAMPLE,
};
pub use encoder::{EncodeError, FrameEncoder};
pub use error::{IntoInnerError, OggOpusError, Result};
pub use ogg::assembler::EncodedPacket;
pub use ogg::{OggPage, PageAssembler};
pub use opus::{IdHeader, OpusTags};
pub use sink::Sink;
pub use writer::OggOpusWriter;

#[cfg(feature = "libopus")]
pub use encoder::LibopusEncoder;
