// Opus in Ogg (RFC 7845)
//
// Stream layout:
// - Page 0: identification header "OpusHead" (19 bytes for mapping family 0)
// - Page 1: comment header "OpusTags" with a Vorbis-comment style tag block
// - Audio pages: one Opus packet per encoder frame
//
// Granule positions count samples at 48 kHz regardless of the input rate.
// A decoder discards `pre_skip` samples from the start of the stream.

pub mod header;
pub mod tags;

pub use header::IdHeader;
pub use tags::OpusTags;

pub const OPUS_SIGNATURE: &[u8; 8] = b"OpusHead";
pub const OPUS_TAGS: &[u8; 8] = b"OpusTags";

/// ID header version written by this crate
pub const OPUS_HEAD_VERSION: u8 = 1;

/// Size of an ID header with channel mapping family 0
pub const OPUS_HEAD_SIZE: usize = 19;

/// Mono or stereo, no mapping table
pub const CHANNEL_MAPPING_FAMILY_RTP: u8 = 0;
