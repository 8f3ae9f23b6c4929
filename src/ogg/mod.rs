// Ogg container framing
//
// OGG Page Structure:
// - Capture Pattern: "OggS" (4 bytes)
// - Version: 0 (1 byte)
// - Header Type: 1=continuation, 2=bos, 4=eos (1 byte)
// - Granule Position (8 bytes, little-endian)
// - Bitstream Serial Number (4 bytes, little-endian)
// - Page Sequence Number (4 bytes, little-endian)
// - CRC Checksum (4 bytes, little-endian, computed with this field zeroed)
// - Number of Page Segments (1 byte)
// - Segment Table (variable)
// - Packet data

pub mod assembler;
pub mod crc;
pub mod page;

pub use assembler::PageAssembler;
pub use page::{OggPage, OggPageHeader};

// OGG signature
pub const OGG_SIGNATURE: &[u8; 4] = b"OggS";

pub const OGG_VERSION: u8 = 0;

// Fixed part of the page header, before the segment table
pub const OGG_HEADER_SIZE: usize = 27;

// A page holds at most 255 lacing values of at most 255 bytes each
pub const MAX_SEGMENTS: usize = 255;
pub const MAX_SEGMENT_SIZE: usize = 255;

// OGG page header types
pub const OGG_HEADER_TYPE_CONTINUATION: u8 = 0x01;
pub const OGG_HEADER_TYPE_BOS: u8 = 0x02; // Beginning of Stream
pub const OGG_HEADER_TYPE_EOS: u8 = 0x04; // End of Stream

// Granule position of a page on which no packet finishes
pub const GRANULE_NONE: u64 = u64::MAX;
