// Opus comment header ("OpusTags")
//
// Same tag block as a Vorbis comment, minus the framing bit:
// vendor length + vendor, comment count, then length-prefixed KEY=value strings.

use std::io::{Cursor, Read};

use crate::error::{OggOpusError, Result};
use crate::opus::OPUS_TAGS;
use crate::utils::io::read_le_u32;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpusTags {
    pub vendor_string: String,
    pub comments: Vec<(String, String)>,
}

impl OpusTags {
    pub fn new(vendor_string: impl Into<String>) -> Self {
        OpusTags {
            vendor_string: vendor_string.into(),
            comments: Vec::new(),
        }
    }

    pub fn with_comments(mut self, comments: Vec<(String, String)>) -> Self {
        self.comments = comments;
        self
    }

    /// Serialise as a complete comment header packet
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(OPUS_TAGS);
        v.extend_from_slice(&(self.vendor_string.len() as u32).to_le_bytes());
        v.extend_from_slice(self.vendor_string.as_bytes());
        v.extend_from_slice(&(self.comments.len() as u32).to_le_bytes());
        for (field, value) in &self.comments {
            let entry = format!("{field}={value}");
            v.extend_from_slice(&(entry.len() as u32).to_le_bytes());
            v.extend_from_slice(entry.as_bytes());
        }
        v
    }

    /// Parse a comment header packet
    pub fn parse(packet: &[u8]) -> Result<Self> {
        if packet.len() < 8 || &packet[0..8] != OPUS_TAGS {
            return Err(OggOpusError::Format("not an OpusTags packet".to_string()));
        }
        let mut reader = Cursor::new(&packet[8..]);

        let vendor_string = read_string(&mut reader)?;
        let comment_count = read_le_u32(&mut reader)? as usize;

        let mut comments = Vec::new();
        for _ in 0..comment_count {
            let comment_string = read_string(&mut reader)?;
            // Parse comment (format: FIELD=value)
            if let Some((field, value)) = comment_string.split_once('=') {
                comments.push((field.to_string(), value.to_string()));
            }
        }

        Ok(OpusTags {
            vendor_string,
            comments,
        })
    }

    /// Get a comment value by field name
    pub fn get(&self, field: &str) -> Option<&String> {
        self.comments
            .iter()
            .find(|(f, _)| f.eq_ignore_ascii_case(field))
            .map(|(_, v)| v)
    }
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_le_u32(reader)? as usize;
    let mut bytes = Vec::new();
    reader.take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(OggOpusError::Format("truncated OpusTags string".to_string()));
    }
    Ok(String::from_utf8_lossy(&bytes).to_string())
}
