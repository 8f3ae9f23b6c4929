// Opus identification header

use std::io::Cursor;

use serde::Serialize;

use crate::config::StreamConfig;
use crate::error::{OggOpusError, Result};
use crate::opus::{CHANNEL_MAPPING_FAMILY_RTP, OPUS_HEAD_SIZE, OPUS_HEAD_VERSION, OPUS_SIGNATURE};
use crate::utils::io::{read_le_i16, read_le_u16, read_le_u32, read_u8};

/// Fields of an "OpusHead" packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdHeader {
    pub version: u8,
    pub channels: u8,
    pub pre_skip: u16,
    /// Informational only, playback is always at 48 kHz
    pub input_sample_rate: u32,
    /// Q7.8 dB
    pub output_gain: i16,
    pub channel_mapping_family: u8,
}

impl IdHeader {
    pub fn from_stream(config: &StreamConfig) -> Self {
        IdHeader {
            version: OPUS_HEAD_VERSION,
            channels: config.channels(),
            pre_skip: config.pre_skip(),
            input_sample_rate: config.sample_rate(),
            output_gain: config.output_gain(),
            channel_mapping_family: CHANNEL_MAPPING_FAMILY_RTP,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::with_capacity(OPUS_HEAD_SIZE);
        v.extend_from_slice(OPUS_SIGNATURE);
        v.push(self.version);
        v.push(self.channels);
        v.extend_from_slice(&self.pre_skip.to_le_bytes());
        v.extend_from_slice(&self.input_sample_rate.to_le_bytes());
        v.extend_from_slice(&self.output_gain.to_le_bytes());
        v.push(self.channel_mapping_family);
        v
    }

    /// Parse an ID header packet
    pub fn parse(packet: &[u8]) -> Result<Self> {
        if packet.len() < OPUS_HEAD_SIZE || &packet[0..8] != OPUS_SIGNATURE {
            return Err(OggOpusError::Format("not an OpusHead packet".to_string()));
        }

        let mut reader = Cursor::new(&packet[8..]);
        let version = read_u8(&mut reader)?;
        // Only the major version (upper nibble) is incompatible
        if version >> 4 != 0 {
            return Err(OggOpusError::Format(format!("unsupported OpusHead version {version}")));
        }

        Ok(IdHeader {
            version,
            channels: read_u8(&mut reader)?,
            pre_skip: read_le_u16(&mut reader)?,
            input_sample_rate: read_le_u32(&mut reader)?,
            output_gain: read_le_i16(&mut reader)?,
            channel_mapping_family: read_u8(&mut reader)?,
        })
    }
}
