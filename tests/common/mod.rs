// Shared helpers for the integration tests
#![allow(dead_code)]

use std::io::{self, Cursor, Write};

use opusmux::{EncodeError, EncoderConfig, FrameDuration, FrameEncoder, OggPage};

/// Encoder stand-in: fixed lookahead, small deterministic packets.
pub struct StubEncoder {
    pub config: EncoderConfig,
    pub lookahead: u16,
    pub packet_len: usize,
    pub frames_encoded: usize,
    /// Index of the frame whose encoding fails
    pub fail_at: Option<usize>,
}

impl StubEncoder {
    pub fn new(sample_rate: u32, channels: u8) -> Self {
        StubEncoder {
            config: EncoderConfig::new(sample_rate, channels, FrameDuration::Ms20),
            lookahead: 312,
            packet_len: 3,
            frames_encoded: 0,
            fail_at: None,
        }
    }

    pub fn stereo_48k() -> Self {
        Self::new(48_000, 2)
    }

    pub fn with_packet_len(mut self, len: usize) -> Self {
        self.packet_len = len;
        self
    }

    pub fn failing_at(mut self, frame: usize) -> Self {
        self.fail_at = Some(frame);
        self
    }
}

impl FrameEncoder for StubEncoder {
    fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn lookahead(&mut self) -> Result<u16, EncodeError> {
        Ok(self.lookahead)
    }

    fn encode_frame(&mut self, pcm: &[i16]) -> Result<Vec<u8>, EncodeError> {
        let expected = self.config.frame_samples() * self.config.channels as usize;
        if pcm.len() != expected {
            return Err(EncodeError::new(format!("got {} samples, expected {}", pcm.len(), expected)));
        }
        if self.fail_at == Some(self.frames_encoded) {
            return Err(EncodeError::new("stub encoder failure"));
        }
        self.frames_encoded += 1;
        let mut packet = vec![(self.frames_encoded % 251) as u8; self.packet_len];
        if let Some(first) = packet.first_mut() {
            // TOC byte: CELT fullband 20 ms, one frame
            *first = 0xf8;
        }
        Ok(packet)
    }

    fn vendor(&self) -> String {
        "stub encoder".to_string()
    }
}

/// Sink that accepts `budget` bytes and then fails every write
#[derive(Debug)]
pub struct FailingSink {
    pub written: Vec<u8>,
    pub budget: usize,
}

impl FailingSink {
    pub fn new(budget: usize) -> Self {
        FailingSink {
            written: Vec::new(),
            budget,
        }
    }
}

impl Write for FailingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written.len() + buf.len() > self.budget {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Zeroed PCM covering `frames` 20 ms frames of `config`
pub fn pcm_frames(config: &EncoderConfig, frames: usize) -> Vec<u8> {
    vec![0u8; config.frame_bytes() * frames]
}

/// A sine tone as interleaved s16le, `samples` per channel
pub fn tone(sample_rate: u32, channels: u8, samples: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples * channels as usize * 2);
    for n in 0..samples {
        let t = n as f64 / f64::from(sample_rate);
        let value = ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16;
        for _ in 0..channels {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

pub fn parse_pages(bytes: &[u8]) -> Vec<OggPage> {
    OggPage::read_all(&mut Cursor::new(bytes)).expect("stream should parse")
}

/// Samples a conforming decoder would output: final granule minus pre-skip
pub fn decoded_samples(pages: &[OggPage], pre_skip: u16) -> u64 {
    let last = pages.last().expect("stream has pages");
    last.header.granule_position - u64::from(pre_skip)
}

/// Complete packets in stream order, reassembled across pages
pub fn packets(pages: &[OggPage]) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut partial: Vec<u8> = Vec::new();
    for page in pages {
        let mut laced = 0;
        let mut start = 0;
        for &lace in &page.header.segment_table {
            laced += lace as usize;
            if lace < 255 {
                partial.extend_from_slice(&page.data[start..laced]);
                out.push(std::mem::take(&mut partial));
                start = laced;
            }
        }
        partial.extend_from_slice(&page.data[start..laced]);
    }
    out
}
