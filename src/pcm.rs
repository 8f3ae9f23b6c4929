// PCM frame buffering
//
// Writes arrive in arbitrary sizes; the encoder only takes whole frames.
// Between calls the buffer holds less than one frame.

use crate::error::{OggOpusError, Result};

#[derive(Debug)]
pub struct FrameBuffer {
    pending: Vec<u8>,
    frame_bytes: usize,
    sample_align: usize,
}

/// Whole frames released by one `append`, in arrival order
#[derive(Debug, Default)]
pub struct Frames {
    data: Vec<u8>,
    frame_bytes: usize,
}

impl Frames {
    pub fn len(&self) -> usize {
        if self.frame_bytes == 0 {
            0
        } else {
            self.data.len() / self.frame_bytes
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(self.frame_bytes.max(1))
    }
}

impl FrameBuffer {
    /// `frame_bytes` must be a multiple of `sample_align`
    pub fn new(frame_bytes: usize, sample_align: usize) -> Self {
        debug_assert!(sample_align > 0 && frame_bytes % sample_align == 0);
        FrameBuffer {
            pending: Vec::with_capacity(frame_bytes),
            frame_bytes,
            sample_align,
        }
    }

    /// Buffer `bytes` and release every complete frame now available
    pub fn append(&mut self, bytes: &[u8]) -> Result<Frames> {
        if bytes.len() % self.sample_align != 0 {
            return Err(OggOpusError::InvalidInput {
                len: bytes.len(),
                align: self.sample_align,
            });
        }

        self.pending.extend_from_slice(bytes);
        let whole = self.pending.len() / self.frame_bytes * self.frame_bytes;
        if whole == 0 {
            return Ok(Frames {
                data: Vec::new(),
                frame_bytes: self.frame_bytes,
            });
        }

        let rest = self.pending.split_off(whole);
        let data = std::mem::replace(&mut self.pending, rest);
        Ok(Frames {
            data,
            frame_bytes: self.frame_bytes,
        })
    }

    /// Bytes waiting for the rest of their frame
    pub fn remainder(&self) -> usize {
        self.pending.len()
    }

    /// Forget the partial frame, returning how many bytes were dropped
    pub fn discard_remainder(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}
