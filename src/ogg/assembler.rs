// Page assembly
//
// Packets go in (headers first, then audio); finished pages go out to the
// sink as soon as they are complete. The assembler owns every per-page
// counter: sequence number, granule position and the stream flags.

use std::io::Write;

use tracing::trace;

use crate::config::GRANULE_RATE;
use crate::error::{OggOpusError, Result};
use crate::ogg::page::{lacing_values, OggPage};
use crate::ogg::{
    GRANULE_NONE, MAX_SEGMENTS, OGG_HEADER_TYPE_BOS, OGG_HEADER_TYPE_CONTINUATION,
    OGG_HEADER_TYPE_EOS,
};

/// One compressed packet on its way into the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    pub data: Vec<u8>,
    /// Samples per channel at the input rate, zero for header packets
    pub samples: u64,
    pub is_header: bool,
}

impl EncodedPacket {
    pub fn header(data: Vec<u8>) -> Self {
        EncodedPacket {
            data,
            samples: 0,
            is_header: true,
        }
    }

    pub fn audio(data: Vec<u8>, samples: u64) -> Self {
        EncodedPacket {
            data,
            samples,
            is_header: false,
        }
    }
}

#[derive(Debug)]
pub struct PageAssembler {
    serial: u32,
    sample_rate: u32,
    /// Granule of the first audio sample (the pre-skip)
    granule_origin: u64,
    /// Audio samples per channel submitted so far, at the input rate
    samples_submitted: u64,
    next_sequence: u32,
    // Page under construction
    lacing: Vec<u8>,
    body: Vec<u8>,
    page_granule: u64,
    continued: bool,
    audio_started: bool,
    finished: bool,
    bytes_written: u64,
}

impl PageAssembler {
    pub fn new(serial: u32, sample_rate: u32, granule_origin: u64) -> Self {
        PageAssembler {
            serial,
            sample_rate,
            granule_origin,
            samples_submitted: 0,
            next_sequence: 0,
            lacing: Vec::with_capacity(MAX_SEGMENTS),
            body: Vec::new(),
            page_granule: GRANULE_NONE,
            continued: false,
            audio_started: false,
            finished: false,
            bytes_written: 0,
        }
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Sequence number the next page will carry
    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn samples_submitted(&self) -> u64 {
        self.samples_submitted
    }

    /// Granule position after the last submitted packet
    pub fn granule(&self) -> u64 {
        self.granule_origin
            + self.samples_submitted * GRANULE_RATE as u64 / self.sample_rate as u64
    }

    /// Add a packet. Header packets always get a page of their own.
    pub fn submit<W: Write + ?Sized>(&mut self, out: &mut W, packet: &EncodedPacket) -> Result<()> {
        if self.finished {
            return Err(OggOpusError::Closed);
        }

        if packet.is_header {
            if self.audio_started {
                return Err(OggOpusError::Format(
                    "header packet submitted after audio".to_string(),
                ));
            }
            self.flush(out)?;
            self.append(out, &packet.data, 0)?;
            return self.flush(out);
        }

        self.audio_started = true;
        self.samples_submitted += packet.samples;
        let granule = self.granule();
        self.append(out, &packet.data, granule)
    }

    /// Emit the page under construction, if any
    pub fn flush<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        if self.lacing.is_empty() {
            return Ok(());
        }
        self.emit_page(out, 0)
    }

    /// Emit pending data and the end-of-stream page. Later calls do nothing.
    ///
    /// The terminal page carries no packets and the final granule position.
    pub fn finish<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.flush(out)?;
        self.page_granule = self.granule();
        self.emit_page(out, OGG_HEADER_TYPE_EOS)?;
        self.finished = true;
        Ok(())
    }

    fn append<W: Write + ?Sized>(&mut self, out: &mut W, data: &[u8], granule: u64) -> Result<()> {
        let mut offset = 0;
        for (i, lace) in lacing_values(data.len()).into_iter().enumerate() {
            if self.lacing.len() == MAX_SEGMENTS {
                self.emit_page(out, 0)?;
                // The new page opens in the middle of this packet
                self.continued = i > 0;
            }
            let end = offset + lace as usize;
            self.lacing.push(lace);
            self.body.extend_from_slice(&data[offset..end]);
            offset = end;
        }
        self.page_granule = granule;
        Ok(())
    }

    fn emit_page<W: Write + ?Sized>(&mut self, out: &mut W, extra_flags: u8) -> Result<()> {
        let mut flags = extra_flags;
        if self.next_sequence == 0 {
            flags |= OGG_HEADER_TYPE_BOS;
        }
        if self.continued {
            flags |= OGG_HEADER_TYPE_CONTINUATION;
        }

        let page = OggPage::new(
            flags,
            self.page_granule,
            self.serial,
            self.next_sequence,
            std::mem::take(&mut self.lacing),
            std::mem::take(&mut self.body),
        );
        page.write_to(out).map_err(OggOpusError::SinkWrite)?;

        trace!(
            sequence = page.header.page_sequence,
            granule = page.header.granule_position,
            flags = page.header.header_type,
            segments = page.header.segment_table.len(),
            bytes = page.len(),
            "ogg page written"
        );

        self.bytes_written += page.len() as u64;
        self.next_sequence += 1;
        self.page_granule = GRANULE_NONE;
        self.continued = false;
        self.lacing = Vec::with_capacity(MAX_SEGMENTS);
        Ok(())
    }
}
