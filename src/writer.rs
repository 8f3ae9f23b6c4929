// Streaming Ogg Opus writer
//
// write(pcm) -> frame buffer -> encoder (one packet per whole frame) -> pages
// close()    -> end-of-stream page -> encoder and owned sink released
//
// Headers are emitted lazily on the first write (or on close when nothing was
// ever written). Any failure inside write leaves the writer broken: later
// writes report the same error and the first close releases resources.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::config::{StreamConfig, WriterOptions};
use crate::encoder::{frame_to_samples, FrameEncoder};
use crate::error::{IntoInnerError, OggOpusError, Result};
use crate::ogg::assembler::{EncodedPacket, PageAssembler};
use crate::opus::{IdHeader, OpusTags};
use crate::pcm::FrameBuffer;
use crate::sink::Sink;

#[derive(Debug)]
enum WriterState {
    Open,
    /// Open but unusable; holds the failure that broke it
    Broken(OggOpusError),
    Closed,
}

pub struct OggOpusWriter<W: Write, E: FrameEncoder> {
    sink: Sink<W>,
    encoder: Option<E>,
    stream: StreamConfig,
    tags: OpusTags,
    frames: FrameBuffer,
    assembler: PageAssembler,
    state: WriterState,
    headers_written: bool,
}

impl<E: FrameEncoder> OggOpusWriter<BufWriter<File>, E> {
    /// Write to a new file at `path`, owned and closed by the writer
    pub fn create<P: AsRef<Path>>(path: P, encoder: E) -> Result<Self> {
        Self::create_with_options(path, encoder, WriterOptions::default())
    }

    pub fn create_with_options<P: AsRef<Path>>(
        path: P,
        mut encoder: E,
        options: WriterOptions,
    ) -> Result<Self> {
        // Resolve everything that can fail before touching the filesystem
        let stream = resolve_stream(&mut encoder, &options)?;
        let sink = Sink::create(path)?;
        Ok(Self::from_parts(sink, encoder, stream, options))
    }
}

impl<W: Write, E: FrameEncoder> OggOpusWriter<W, E> {
    /// Write to a caller-supplied destination; the caller keeps ownership
    pub fn new(writer: W, encoder: E) -> Result<Self> {
        Self::with_options(writer, encoder, WriterOptions::default())
    }

    pub fn with_options(writer: W, mut encoder: E, options: WriterOptions) -> Result<Self> {
        let stream = resolve_stream(&mut encoder, &options)?;
        Ok(Self::from_parts(Sink::external(writer), encoder, stream, options))
    }

    fn from_parts(sink: Sink<W>, encoder: E, stream: StreamConfig, options: WriterOptions) -> Self {
        let vendor = options.vendor.unwrap_or_else(|| encoder.vendor());
        let tags = OpusTags::new(vendor).with_comments(options.comments);
        let config = stream.encoder();
        let frames = FrameBuffer::new(config.frame_bytes(), config.sample_align());
        let assembler = PageAssembler::new(
            stream.serial(),
            stream.sample_rate(),
            u64::from(stream.pre_skip()),
        );

        debug!(
            serial = stream.serial(),
            sample_rate = stream.sample_rate(),
            channels = stream.channels(),
            frame_samples = stream.frame_samples(),
            pre_skip = stream.pre_skip(),
            owned_sink = sink.is_owned(),
            "ogg opus writer opened"
        );

        OggOpusWriter {
            sink,
            encoder: Some(encoder),
            stream,
            tags,
            frames,
            assembler,
            state: WriterState::Open,
            headers_written: false,
        }
    }

    /// Buffer interleaved s16le PCM and emit a packet for every whole frame.
    ///
    /// Returns once every resulting page has been written to the sink.
    pub fn write(&mut self, pcm: &[u8]) -> Result<()> {
        match &self.state {
            WriterState::Open => {}
            WriterState::Broken(err) => return Err(err.replay()),
            WriterState::Closed => return Err(OggOpusError::Closed),
        }

        let result = self.write_frames(pcm);
        if let Err(err) = &result {
            warn!(error = %err, "ogg opus writer failed, stream is unusable");
            self.state = WriterState::Broken(err.replay());
        }
        result
    }

    /// Finish the stream. Only the first call does anything.
    ///
    /// A trailing partial frame is dropped, not padded. The encoder is always
    /// released; the sink only when the writer opened it.
    pub fn close(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, WriterState::Closed) {
            WriterState::Closed => Ok(()),
            WriterState::Broken(err) => {
                self.encoder.take();
                self.sink.abandon();
                Err(err)
            }
            WriterState::Open => {
                let result = self.finish_stream();
                self.encoder.take();
                match result {
                    Ok(()) => self.sink.release().map_err(OggOpusError::SinkWrite),
                    Err(err) => {
                        warn!(error = %err, "failed to finish ogg opus stream");
                        self.sink.abandon();
                        Err(err)
                    }
                }
            }
        }
    }

    /// Close the writer and hand back a caller-supplied destination.
    ///
    /// The destination comes back even when closing fails; it is carried
    /// by the [`IntoInnerError`].
    pub fn into_inner(mut self) -> std::result::Result<Option<W>, IntoInnerError<W>> {
        let result = self.close();
        let sink = std::mem::replace(&mut self.sink, Sink::Owned(None)).into_external();
        match result {
            Ok(()) => Ok(sink),
            Err(error) => Err(IntoInnerError::new(error, sink)),
        }
    }

    fn write_frames(&mut self, pcm: &[u8]) -> Result<()> {
        let frames = self.frames.append(pcm)?;
        self.ensure_headers()?;

        let encoder = self.encoder.as_mut().ok_or(OggOpusError::Closed)?;
        let frame_samples = self.stream.frame_samples() as u64;
        for frame in frames.iter() {
            let data = encoder.encode_frame(&frame_to_samples(frame))?;
            self.assembler
                .submit(&mut self.sink, &EncodedPacket::audio(data, frame_samples))?;
        }

        self.assembler.flush(&mut self.sink)?;
        self.sink.flush().map_err(OggOpusError::SinkWrite)
    }

    fn ensure_headers(&mut self) -> Result<()> {
        if self.headers_written {
            return Ok(());
        }
        let head = IdHeader::from_stream(&self.stream).to_bytes();
        self.assembler.submit(&mut self.sink, &EncodedPacket::header(head))?;
        self.assembler
            .submit(&mut self.sink, &EncodedPacket::header(self.tags.to_bytes()))?;
        self.headers_written = true;

        debug!(
            pre_skip = self.stream.pre_skip(),
            vendor = %self.tags.vendor_string,
            comments = self.tags.comments.len(),
            "opus headers written"
        );
        Ok(())
    }

    fn finish_stream(&mut self) -> Result<()> {
        self.ensure_headers()?;

        let dropped = self.frames.discard_remainder();
        if dropped > 0 {
            debug!(dropped_bytes = dropped, "dropping trailing partial frame");
        }

        self.assembler.finish(&mut self.sink)?;
        self.sink.flush().map_err(OggOpusError::SinkWrite)?;

        debug!(
            samples = self.assembler.samples_submitted(),
            granule = self.assembler.granule(),
            pages = self.assembler.next_sequence(),
            bytes = self.assembler.bytes_written(),
            "ogg opus stream finished"
        );
        Ok(())
    }

    pub fn stream_config(&self) -> &StreamConfig {
        &self.stream
    }

    pub fn pre_skip(&self) -> u16 {
        self.stream.pre_skip()
    }

    pub fn serial(&self) -> u32 {
        self.stream.serial()
    }

    pub fn headers_written(&self) -> bool {
        self.headers_written
    }

    /// Samples per channel handed to the encoder, at the input rate
    pub fn samples_encoded(&self) -> u64 {
        self.assembler.samples_submitted()
    }

    /// Granule position after the last encoded packet
    pub fn granule_position(&self) -> u64 {
        self.assembler.granule()
    }

    pub fn next_page_sequence(&self) -> u32 {
        self.assembler.next_sequence()
    }

    /// PCM bytes waiting for the rest of their frame
    pub fn buffered_bytes(&self) -> usize {
        self.frames.remainder()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, WriterState::Closed)
    }

    pub fn is_broken(&self) -> bool {
        matches!(self.state, WriterState::Broken(_))
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.sink.get_ref()
    }
}

impl<W: Write, E: FrameEncoder> Drop for OggOpusWriter<W, E> {
    fn drop(&mut self) {
        if matches!(self.state, WriterState::Open) {
            if let Err(err) = self.close() {
                warn!(error = %err, "failed to close ogg opus writer on drop");
            }
        }
    }
}

fn resolve_stream<E: FrameEncoder>(encoder: &mut E, options: &WriterOptions) -> Result<StreamConfig> {
    let config = encoder.config().clone();
    config.validate()?;

    let pre_skip = match options.custom_pre_skip {
        Some(pre_skip) => pre_skip,
        None => encoder.lookahead()?,
    };
    let serial = options.serial.unwrap_or_else(rand::random);

    Ok(StreamConfig::new(config, pre_skip, serial, options.output_gain))
}
