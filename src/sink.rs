// Output destination
//
// A sink is either opened by the writer from a path (and released by it on
// close) or handed in by the caller, who keeps responsibility for it.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug)]
pub enum Sink<W: Write> {
    /// Opened by the writer; `None` once released
    Owned(Option<W>),
    /// Supplied by the caller; only flushed, never released here
    External(W),
}

impl Sink<BufWriter<File>> {
    /// Create (or truncate) the file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Sink::Owned(Some(BufWriter::new(file))))
    }
}

impl<W: Write> Sink<W> {
    pub fn external(writer: W) -> Self {
        Sink::External(writer)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Sink::Owned(_))
    }

    pub fn is_released(&self) -> bool {
        matches!(self, Sink::Owned(None))
    }

    /// Flush, then drop the resource if the writer owns it. Idempotent.
    pub fn release(&mut self) -> io::Result<()> {
        match self {
            Sink::Owned(inner) => match inner.take() {
                Some(mut writer) => writer.flush(),
                None => Ok(()),
            },
            Sink::External(writer) => writer.flush(),
        }
    }

    /// Drop an owned resource after a failure, ignoring flush errors.
    ///
    /// A buffered writer still flushes what it holds from its own `Drop`, so
    /// bytes accepted before the failure may reach the file. External
    /// writers are left untouched.
    pub fn abandon(&mut self) {
        if let Sink::Owned(inner) = self {
            inner.take();
        }
    }

    pub fn get_ref(&self) -> Option<&W> {
        match self {
            Sink::Owned(inner) => inner.as_ref(),
            Sink::External(writer) => Some(writer),
        }
    }

    /// Hand back a caller-supplied writer
    pub fn into_external(self) -> Option<W> {
        match self {
            Sink::Owned(_) => None,
            Sink::External(writer) => Some(writer),
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Owned(Some(writer)) | Sink::External(writer) => writer.write(buf),
            Sink::Owned(None) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink already released")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Owned(Some(writer)) | Sink::External(writer) => writer.flush(),
            Sink::Owned(None) => Ok(()),
        }
    }
}
