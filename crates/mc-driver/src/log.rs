use std::fmt::Display;
use std::io::{self, Write};

use mc_core::errors::ErrorInfo;
use mc_core::McError;

/// Destination for the human readable progress log.
///
/// Handed to the driver at construction; nothing in this crate writes to a
/// global stream. Structured `tracing` events are emitted alongside.
#[derive(Debug)]
pub struct LogSink<W> {
    out: W,
}

impl<W: Write> LogSink<W> {
    /// Wraps any writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes one line.
    pub fn line(&mut self, message: impl Display) -> Result<(), McError> {
        writeln!(self.out, "{message}").map_err(sink_error)
    }

    /// Writes an empty line.
    pub fn blank(&mut self) -> Result<(), McError> {
        writeln!(self.out).map_err(sink_error)
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> Result<(), McError> {
        self.out.flush().map_err(sink_error)
    }

    /// Raw writer, for collaborators that print their own blocks.
    pub fn writer(&mut self) -> &mut W {
        &mut self.out
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl LogSink<Vec<u8>> {
    /// In-memory sink.
    pub fn buffer() -> Self {
        Self::new(Vec::new())
    }

    /// Everything logged so far.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }
}

pub(crate) fn sink_error(err: io::Error) -> McError {
    McError::Io(ErrorInfo::new("log-write", err.to_string()))
}
