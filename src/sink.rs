//! Destinations for rendered log messages.
//!
//! A sink is any writable byte stream the logger can own exclusively. The
//! logger writes each message with a single `write_all`, flushes right after,
//! and calls [`LogSink::close`] when it shuts down.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ChildStdin;
use std::sync::Arc;

use parking_lot::Mutex;

/// A writable byte stream owned by a logger.
///
/// `close` is called once, under the logger lock, by `shutdown`. After it
/// returns the logger drops the handle, which releases the underlying
/// resource for types like [`File`]. The default implementation only flushes.
pub trait LogSink: Write + Send {
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl fmt::Debug for dyn LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}

// Dropping the handle closes the descriptor. No fsync: it fails with EINVAL
// on character devices and FIFOs.
impl LogSink for File {}
impl LogSink for io::Stdout {}
impl LogSink for io::Stderr {}
impl LogSink for io::Sink {}
impl LogSink for Vec<u8> {}
impl LogSink for ChildStdin {}
impl<W: Write + Send> LogSink for BufWriter<W> {}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

#[derive(Debug, Default)]
struct MemoryBuffer {
    data: Vec<u8>,
    writes: usize,
    closed: bool,
}

/// In-memory sink whose clones share one buffer.
///
/// Hand one clone to the logger and keep another to inspect what was
/// written. Once the logger closes it, every clone refuses further writes
/// with a "stream closed" error, the same way a closed file handle would.
///
/// # Examples
///
/// ```
/// # use spinlog::{LoggerState, MemorySink, Severity};
/// let sink = MemorySink::new();
/// let logger = LoggerState::new();
/// let _ = logger.init(Some(Box::new(sink.clone())), Severity::Warn);
///
/// logger.info(format_args!("ignored"));
/// logger.warn(format_args!("value={}", 42));
/// assert_eq!(sink.contents_lossy(), "value=42");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<MemoryBuffer>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().data.clone()
    }

    pub fn contents_lossy(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().data).into_owned()
    }

    /// Number of successful `write` calls, across all clones.
    pub fn write_count(&self) -> usize {
        self.buffer.lock().writes
    }

    pub fn is_closed(&self) -> bool {
        self.buffer.lock().closed
    }
}

fn stream_closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "stream closed")
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock();
        if buffer.closed {
            return Err(stream_closed());
        }
        buffer.data.extend_from_slice(buf);
        buffer.writes += 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buffer.lock().closed {
            return Err(stream_closed());
        }
        Ok(())
    }
}

impl LogSink for MemorySink {
    fn close(&mut self) -> io::Result<()> {
        self.buffer.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_buffer() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_all(b"hello").unwrap();
        assert_eq!(sink.contents(), b"hello");
        assert_eq!(sink.write_count(), 1);
    }

    #[test]
    fn test_closed_sink_rejects_writes() {
        let sink = MemorySink::new();
        let mut owned = sink.clone();
        owned.close().unwrap();

        let mut other = sink.clone();
        let err = other.write(b"late").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(err.to_string(), "stream closed");
        assert!(sink.is_closed());
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_boxed_sink_debug() {
        let slot: Option<Box<dyn LogSink>> = Some(Box::new(MemorySink::new()));
        assert_eq!(format!("{:?}", slot), "Some(LogSink)");
    }

    #[cfg(unix)]
    #[test]
    fn test_character_device_closes_cleanly() {
        let mut file: Box<dyn LogSink> = Box::new(File::create("/dev/null").unwrap());
        file.write_all(b"x").unwrap();
        assert!(file.close().is_ok());
    }

    #[test]
    fn test_boxed_close_delegates() {
        let sink = MemorySink::new();
        let mut boxed: Box<dyn LogSink> = Box::new(sink.clone());
        boxed.close().unwrap();
        assert!(sink.is_closed());
    }
}
