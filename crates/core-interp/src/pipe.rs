//! Pipeline pipes: unidirectional byte streams over bounded channels.
//!
//! Close propagation falls out of channel disconnection: dropping the writer
//! ends the reader with EOF, dropping the reader makes further writes fail
//! with `BrokenPipe`. The ignore-closed adapters then decide which of those
//! failures are visible: a producer writing into a pipe whose consumer quit
//! early (`head`-style) must not fail, and a drained pipe reads as silent
//! EOF. That behavior is load-bearing; see the interpreter's pipeline
//! wiring.

use std::io::{self, Read, Write};

use crossbeam_channel::{Receiver, Sender, bounded};

/// Chunks in flight before a writer blocks; enough to decouple neighbors
/// without unbounded buffering.
const PIPE_CHUNK_CAPACITY: usize = 64;

/// Create a connected `(reader, writer)` pair.
pub fn pipe() -> (PipeReader, PipeWriter) {
    let (tx, rx) = bounded(PIPE_CHUNK_CAPACITY);
    (
        PipeReader {
            rx,
            pending: Vec::new(),
            offset: 0,
        },
        PipeWriter { tx },
    )
}

pub struct PipeWriter {
    tx: Sender<Vec<u8>>,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .send(buf.to_vec())
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.offset < self.pending.len() {
                let n = buf.len().min(self.pending.len() - self.offset);
                buf[..n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
                self.offset += n;
                return Ok(n);
            }
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                // Writer gone and the channel is drained: EOF.
                Err(_) => return Ok(0),
            }
        }
    }
}

/// Write adapter that swallows closed-pipe failures: the downstream command
/// exiting early must not kill the producer.
pub struct IgnoreClosedWrite<W>(pub W);

impl<W: Write> Write for IgnoreClosedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.0.write(buf) {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(buf.len()),
            other => other,
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.0.flush() {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    }
}

/// Read adapter mapping closed-pipe failures to silent EOF.
pub struct IgnoreClosedRead<R>(pub R);

impl<R: Read> Read for IgnoreClosedRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(0),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn bytes_flow_in_order() {
        let (mut reader, mut writer) = pipe();
        let producer = thread::spawn(move || {
            writer.write_all(b"hello ").unwrap();
            writer.write_all(b"world").unwrap();
        });
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        producer.join().unwrap();
        assert_eq!(out, "hello world");
    }

    #[test]
    fn dropping_writer_ends_reader_with_eof() {
        let (mut reader, writer) = pipe();
        drop(writer);
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn write_after_reader_drop_is_broken_pipe() {
        let (reader, mut writer) = pipe();
        drop(reader);
        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn ignore_closed_write_reports_success() {
        let (reader, writer) = pipe();
        drop(reader);
        let mut writer = IgnoreClosedWrite(writer);
        assert_eq!(writer.write(b"dropped").unwrap(), 7);
        writer.flush().unwrap();
    }

    #[test]
    fn small_reads_drain_a_large_chunk() {
        let (mut reader, mut writer) = pipe();
        writer.write_all(b"abcdef").unwrap();
        drop(writer);
        let mut buf = [0u8; 2];
        let mut out = Vec::new();
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn bounded_capacity_applies_backpressure_not_loss() {
        let (mut reader, mut writer) = pipe();
        let producer = thread::spawn(move || {
            for i in 0..1000u32 {
                writer.write_all(&i.to_le_bytes()).unwrap();
            }
        });
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();
        assert_eq!(out.len(), 4000, "every chunk arrives exactly once");
    }
}
