//! Fan-out writer for multi-target redirections.

use std::io::{self, Write};

/// Duplicates every write to each sink; the first sink error aborts the
/// write. All sinks close when the writer drops, error or not.
pub struct MultiWriter {
    sinks: Vec<Box<dyn Write + Send>>,
}

impl MultiWriter {
    pub fn new(sinks: Vec<Box<dyn Write + Send>>) -> Self {
        Self { sinks }
    }
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for sink in &mut self.sinks {
            sink.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
