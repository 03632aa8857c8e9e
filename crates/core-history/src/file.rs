//! History file persistence.
//!
//! Format: one entry per line, UTF-8, `\n`-terminated, oldest first. The
//! file is read once at startup and appended to at shutdown; it is never
//! rewritten in place.

use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tracing::debug;

use core_platform::{FileSystem, OpenFlags};

use crate::store::HistoryStore;

/// Load `path` into the store, oldest line first. Returns the number of
/// lines read.
pub fn load(store: &mut HistoryStore, fs: &dyn FileSystem, path: &Path) -> io::Result<usize> {
    let handle = fs.open(path)?;
    let mut lines = 0usize;
    for line in BufReader::new(handle).lines() {
        store.add(line?);
        lines += 1;
    }
    debug!(target: "history.file", path = %path.display(), lines, "loaded");
    Ok(lines)
}

/// Append `entries` to `path`, creating the file when absent.
pub fn append(fs: &dyn FileSystem, path: &Path, entries: &[String]) -> io::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let mut handle = fs.open_file(
        path,
        OpenFlags::WRONLY | OpenFlags::APPEND | OpenFlags::CREATE,
    )?;
    for entry in entries {
        handle.write_all(entry.as_bytes())?;
        handle.write_all(b"\n")?;
    }
    handle.flush()?;
    debug!(target: "history.file", path = %path.display(), entries = entries.len(), "appended");
    Ok(())
}
