//! History persistence for one shell session.
//!
//! The file is read once before the REPL starts and only the entries added
//! during the session are appended at shutdown; the file is never rewritten.
//! Every failure is reported and swallowed: persistent history is a
//! convenience, not a requirement.

use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

use core_history::{HistoryStore, file};
use core_interp::ShellError;
use core_platform::FileSystem;

pub struct HistorySession {
    path: Option<PathBuf>,
    /// Store length already present in the file.
    watermark: usize,
}

impl HistorySession {
    /// Preload `store` from `path` (when configured) and remember how much
    /// of it is already persisted.
    pub fn preload(
        path: Option<PathBuf>,
        fs: &dyn FileSystem,
        store: &mut HistoryStore,
    ) -> Self {
        if let Some(path) = &path {
            match file::load(store, fs, path) {
                Ok(lines) => debug!(target: "history.file", lines, "preloaded"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(target: "history.file", error = %err, "history preload failed");
                    eprintln!("rush: {}", ShellError::HistoryIo(err));
                }
            }
        }
        Self {
            watermark: store.len(),
            path,
        }
    }

    /// Append everything newer than the watermark.
    pub fn persist(&self, fs: &dyn FileSystem, store: &HistoryStore) {
        let Some(path) = &self.path else {
            return;
        };
        let fresh: Vec<String> = store
            .iter_oldest_first()
            .skip(self.watermark)
            .map(str::to_string)
            .collect();
        if let Err(err) = file::append(fs, path, &fresh) {
            warn!(target: "history.file", error = %err, "history persist failed");
            eprintln!("rush: {}", ShellError::HistoryIo(err));
        }
    }
}
