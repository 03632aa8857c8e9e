//! Filesystem capability: open for reading, directory listing, and
//! flag-controlled open for redirection targets and history files.
//!
//! Errors are plain `io::Error` so callers can distinguish `NotFound`
//! (absent file) from the rest of the I/O failure space.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bitflags::bitflags;

bitflags! {
    /// POSIX-style open flags accepted by [`FileSystem::open_file`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const WRONLY = 1 << 0;
        const APPEND = 1 << 1;
        const TRUNC  = 1 << 2;
        const CREATE = 1 << 3;
    }
}

impl OpenFlags {
    /// Read-only is the absence of every write-side flag.
    pub const RDONLY: OpenFlags = OpenFlags::empty();
}

/// Read-only file handle.
pub type ReadHandle = Box<dyn Read + Send>;

/// Read-write file handle (redirection targets, history file).
pub type FileHandle = Box<dyn ReadWrite + Send>;

/// Object-safe combination of `Read` + `Write` for open files.
pub trait ReadWrite: Read + Write {}

impl<T: Read + Write> ReadWrite for T {}

/// One entry of a directory listing, pre-digested to what the command
/// registry's PATH scan needs.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Base file name (no directory components).
    pub name: String,
    /// Full path of the entry.
    pub path: PathBuf,
    pub is_dir: bool,
    /// Any execute bit set on Unix; always `true` on Windows.
    pub executable: bool,
}

pub trait FileSystem: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<ReadHandle>;

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Open `path` with the given flags. `CREATE` also creates missing
    /// parent directories (mode `0o700`); created files get mode `0o644`.
    fn open_file(&self, path: &Path, flags: OpenFlags) -> io::Result<FileHandle>;

    /// Resolve a possibly-relative path against the current working
    /// directory.
    fn full_path(&self, path: &Path) -> io::Result<PathBuf>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn open(&self, path: &Path) -> io::Result<ReadHandle> {
        let file = fs::File::open(path)?;
        Ok(Box::new(file))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let metadata = match entry.metadata() {
                Ok(m) => m,
                // An entry can vanish between listing and stat; skip it.
                Err(_) => continue,
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(DirEntry {
                name,
                path: entry.path(),
                is_dir: metadata.is_dir(),
                executable: has_exec_perms(&metadata),
            });
        }
        Ok(entries)
    }

    fn open_file(&self, path: &Path, flags: OpenFlags) -> io::Result<FileHandle> {
        if flags.contains(OpenFlags::CREATE)
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            create_parent_dirs(parent)?;
        }

        let mut options = OpenOptions::new();
        if flags.contains(OpenFlags::WRONLY) {
            options.write(true);
        } else {
            options.read(true);
        }
        options
            .append(flags.contains(OpenFlags::APPEND))
            .truncate(flags.contains(OpenFlags::TRUNC))
            .create(flags.contains(OpenFlags::CREATE));
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let file = options.open(path)?;
        Ok(Box::new(file))
    }

    fn full_path(&self, path: &Path) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }
}

fn create_parent_dirs(parent: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(parent)
}

#[cfg(unix)]
fn has_exec_perms(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_perms(_metadata: &fs::Metadata) -> bool {
    true
}
