//! Capability traits for the shell's operating-system seams.
//!
//! The interpreter, command registry, and history persistence never touch
//! `std::env`, `std::fs`, or `std::process` directly; they go through the
//! narrow traits defined here. Production wires the `Os*` implementations,
//! tests wire in-memory doubles. Each trait covers exactly one collaborator:
//! environment lookup, filesystem access, and external process spawning.

pub mod env;
pub mod exec;
pub mod fs;

pub use env::{EnvLookup, OsEnv};
pub use exec::{ExecSpawn, InputStream, OsExec};
pub use fs::{DirEntry, FileHandle, FileSystem, OpenFlags, OsFileSystem, ReadHandle};
