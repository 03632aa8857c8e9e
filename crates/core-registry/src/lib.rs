//! Command registry: builtins and PATH-discovered externals behind one
//! lookup surface, with prefix matching for completion and hints.
//!
//! The external table is populated once at shell start by walking every
//! `PATH` directory; the REPL never re-scans. A directory that cannot be
//! read is skipped so one bad `PATH` entry does not disable the rest.

pub mod command;

pub use command::{Command, CommandError, CommandFactory, CommandIo, CommandKind};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info};

use core_platform::{ExecSpawn, FileSystem};

/// Lookup seam consumed by the interpreter.
pub trait CommandLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Command>;
}

pub struct Registry {
    builtins: HashMap<String, CommandFactory>,
    externals: HashMap<String, PathBuf>,
    exec: Arc<dyn ExecSpawn>,
}

impl Registry {
    pub fn new(exec: Arc<dyn ExecSpawn>) -> Self {
        Self {
            builtins: HashMap::new(),
            externals: HashMap::new(),
            exec,
        }
    }

    pub fn add_builtin(&mut self, name: impl Into<String>, factory: CommandFactory) {
        self.builtins.insert(name.into(), factory);
    }

    /// Walk every directory in `path_value` (platform list separator) and
    /// register executables under their extension-stripped base name. First
    /// occurrence wins.
    pub fn scan_path(&mut self, path_value: &str, fs: &dyn FileSystem) {
        for dir in std::env::split_paths(path_value) {
            if dir.as_os_str().is_empty() {
                continue;
            }
            let dir = fs.full_path(&dir).unwrap_or(dir);
            let entries = match fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(target: "registry.scan", dir = %dir.display(), error = %err, "skipping unreadable PATH entry");
                    continue;
                }
            };
            for entry in entries {
                if entry.is_dir || !entry.executable {
                    continue;
                }
                let stem = match Path::new(&entry.name).file_stem() {
                    Some(stem) => stem.to_string_lossy().into_owned(),
                    None => continue,
                };
                self.externals.entry(stem).or_insert(entry.path);
            }
        }
        info!(target: "registry.scan", externals = self.externals.len(), "PATH scan complete");
    }

    /// Case-insensitive builtin lookup.
    pub fn lookup_builtin(&self, name: &str) -> Option<Command> {
        self.builtins
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, factory)| factory())
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.keys().any(|k| k.eq_ignore_ascii_case(name))
    }

    /// Exact-name external lookup; the returned command spawns through the
    /// exec capability when run.
    pub fn lookup_external(&self, name: &str) -> Option<(PathBuf, Command)> {
        let path = self.externals.get(name)?.clone();
        let command = self.external_command(name, path.clone());
        Some((path, command))
    }

    pub fn external_path(&self, name: &str) -> Option<&Path> {
        self.externals.get(name).map(PathBuf::as_path)
    }

    /// Any single name starting with `prefix`, for inline hints. Smallest
    /// match first so the answer is stable.
    pub fn match_first(&self, prefix: &str) -> Option<String> {
        self.names()
            .filter(|name| name.starts_with(prefix))
            .min()
            .map(str::to_string)
    }

    /// Every name matching `re`, sorted and deduplicated.
    pub fn match_all(&self, re: &Regex) -> Vec<String> {
        let mut matches: Vec<String> = self
            .names()
            .filter(|name| re.is_match(name))
            .map(str::to_string)
            .collect();
        matches.sort();
        matches.dedup();
        matches
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.builtins
            .keys()
            .map(String::as_str)
            .chain(self.externals.keys().map(String::as_str))
    }

    fn external_command(&self, name: &str, path: PathBuf) -> Command {
        let exec = self.exec.clone();
        let exec_name = name.to_string();
        let exec_path = path.clone();
        Command::new(name, CommandKind::External(path), move |io, argv| {
            exec.exec(
                &exec_name,
                &exec_path,
                argv,
                io.stdin,
                io.stdout,
                io.stderr,
            )
            .map_err(CommandError::Spawn)
        })
    }
}

impl CommandLookup for Registry {
    /// Builtin first, then external.
    fn lookup(&self, name: &str) -> Option<Command> {
        if let Some(command) = self.lookup_builtin(name) {
            return Some(command);
        }
        self.lookup_external(name).map(|(_, command)| command)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("builtins", &self.builtins.len())
            .field("externals", &self.externals.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    use core_platform::{InputStream, OsFileSystem};

    /// Spawn double that records invocations instead of spawning.
    #[derive(Default)]
    struct RecordingExec {
        calls: Mutex<Vec<(String, PathBuf, Vec<String>)>>,
    }

    impl ExecSpawn for RecordingExec {
        fn exec(
            &self,
            name: &str,
            path: &Path,
            argv: &[String],
            _stdin: InputStream,
            _stdout: Box<dyn io::Write + Send>,
            _stderr: Box<dyn io::Write + Send>,
        ) -> io::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), path.to_path_buf(), argv.to_vec()));
            Ok(())
        }
    }

    fn noop_builtin(name: &'static str) -> CommandFactory {
        Arc::new(move || Command::new(name, CommandKind::Builtin, |_io, _argv| Ok(())))
    }

    fn registry() -> (Registry, Arc<RecordingExec>) {
        let exec = Arc::new(RecordingExec::default());
        (Registry::new(exec.clone()), exec)
    }

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let (mut reg, _) = registry();
        reg.add_builtin("echo", noop_builtin("echo"));
        assert!(reg.lookup_builtin("ECHO").is_some());
        assert!(reg.lookup_builtin("Echo").is_some());
        assert!(reg.lookup_builtin("ech").is_none());
    }

    #[test]
    fn builtin_shadows_external() {
        let (mut reg, _) = registry();
        reg.add_builtin("echo", noop_builtin("echo"));
        reg.externals
            .insert("echo".to_string(), PathBuf::from("/bin/echo"));
        let command = reg.lookup("echo").expect("echo resolves");
        assert_eq!(command.kind, CommandKind::Builtin);
    }

    #[test]
    fn external_command_spawns_through_capability() {
        let (mut reg, exec) = registry();
        reg.externals
            .insert("tool".to_string(), PathBuf::from("/opt/tool"));
        let (path, command) = reg.lookup_external("tool").expect("tool resolves");
        assert_eq!(path, PathBuf::from("/opt/tool"));

        let io = CommandIo {
            stdin: InputStream::Piped(Box::new(io::empty())),
            stdout: Box::new(io::sink()),
            stderr: Box::new(io::sink()),
        };
        let argv = vec!["tool".to_string(), "-v".to_string()];
        command.run(io, &argv).unwrap();

        let calls = exec.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, PathBuf::from("/opt/tool"));
        assert_eq!(calls[0].2, argv);
    }

    #[test]
    fn match_first_prefers_smallest_match() {
        let (mut reg, _) = registry();
        reg.add_builtin("echo", noop_builtin("echo"));
        reg.externals
            .insert("echoer".to_string(), PathBuf::from("/bin/echoer"));
        assert_eq!(reg.match_first("ec"), Some("echo".to_string()));
        assert_eq!(reg.match_first("zz"), None);
    }

    #[test]
    fn match_all_sorts_and_dedups() {
        let (mut reg, _) = registry();
        reg.add_builtin("type", noop_builtin("type"));
        reg.externals
            .insert("type".to_string(), PathBuf::from("/bin/type"));
        reg.externals
            .insert("typeset".to_string(), PathBuf::from("/bin/typeset"));
        let re = Regex::new(&format!("^{}", regex::escape("typ"))).unwrap();
        assert_eq!(reg.match_all(&re), vec!["type", "typeset"]);
    }

    #[cfg(unix)]
    #[test]
    fn scan_path_registers_executables_first_wins() {
        use std::os::unix::fs::PermissionsExt;

        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let make_exe = |dir: &Path, name: &str| {
            let path = dir.join(name);
            std::fs::write(&path, b"#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };
        let tool_a = make_exe(dir_a.path(), "tool");
        make_exe(dir_b.path(), "tool");
        make_exe(dir_b.path(), "other.sh");
        std::fs::write(dir_b.path().join("plain.txt"), b"data").unwrap();

        let (mut reg, _) = registry();
        let path_value = std::env::join_paths([dir_a.path(), dir_b.path()])
            .unwrap()
            .into_string()
            .unwrap();
        reg.scan_path(&path_value, &OsFileSystem);

        assert_eq!(reg.external_path("tool"), Some(tool_a.as_path()));
        assert!(
            reg.external_path("other").is_some(),
            "extension is stripped from the registered name"
        );
        assert!(
            reg.external_path("plain").is_none(),
            "non-executables are skipped"
        );
    }

    #[test]
    fn scan_path_swallows_bad_entries() {
        let (mut reg, _) = registry();
        reg.scan_path("/nonexistent-dir-for-sure::", &OsFileSystem);
        assert!(reg.externals.is_empty());
    }
}
