//! Process-resident commands.
//!
//! Each builtin is a factory producing a fresh [`Command`] per invocation;
//! bodies receive the wired streams and the expanded argv and stay oblivious
//! to the terminal.

mod cd;
mod clear;
mod echo;
mod exit;
mod history;
mod pwd;
mod type_cmd;

use std::sync::{Arc, Mutex, Weak};

use core_history::HistoryStore;
use core_registry::Registry;

/// Register every builtin. `registry_ref` is the weak self-reference the
/// `type` builtin resolves lookups through (the registry cannot hold a
/// strong reference to itself).
pub fn register_all(
    registry: &mut Registry,
    registry_ref: Weak<Registry>,
    history: Arc<Mutex<HistoryStore>>,
) {
    registry.add_builtin("echo", echo::factory());
    registry.add_builtin("exit", exit::factory());
    registry.add_builtin("type", type_cmd::factory(registry_ref));
    registry.add_builtin("pwd", pwd::factory());
    registry.add_builtin("cd", cd::factory());
    registry.add_builtin("history", history::factory(history));
    registry.add_builtin("clear", clear::factory());
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use core_platform::InputStream;
    use core_registry::CommandIo;

    #[derive(Clone, Default)]
    pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        pub fn string(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Streams for exercising a builtin directly: empty stdin, captured
    /// stdout/stderr.
    pub fn test_io() -> (CommandIo, SharedBuf, SharedBuf) {
        let out = SharedBuf::default();
        let err = SharedBuf::default();
        let io = CommandIo {
            stdin: InputStream::Piped(Box::new(io::empty())),
            stdout: Box::new(out.clone()),
            stderr: Box::new(err.clone()),
        };
        (io, out, err)
    }
}
