use std::sync::Arc;

use core_registry::{Command, CommandError, CommandFactory, CommandKind};

/// Raise the exit sentinel; the REPL terminates cleanly when it sees it.
pub fn factory() -> CommandFactory {
    Arc::new(|| Command::new("exit", CommandKind::Builtin, |_io, _argv| Err(CommandError::Exit)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::test_io;

    #[test]
    fn always_returns_the_exit_sentinel() {
        let (io, _out, _err) = test_io();
        let result = (factory())().run(io, &["exit".to_string()]);
        assert!(matches!(result, Err(CommandError::Exit)));
    }
}
