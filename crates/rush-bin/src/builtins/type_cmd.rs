use std::io::Write;
use std::sync::{Arc, Weak};

use anyhow::anyhow;

use core_registry::{Command, CommandError, CommandFactory, CommandKind, Registry};

/// Report how a name would resolve: shell builtin, external path, or not
/// found.
pub fn factory(registry: Weak<Registry>) -> CommandFactory {
    Arc::new(move || {
        let registry = registry.clone();
        Command::new("type", CommandKind::Builtin, move |mut io, argv| {
            if argv.len() != 2 {
                return Err(CommandError::Other(anyhow!(
                    "type: expected exactly one argument"
                )));
            }
            let registry = registry
                .upgrade()
                .ok_or_else(|| anyhow!("type: command registry is gone"))?;

            let name = &argv[1];
            if registry.is_builtin(name) {
                writeln!(io.stdout, "{name} is a shell builtin")?;
            } else if let Some(path) = registry.external_path(name) {
                writeln!(io.stdout, "{name} is {}", path.display())?;
            } else {
                writeln!(io.stdout, "{name}: not found")?;
            }
            Ok(())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::test_io;

    use core_platform::{ExecSpawn, InputStream};

    struct NoExec;
    impl ExecSpawn for NoExec {
        fn exec(
            &self,
            _name: &str,
            _path: &std::path::Path,
            _argv: &[String],
            _stdin: InputStream,
            _stdout: Box<dyn std::io::Write + Send>,
            _stderr: Box<dyn std::io::Write + Send>,
        ) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn registry_with_type() -> Arc<Registry> {
        Arc::new_cyclic(|weak| {
            let mut reg = Registry::new(Arc::new(NoExec));
            reg.add_builtin("type", factory(weak.clone()));
            reg.add_builtin("echo", crate::builtins::echo::factory());
            reg
        })
    }

    fn run_type(registry: &Arc<Registry>, arg: &str) -> String {
        let (io, out, _err) = test_io();
        let command = registry.lookup_builtin("type").expect("type registered");
        command
            .run(io, &["type".to_string(), arg.to_string()])
            .unwrap();
        out.string()
    }

    #[test]
    fn reports_builtins() {
        let registry = registry_with_type();
        assert_eq!(run_type(&registry, "echo"), "echo is a shell builtin\n");
        assert_eq!(run_type(&registry, "type"), "type is a shell builtin\n");
    }

    #[test]
    fn reports_unknown_names() {
        let registry = registry_with_type();
        assert_eq!(run_type(&registry, "ghost"), "ghost: not found\n");
    }

    #[test]
    fn rejects_wrong_arity() {
        let registry = registry_with_type();
        let (io, _out, _err) = test_io();
        let command = registry.lookup_builtin("type").unwrap();
        assert!(command.run(io, &["type".to_string()]).is_err());
    }
}
