//! Tab-completion decision logic.
//!
//! Bell protocol: the first Tab with nothing useful to do rings the bell;
//! the next Tab either stays silent (no matches) or prints the candidate
//! list (several matches without a longer common prefix). Any successful
//! completion re-arms the bell.

use regex::Regex;

use core_registry::Registry;

#[derive(Debug, PartialEq, Eq)]
pub enum Completion {
    /// Replace the whole line with this text.
    Replace(String),
    Bell,
    /// Print the candidate list below the line, then redraw it.
    ShowCandidates(Vec<String>),
    None,
}

#[derive(Debug, Default)]
pub struct Completer {
    bell_rung: bool,
}

impl Completer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-arm the bell for a fresh line.
    pub fn reset(&mut self) {
        self.bell_rung = false;
    }

    pub fn complete(&mut self, registry: &Registry, input: &str) -> Completion {
        if input.is_empty() {
            return Completion::None;
        }
        let re = Regex::new(&format!("^{}", regex::escape(input))).expect("escaped prefix regex");
        let matches = registry.match_all(&re);

        match matches.len() {
            0 => {
                if self.ring() {
                    Completion::Bell
                } else {
                    Completion::None
                }
            }
            1 => {
                self.bell_rung = false;
                Completion::Replace(format!("{} ", matches[0]))
            }
            _ => {
                let prefix = longest_common_prefix(&matches);
                if prefix != input {
                    self.bell_rung = false;
                    Completion::Replace(prefix)
                } else if self.ring() {
                    Completion::Bell
                } else {
                    Completion::ShowCandidates(matches)
                }
            }
        }
    }

    fn ring(&mut self) -> bool {
        if self.bell_rung {
            return false;
        }
        self.bell_rung = true;
        true
    }
}

/// `matches` is sorted, so the answer is the common prefix of the first and
/// last element.
fn longest_common_prefix(matches: &[String]) -> String {
    let first = &matches[0];
    let last = matches.last().expect("non-empty match list");
    let mut end = 0;
    for ((i, a), b) in first.char_indices().zip(last.chars()) {
        if a != b {
            break;
        }
        end = i + a.len_utf8();
    }
    first[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use core_platform::{ExecSpawn, InputStream};
    use core_registry::{Command, CommandFactory, CommandKind};

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

    fn noop(name: &'static str) -> CommandFactory {
        Arc::new(move || Command::new(name, CommandKind::Builtin, |_io, _argv| Ok(())))
    }

    fn registry(names: &[&'static str]) -> Registry {
        let mut reg = Registry::new(Arc::new(NoExec));
        for name in names {
            reg.add_builtin(*name, noop(name));
        }
        reg
    }

    #[test]
    fn single_match_completes_with_trailing_space() {
        let reg = registry(&["echo"]);
        let mut c = Completer::new();
        assert_eq!(
            c.complete(&reg, "ec"),
            Completion::Replace("echo ".to_string())
        );
    }

    #[test]
    fn no_match_rings_bell_once_then_goes_silent() {
        let reg = registry(&["echo"]);
        let mut c = Completer::new();
        assert_eq!(c.complete(&reg, "zz"), Completion::Bell);
        assert_eq!(c.complete(&reg, "zz"), Completion::None);
    }

    #[test]
    fn several_matches_extend_to_common_prefix() {
        let reg = registry(&["history", "hint"]);
        let mut c = Completer::new();
        assert_eq!(
            c.complete(&reg, "h"),
            Completion::Replace("hi".to_string())
        );
    }

    #[test]
    fn exhausted_prefix_rings_then_lists() {
        let reg = registry(&["type", "typeset"]);
        let mut c = Completer::new();
        assert_eq!(c.complete(&reg, "type"), Completion::Bell);
        assert_eq!(
            c.complete(&reg, "type"),
            Completion::ShowCandidates(vec!["type".to_string(), "typeset".to_string()])
        );
    }

    #[test]
    fn successful_completion_rearms_the_bell() {
        let reg = registry(&["echo"]);
        let mut c = Completer::new();
        assert_eq!(c.complete(&reg, "zz"), Completion::Bell);
        assert!(matches!(c.complete(&reg, "ec"), Completion::Replace(_)));
        assert_eq!(c.complete(&reg, "zz"), Completion::Bell);
    }

    #[test]
    fn empty_input_completes_nothing() {
        let reg = registry(&["echo"]);
        let mut c = Completer::new();
        assert_eq!(c.complete(&reg, ""), Completion::None);
    }
}
