use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use core_history::HistoryStore;
use core_registry::{Command, CommandError, CommandFactory, CommandKind};

/// List history oldest first with 1-based indices; an optional numeric
/// argument limits the listing to the last N entries.
pub fn factory(history: Arc<Mutex<HistoryStore>>) -> CommandFactory {
    Arc::new(move || {
        let history = history.clone();
        Command::new("history", CommandKind::Builtin, move |mut io, argv| {
            let limit = match argv.get(1) {
                None => None,
                Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                    CommandError::Other(anyhow!("history: {raw}: numeric argument required"))
                })?),
            };

            let store = history
                .lock()
                .map_err(|_| anyhow!("history: store poisoned"))?;
            let total = store.len();
            let skip = limit.map_or(0, |n| total.saturating_sub(n));
            for (idx, entry) in store.iter_oldest_first().enumerate().skip(skip) {
                writeln!(io.stdout, "{:>3}  {}", idx + 1, entry)?;
            }
            Ok(())
        })
    })
}
