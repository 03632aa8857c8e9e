//! rush entrypoint: bootstrap logging, config, the command registry, and
//! history, then hand the terminal to the REPL driver.

mod builtins;
mod completion;
mod driver;
mod session;

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use core_history::HistoryStore;
use core_interp::Interpreter;
use core_platform::{EnvLookup, InputStream, OsEnv, OsExec, OsFileSystem};
use core_registry::{CommandLookup, Registry};
use core_term::{RawModeGuard, TermReader, TermWriter};

use driver::Repl;
use session::HistorySession;

/// CLI arguments. The shell itself takes no positional arguments; it reads
/// from stdin and writes to stdout/stderr.
#[derive(Parser, Debug)]
#[command(name = "rush", version, about = "An interactive POSIX-style shell")]
struct Args {
    /// Configuration file path (overrides discovery of `rush.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    install_panic_hook();

    let env = OsEnv;
    let config = core_config::load(args.config, &env)?;
    info!(target: "runtime", "startup");

    // History, preloaded from the history file when one is configured.
    let mut store = HistoryStore::new();
    let session = HistorySession::preload(config.history_path(&env), &OsFileSystem, &mut store);
    let history = Arc::new(Mutex::new(store));

    // One PATH scan at startup; the REPL never re-scans. The registry holds
    // a weak self-reference so the `type` builtin can resolve names.
    let path_value = env.get("PATH");
    let registry = Arc::new_cyclic(|weak| {
        let mut registry = Registry::new(Arc::new(OsExec));
        if !path_value.is_empty() {
            registry.scan_path(&path_value, &OsFileSystem);
        }
        builtins::register_all(&mut registry, weak.clone(), history.clone());
        registry
    });

    let writer = TermWriter::new(Box::new(io::stdout()));
    let reader = TermReader::new(Box::new(io::stdin()), writer.clone());

    let interp_out = writer.clone();
    let interp_err = writer.clone();
    let interpreter = Interpreter::new(
        registry.clone() as Arc<dyn CommandLookup>,
        Arc::new(env),
        Arc::new(OsFileSystem),
    )
    .with_io(
        Arc::new(|| InputStream::Inherit),
        Arc::new(move || Box::new(interp_out.clone())),
        Arc::new(move || Box::new(interp_err.clone())),
    );

    let mut terminal = RawModeGuard::enter().context("entering raw mode")?;
    let mut repl = Repl::new(reader, writer, registry, history.clone(), interpreter, config);
    let outcome = repl.run();
    terminal.leave().context("restoring terminal")?;

    // Append-only history persistence: only the entries added this session.
    session.persist(&OsFileSystem, &history.lock().expect("history poisoned"));

    info!(target: "runtime", "shutdown");
    outcome
}

/// File-backed tracing so nothing ever logs onto the raw-mode terminal.
/// Filtering follows `RUST_LOG`; without it the file stays quiet.
fn configure_logging() -> Option<WorkerGuard> {
    let dir = dirs::data_local_dir()
        .map(|d| d.join("rush"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&dir);
    let appender = tracing_appender::rolling::never(dir, "rush.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        // A subscriber is already installed (tests); drop the guard so the
        // writer shuts down.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            core_term::restore_terminal();
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}
