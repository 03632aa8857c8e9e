//! Command history: an append-only line log, a short-lived navigation cursor
//! over it, and optional file persistence.

pub mod cursor;
pub mod file;
pub mod store;

pub use cursor::HistoryCursor;
pub use store::HistoryStore;
