//! Environment-variable lookup capability.

/// Read-only view of the process environment.
///
/// Unset variables resolve to the empty string; the interpreter routes every
/// `$VAR` expansion through this single method.
pub trait EnvLookup: Send + Sync {
    fn get(&self, name: &str) -> String;
}

/// Lookup backed by the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEnv;

impl EnvLookup for OsEnv {
    fn get(&self, name: &str) -> String {
        std::env::var(name).unwrap_or_default()
    }
}

/// Plain closures double as lookups in tests.
impl<F> EnvLookup for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn get(&self, name: &str) -> String {
        self(name)
    }
}
