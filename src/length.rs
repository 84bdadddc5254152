//! Externally declared content length.

use parking_lot::RwLock;
use std::env;
use std::fmt;
use std::sync::Arc;

/// Environment variable read by [`ResourceStream::input`](crate::ResourceStream::input).
pub const CONTENT_LENGTH_VAR: &str = "CONTENT_LENGTH";

/// Where an input stream learns its size from.
///
/// The value is looked up on every call to [`get`](Self::get), never cached,
/// because the embedding application may declare it after the stream exists.
#[derive(Clone, Default)]
pub struct DeclaredLength {
    source: Source,
}

#[derive(Clone, Default)]
enum Source {
    #[default]
    None,
    Env(String),
    Shared(Arc<RwLock<Option<String>>>),
}

impl DeclaredLength {
    /// No declared length; size is always unknown.
    pub fn none() -> Self {
        Self { source: Source::None }
    }

    /// Read the named environment variable on each lookup.
    pub fn env(var: impl Into<String>) -> Self {
        Self {
            source: Source::Env(var.into()),
        }
    }

    /// A cell the application sets with [`declare`](Self::declare).
    ///
    /// Clones share the same cell.
    pub fn shared() -> Self {
        Self {
            source: Source::Shared(Arc::new(RwLock::new(None))),
        }
    }

    /// Declare a length on a shared cell.
    ///
    /// Has no effect on `none` or `env` sources.
    pub fn declare(&self, length: u64) {
        self.declare_raw(length.to_string());
    }

    /// Declare a raw, unparsed value on a shared cell.
    pub fn declare_raw(&self, value: impl Into<String>) {
        if let Source::Shared(cell) = &self.source {
            *cell.write() = Some(value.into());
        }
    }

    /// Remove a declared value from a shared cell.
    pub fn clear(&self) {
        if let Source::Shared(cell) = &self.source {
            *cell.write() = None;
        }
    }

    /// The declared length, if present and a non-negative integer.
    pub fn get(&self) -> Option<u64> {
        match &self.source {
            Source::None => None,
            Source::Env(var) => env::var(var).ok().as_deref().and_then(parse_length),
            Source::Shared(cell) => cell.read().as_deref().and_then(parse_length),
        }
    }
}

fn parse_length(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

impl fmt::Debug for DeclaredLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::None => f.write_str("DeclaredLength::None"),
            Source::Env(var) => f.debug_tuple("DeclaredLength::Env").field(var).finish(),
            Source::Shared(cell) => f
                .debug_tuple("DeclaredLength::Shared")
                .field(&*cell.read())
                .finish(),
        }
    }
}
