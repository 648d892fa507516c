//! Socket address allocation.
//!
//! The local server and the forwarder agree on the socket path through the
//! suffix alone: the same suffix always maps to the same path.

use std::fmt;
use std::path::PathBuf;

use crate::config::SocketConfig;

/// Monotonic counter used to derive a fresh socket path after a bind conflict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SocketSuffix(u64);

impl SocketSuffix {
    /// Get the raw suffix value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Move to the next suffix. Suffixes never go backwards.
    pub fn advance(&mut self) {
        self.0 = self.0.saturating_add(1);
    }
}

impl From<u64> for SocketSuffix {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SocketSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps a suffix to `<directory>/<prefix>.<suffix>.sock`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketAddressAllocator {
    directory: PathBuf,
    prefix: String,
}

impl SocketAddressAllocator {
    pub fn new(directory: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_config(config: &SocketConfig) -> Self {
        Self::new(&config.directory, &config.prefix)
    }

    /// Socket path for the given suffix.
    pub fn address(&self, suffix: SocketSuffix) -> PathBuf {
        self.directory
            .join(format!("{}.{}.sock", self.prefix, suffix.value()))
    }
}

impl Default for SocketAddressAllocator {
    fn default() -> Self {
        Self::from_config(&SocketConfig::default())
    }
}
