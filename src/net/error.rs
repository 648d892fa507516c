//! Transport error classification.

use std::io;

/// Why a connection to the local server failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The socket file exists but nothing accepts on it.
    ConnectionRefused,
    /// The socket file does not exist.
    NotFound,
    /// Anything else: protocol errors, resets, invalid requests.
    Other,
}

impl TransportErrorKind {
    /// Classify an I/O error raised while connecting.
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Other,
        }
    }

    /// True when the local server is gone and should be started again.
    pub fn is_unreachable(self) -> bool {
        matches!(self, Self::ConnectionRefused | Self::NotFound)
    }
}
