//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! SocketSuffix (owned by the lifecycle manager)
//!     → address.rs (suffix → socket path)
//!     → launcher binds / forwarder connects at that path
//!     → error.rs (io::ErrorKind → TransportErrorKind)
//! ```
//!
//! # Design Decisions
//! - Socket paths are derived, never stored, so both legs agree by construction
//! - I/O errors are classified once, here; callers match on the typed kind

pub mod address;
pub mod error;

pub use address::{SocketAddressAllocator, SocketSuffix};
pub use error::TransportErrorKind;
