//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Local server process spawned:
//!     → backoff.rs (delay between readiness probes)
//!     → probe the socket until it accepts or the startup timeout passes
//! ```
//!
//! # Design Decisions
//! - Startup waits are bounded; the forwarding path itself has no timeout
//! - Jittered backoff keeps probes cheap while the server boots

pub mod backoff;

pub use backoff::calculate_backoff;
