//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle / http / launchers
//!     → tracing events inside a per-invocation span (uuid id)
//!     → logging.rs subscriber (env filter + fmt to stderr)
//! ```

pub mod logging;

pub use logging::init_logging;
