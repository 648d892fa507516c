//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Invocation arrives (manager.rs):
//!     NotListening → launcher.rs / command.rs start the server at address(suffix)
//!         bind conflict → advance suffix, start again
//!     Listening → http::forward
//!         unreachable → reset to NotListening, replay the invocation
//!     → exactly one OutboundResult
//! ```
//!
//! # Design Decisions
//! - State and suffix are owned by the manager instance, not global
//! - Retries are an explicit loop with configured bounds, not recursion
//! - Launchers are a trait so the server can be in-process or a child process

pub mod command;
pub mod launcher;
pub mod manager;

pub use command::CommandLauncher;
pub use launcher::{LaunchError, LaunchErrorKind, RouterLauncher, ServerLauncher};
pub use manager::{ConnectionLifecycleManager, ConnectionState};
