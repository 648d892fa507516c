//! Invocation runtime adapters.
//!
//! The gateway is driven one invocation at a time by an external runtime.
//! `stdio.rs` is the driver used by the binary: JSON lines in, JSON lines out.

pub mod stdio;

pub use stdio::{run, Invocation};
