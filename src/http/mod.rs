//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! InboundEvent (invocation boundary)
//!     → headers.rs (lower-case keys)
//!     → forward.rs (build request, add metadata headers, send over socket)
//!     → local server
//!     → forward.rs (read full response)
//!     → headers.rs (fold repeats, drop transport headers, capitalize)
//!     → OutboundResult (invocation boundary)
//! ```

pub mod event;
pub mod forward;
pub mod headers;

pub use event::{InboundEvent, InvocationContext, OutboundResult};
pub use forward::{forward, ForwardError, CONTEXT_HEADER, EVENT_HEADER};
pub use headers::HeaderMapping;
