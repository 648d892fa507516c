//! Socket Gateway Library
//!
//! Adapts one-request-at-a-time invocations to a persistent local HTTP server
//! reachable through a Unix domain socket.

pub mod config;
pub mod http;
pub mod net;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod runtime;

pub use config::GatewayConfig;
pub use http::{InboundEvent, InvocationContext, OutboundResult};
pub use lifecycle::{
    CommandLauncher, ConnectionLifecycleManager, ConnectionState, RouterLauncher, ServerLauncher,
};
pub use net::SocketAddressAllocator;
