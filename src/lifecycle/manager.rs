//! Connection lifecycle state machine.
//!
//! # States
//! - NotListening: the local server must be started before forwarding
//! - Listening: requests are forwarded directly
//!
//! # State Transitions
//! ```text
//! NotListening → Listening:    launcher confirmed the server is up
//! Listening → NotListening:    forward found the socket refused or missing
//! ```
//!
//! Bind conflicts advance the socket suffix and retry the start within the
//! same invocation. An unreachable server is restarted and the invocation
//! replayed, up to `max_respawns` times. Every other failure ends the
//! invocation with a fixed error result; the caller never sees an `Err`.

use std::path::PathBuf;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::RetryConfig;
use crate::http::{forward, InboundEvent, InvocationContext, OutboundResult};
use crate::lifecycle::launcher::{LaunchErrorKind, ServerLauncher};
use crate::net::{SocketAddressAllocator, SocketSuffix, TransportErrorKind};

/// Whether the local server is believed to be accepting connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NotListening,
    Listening,
}

/// Owns the local server's readiness and socket address for one adapter
/// instance. `handle` takes `&mut self`, so invocations are serialized.
pub struct ConnectionLifecycleManager<L> {
    launcher: L,
    allocator: SocketAddressAllocator,
    retries: RetryConfig,
    state: ConnectionState,
    suffix: SocketSuffix,
}

impl<L: ServerLauncher> ConnectionLifecycleManager<L> {
    pub fn new(launcher: L, allocator: SocketAddressAllocator, retries: RetryConfig) -> Self {
        tracing::info!("Initializing new handler");
        Self {
            launcher,
            allocator,
            retries,
            state: ConnectionState::NotListening,
            suffix: SocketSuffix::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn suffix(&self) -> SocketSuffix {
        self.suffix
    }

    /// Socket path for the current suffix.
    pub fn socket_path(&self) -> PathBuf {
        self.allocator.address(self.suffix)
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn launcher_mut(&mut self) -> &mut L {
        &mut self.launcher
    }

    /// Run one invocation to its single terminal result.
    pub async fn handle(
        &mut self,
        event: &InboundEvent,
        context: &InvocationContext,
    ) -> OutboundResult {
        let span = tracing::info_span!(
            "invocation",
            id = %Uuid::new_v4(),
            method = %event.http_method,
            path = %event.path,
        );
        self.run(event, context).instrument(span).await
    }

    async fn run(&mut self, event: &InboundEvent, context: &InvocationContext) -> OutboundResult {
        let mut bind_conflicts = 0u32;
        let mut respawns = 0u32;

        loop {
            if self.state == ConnectionState::NotListening {
                let path = self.socket_path();
                tracing::info!(
                    socket = %path.display(),
                    suffix = %self.suffix,
                    "Starting local server"
                );

                if let Err(e) = self.launcher.start(&path).await {
                    match e.kind() {
                        LaunchErrorKind::AddrInUse => {
                            bind_conflicts += 1;
                            self.suffix.advance();
                            if bind_conflicts >= self.retries.max_bind_conflicts {
                                tracing::error!(
                                    error = %e,
                                    conflicts = bind_conflicts,
                                    "Giving up after repeated bind conflicts"
                                );
                                return OutboundResult::internal_error();
                            }
                            tracing::warn!(
                                error = %e,
                                next_suffix = %self.suffix,
                                "Address in use, trying again"
                            );
                            continue;
                        }
                        LaunchErrorKind::Other => {
                            tracing::error!(error = %e, "Local server failed to start");
                            return OutboundResult::internal_error();
                        }
                    }
                }

                self.state = ConnectionState::Listening;
                tracing::info!(socket = %path.display(), "Local server listening");
            }

            let path = self.socket_path();
            tracing::debug!(socket = %path.display(), "Sending request to local server");

            match forward(&path, event, context).await {
                Ok(result) => {
                    tracing::info!(
                        status = result.status_code,
                        "Received response from local server"
                    );
                    return result;
                }
                Err(e) => match e.kind() {
                    TransportErrorKind::ConnectionRefused | TransportErrorKind::NotFound => {
                        self.state = ConnectionState::NotListening;
                        if respawns >= self.retries.max_respawns {
                            tracing::error!(
                                error = %e,
                                respawns,
                                "Local server still unreachable after restart"
                            );
                            return OutboundResult::bad_gateway();
                        }
                        respawns += 1;
                        tracing::warn!(error = %e, "Could not connect, restarting local server");
                    }
                    TransportErrorKind::Other => {
                        tracing::error!(error = %e, "Forwarding to local server failed");
                        return OutboundResult::bad_gateway();
                    }
                },
            }
        }
    }
}
