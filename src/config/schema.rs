//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the socket gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Where socket files for the local server are allocated.
    pub socket: SocketConfig,

    /// How the local server process is started.
    pub server: ServerConfig,

    /// Bind-conflict and respawn limits.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Socket address allocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocketConfig {
    /// Directory holding the socket files (absolute).
    pub directory: String,

    /// File name prefix, giving `<directory>/<prefix>.<suffix>.sock`.
    pub prefix: String,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            directory: "/tmp".to_string(),
            prefix: "server".to_string(),
        }
    }
}

/// Local server process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Program to execute.
    pub command: String,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Environment variable that receives the socket path.
    pub socket_env: String,

    /// Extra environment for the server process.
    pub env: BTreeMap<String, String>,

    /// How long to wait for the server to accept connections, in seconds.
    pub startup_timeout_secs: u64,

    /// First readiness poll delay in milliseconds.
    pub poll_base_delay_ms: u64,

    /// Upper bound on the readiness poll delay in milliseconds.
    pub poll_max_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            args: Vec::new(),
            socket_env: "SOCKET_PATH".to_string(),
            env: BTreeMap::new(),
            startup_timeout_secs: 10,
            poll_base_delay_ms: 10,
            poll_max_delay_ms: 200,
        }
    }
}

/// Retry limits for a single invocation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Bind conflicts tolerated before the start is treated as failed.
    #[serde(alias = "max_bind_attempts")]
    pub max_bind_conflicts: u32,

    /// Server restarts allowed after the server is found unreachable.
    pub max_respawns: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_bind_conflicts: 16,
            max_respawns: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
