//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, delays ordered)
//! - Check that socket paths can be derived from the config
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.socket.directory.is_empty() {
        errors.push(ValidationError::new("socket.directory", "must not be empty"));
    } else if !Path::new(&config.socket.directory).is_absolute() {
        errors.push(ValidationError::new("socket.directory", "must be an absolute path"));
    }

    if config.socket.prefix.is_empty() {
        errors.push(ValidationError::new("socket.prefix", "must not be empty"));
    } else if config.socket.prefix.contains('/') {
        errors.push(ValidationError::new("socket.prefix", "must not contain '/'"));
    }

    if config.server.command.trim().is_empty() {
        errors.push(ValidationError::new("server.command", "must not be empty"));
    }
    if config.server.socket_env.is_empty() || config.server.socket_env.contains('=') {
        errors.push(ValidationError::new(
            "server.socket_env",
            "must be a non-empty variable name without '='",
        ));
    }
    if config.server.startup_timeout_secs == 0 {
        errors.push(ValidationError::new("server.startup_timeout_secs", "must be greater than 0"));
    }
    if config.server.poll_base_delay_ms > config.server.poll_max_delay_ms {
        errors.push(ValidationError::new(
            "server.poll_base_delay_ms",
            format!(
                "must not exceed poll_max_delay_ms ({})",
                config.server.poll_max_delay_ms
            ),
        ));
    }

    if config.retries.max_bind_conflicts == 0 {
        errors.push(ValidationError::new("retries.max_bind_conflicts", "must be at least 1"));
    }

    if config.observability.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
