//! Request forwarding over the local server's Unix socket.
//!
//! # Responsibilities
//! - Build the internal-leg request from an inbound event
//! - Send it over a fresh HTTP/1.1 connection on the socket
//! - Read the full response and reassemble the outbound result
//!
//! # Design Decisions
//! - No retries here; the lifecycle manager decides between retry and respawn
//! - Compression is disabled on the internal leg (`accept-encoding: identity`)
//!   because the body is reassembled as text
//! - Connect failures keep their `io::Error` so callers can classify them

use std::path::{Path, PathBuf};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::UnixStream;

use crate::http::event::{InboundEvent, InvocationContext, OutboundResult};
use crate::http::headers::{response_headers, to_lower_keyed, HeaderMapping};
use crate::net::TransportErrorKind;

/// Header carrying the JSON-serialized inbound event.
pub const EVENT_HEADER: &str = "x-apigateway-event";

/// Header carrying the JSON-serialized invocation context.
pub const CONTEXT_HEADER: &str = "x-apigateway-context";

/// Errors raised while forwarding a request to the local server.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Could not open the socket.
    #[error("failed to connect to {}: {source}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event does not describe a valid HTTP request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Event or context could not be serialized.
    #[error("failed to serialize request metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The HTTP exchange itself failed.
    #[error("HTTP exchange failed: {0}")]
    Http(#[from] hyper::Error),
}

impl ForwardError {
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            ForwardError::Connect { source, .. } => TransportErrorKind::from_io(source),
            ForwardError::InvalidRequest(_) | ForwardError::Metadata(_) | ForwardError::Http(_) => {
                TransportErrorKind::Other
            }
        }
    }
}

/// Path plus form-encoded query string. Parameters are emitted in key order;
/// the `?` is omitted when there are none.
pub fn request_path(event: &InboundEvent) -> String {
    let mut path = event.path.clone();

    if let Some(params) = event
        .query_string_parameters
        .as_ref()
        .filter(|params| !params.is_empty())
    {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        path.push('?');
        path.push_str(&query);
    }

    path
}

/// Headers sent on the internal leg.
pub fn request_headers(
    event: &InboundEvent,
    context: &InvocationContext,
) -> Result<HeaderMapping, ForwardError> {
    let mut headers = event
        .headers
        .as_ref()
        .map(to_lower_keyed)
        .unwrap_or_default();

    headers.insert("accept-encoding".to_string(), "identity".to_string());
    headers.insert(EVENT_HEADER.to_string(), serde_json::to_string(event)?);
    headers.insert(CONTEXT_HEADER.to_string(), serde_json::to_string(context)?);
    // HTTP/1.1 requires a host and the socket has no authority of its own.
    headers
        .entry("host".to_string())
        .or_insert_with(|| "localhost".to_string());

    Ok(headers)
}

/// Build the hyper request for the internal leg.
pub fn build_request(
    event: &InboundEvent,
    context: &InvocationContext,
) -> Result<Request<Full<Bytes>>, ForwardError> {
    let method = Method::from_bytes(event.http_method.as_bytes()).map_err(|_| {
        ForwardError::InvalidRequest(format!("unsupported method {:?}", event.http_method))
    })?;

    let mut builder = Request::builder().method(method).uri(request_path(event));

    for (name, value) in request_headers(event, context)? {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ForwardError::InvalidRequest(format!("invalid header name {:?}", name))
        })?;
        let header_value = HeaderValue::from_bytes(value.as_bytes()).map_err(|_| {
            ForwardError::InvalidRequest(format!("invalid value for header {}", name))
        })?;
        builder = builder.header(header_name, header_value);
    }

    let body = match event.body.as_deref() {
        Some(body) if !body.is_empty() => Bytes::copy_from_slice(body.as_bytes()),
        _ => Bytes::new(),
    };

    builder
        .body(Full::new(body))
        .map_err(|e| ForwardError::InvalidRequest(e.to_string()))
}

/// Forward one invocation to the server listening at `socket`.
pub async fn forward(
    socket: &Path,
    event: &InboundEvent,
    context: &InvocationContext,
) -> Result<OutboundResult, ForwardError> {
    let request = build_request(event, context)?;

    let stream = UnixStream::connect(socket)
        .await
        .map_err(|source| ForwardError::Connect {
            path: socket.to_path_buf(),
            source,
        })?;

    let (mut sender, connection) =
        hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::debug!(error = %e, "Internal connection closed with error");
        }
    });

    let response = sender.send_request(request).await?;
    let status_code = response.status().as_u16();

    let raw_headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    let body = response.into_body().collect().await?.to_bytes();

    Ok(OutboundResult {
        status_code,
        headers: response_headers(raw_headers),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
