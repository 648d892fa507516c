//! Shared utilities for integration testing.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Response, StatusCode, Uri};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use socket_gateway::lifecycle::{LaunchError, ServerLauncher};
use socket_gateway::InboundEvent;

/// Router standing in for the local server.
///
/// `/echo` and everything unmatched reflect the request back as JSON;
/// `/cookies` answers with repeated headers.
pub fn echo_router() -> Router {
    Router::new()
        .route("/cookies", get(cookies))
        .route("/echo", any(echo))
        .fallback(echo)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
    let headers: serde_json::Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(value.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();

    Json(json!({
        "method": method.as_str(),
        "uri": uri.to_string(),
        "headers": headers,
        "body": body,
    }))
}

async fn cookies() -> Response<Body> {
    Response::builder()
        .status(StatusCode::CREATED)
        .header(header::SET_COOKIE, "a=1")
        .header(header::SET_COOKIE, "b=2")
        .header("x-multi", "one")
        .header("x-multi", "two")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("cookies set"))
        .unwrap()
}

#[allow(dead_code)]
pub fn event(method: &str, path: &str) -> InboundEvent {
    InboundEvent::new(method, path)
}

/// Wraps a launcher and counts `start` calls.
pub struct CountingLauncher<L> {
    pub inner: L,
    starts: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl<L> CountingLauncher<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            starts: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }
}

impl<L: ServerLauncher> ServerLauncher for CountingLauncher<L> {
    async fn start(&mut self, path: &Path) -> Result<(), LaunchError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.inner.start(path).await
    }
}

/// Claims success without ever listening.
#[allow(dead_code)]
pub struct PhantomLauncher;

impl ServerLauncher for PhantomLauncher {
    async fn start(&mut self, _path: &Path) -> Result<(), LaunchError> {
        Ok(())
    }
}
