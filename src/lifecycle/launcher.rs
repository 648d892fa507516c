//! Starting the local server.
//!
//! # Responsibilities
//! - Define the `ServerLauncher` seam used by the lifecycle manager
//! - Report bind conflicts distinctly from other start failures
//! - Serve an in-process `axum::Router` on a Unix socket

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Coarse classification of a failed start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchErrorKind {
    /// Something already owns the socket path; try another.
    AddrInUse,
    /// Any other failure.
    Other,
}

/// Errors raised while starting the local server.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("socket address {} already in use", .0.display())]
    AddrInUse(PathBuf),

    #[error("failed to bind {}: {source}", path.display())]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove stale socket {}: {source}", path.display())]
    StaleSocket {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn server process: {0}")]
    Spawn(#[source] io::Error),

    #[error("server process exited before listening: {0}")]
    Exited(ExitStatus),

    #[error("server did not listen on {} within {timeout:?}", path.display())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("failed to supervise server process: {0}")]
    Supervise(#[source] io::Error),
}

impl LaunchError {
    /// Map a bind failure, separating address conflicts from everything else.
    pub fn bind(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::AddrInUse {
            LaunchError::AddrInUse(path.to_path_buf())
        } else {
            LaunchError::Bind {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn kind(&self) -> LaunchErrorKind {
        match self {
            LaunchError::AddrInUse(_) => LaunchErrorKind::AddrInUse,
            LaunchError::Bind { .. }
            | LaunchError::StaleSocket { .. }
            | LaunchError::Spawn(_)
            | LaunchError::Exited(_)
            | LaunchError::Timeout { .. }
            | LaunchError::Supervise(_) => LaunchErrorKind::Other,
        }
    }
}

/// Something that can bring the local server up at a socket path.
///
/// `start` resolves once the server accepts connections at `path`. A launcher
/// that already runs a server replaces it.
pub trait ServerLauncher: Send {
    fn start(&mut self, path: &Path) -> impl Future<Output = Result<(), LaunchError>> + Send;
}

struct Serving {
    path: PathBuf,
    task: JoinHandle<()>,
}

/// Serves an axum `Router` in-process on a Unix socket.
pub struct RouterLauncher {
    router: Router,
    serving: Option<Serving>,
}

impl RouterLauncher {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            serving: None,
        }
    }

    /// Socket path of the running server, if any.
    pub fn socket_path(&self) -> Option<&Path> {
        self.serving.as_ref().map(|s| s.path.as_path())
    }

    /// Stop serving and remove the socket file.
    pub fn shutdown(&mut self) {
        if let Some(serving) = self.serving.take() {
            serving.task.abort();
            match std::fs::remove_file(&serving.path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        socket = %serving.path.display(),
                        error = %e,
                        "Failed to remove socket file"
                    );
                }
            }
            tracing::debug!(socket = %serving.path.display(), "In-process server stopped");
        }
    }
}

impl ServerLauncher for RouterLauncher {
    async fn start(&mut self, path: &Path) -> Result<(), LaunchError> {
        self.shutdown();

        let listener = UnixListener::bind(path).map_err(|e| LaunchError::bind(path, e))?;
        let app = self.router.clone().layer(TraceLayer::new_for_http());
        let socket = path.to_path_buf();

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(socket = %socket.display(), error = %e, "In-process server failed");
            }
        });

        tracing::debug!(socket = %path.display(), "In-process server listening");
        self.serving = Some(Serving {
            path: path.to_path_buf(),
            task,
        });
        Ok(())
    }
}

impl Drop for RouterLauncher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
