//! Local server as a child process.
//!
//! # Responsibilities
//! - Spawn the configured program with the socket path in its environment
//! - Detect an occupied socket path before spawning (bind conflict)
//! - Poll the socket until the child accepts connections
//! - Kill the previous child on respawn and on drop
//!
//! # Design Decisions
//! - A socket file that refuses connections is stale and removed first
//! - Child stdout is redirected to stderr; stdout belongs to the driver

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio::time::Instant;

use crate::config::ServerConfig;
use crate::lifecycle::launcher::{LaunchError, ServerLauncher};
use crate::resilience::calculate_backoff;

pub struct CommandLauncher {
    config: ServerConfig,
    child: Option<Child>,
}

impl CommandLauncher {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    /// Process ID of the running child, if any.
    pub fn child_id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill previous server process");
            }
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .envs(&self.config.env)
            .env(&self.config.socket_env, path)
            .stdin(Stdio::null())
            .stdout(io::stderr())
            .kill_on_drop(true);
        command
    }

    async fn wait_until_listening(
        &self,
        child: &mut Child,
        path: &Path,
    ) -> Result<(), LaunchError> {
        let timeout = Duration::from_secs(self.config.startup_timeout_secs);
        let base = Duration::from_millis(self.config.poll_base_delay_ms);
        let max = Duration::from_millis(self.config.poll_max_delay_ms);
        // A timeout too large to represent means waiting without a deadline.
        let deadline = Instant::now().checked_add(timeout);
        let mut attempt = 0;

        loop {
            if UnixStream::connect(path).await.is_ok() {
                return Ok(());
            }
            if let Some(status) = child.try_wait().map_err(LaunchError::Supervise)? {
                return Err(LaunchError::Exited(status));
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(LaunchError::Timeout {
                    path: path.to_path_buf(),
                    timeout,
                });
            }

            attempt += 1;
            tokio::time::sleep(calculate_backoff(attempt, base, max)).await;
        }
    }
}

/// Fail with a conflict if something accepts on `path`; clear a stale file.
async fn claim_socket_path(path: &Path) -> Result<(), LaunchError> {
    match UnixStream::connect(path).await {
        Ok(_) => Err(LaunchError::AddrInUse(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
            tracing::debug!(socket = %path.display(), "Removing stale socket file");
            match tokio::fs::remove_file(path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(LaunchError::StaleSocket {
                    path: path.to_path_buf(),
                    source,
                }),
            }
        }
        Err(_) => Ok(()),
    }
}

impl ServerLauncher for CommandLauncher {
    async fn start(&mut self, path: &Path) -> Result<(), LaunchError> {
        self.stop().await;
        claim_socket_path(path).await?;

        let mut child = self.command(path).spawn().map_err(LaunchError::Spawn)?;
        tracing::info!(
            command = %self.config.command,
            pid = child.id(),
            socket = %path.display(),
            "Spawned server process"
        );

        if let Err(e) = self.wait_until_listening(&mut child, path).await {
            let _ = child.kill().await;
            return Err(e);
        }

        self.child = Some(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::launcher::LaunchErrorKind;

    /// Binds the socket named by `$GATEWAY_SOCKET` and idles.
    const LISTENING_SERVER: &str = "import os, socket, time\n\
        s = socket.socket(socket.AF_UNIX, socket.SOCK_STREAM)\n\
        s.bind(os.environ['GATEWAY_SOCKET'])\n\
        s.listen(8)\n\
        time.sleep(30)\n";

    fn listening_server() -> ServerConfig {
        ServerConfig {
            socket_env: "GATEWAY_SOCKET".to_string(),
            startup_timeout_secs: 10,
            ..config("python3", &["-c", LISTENING_SERVER])
        }
    }

    fn config(command: &str, args: &[&str]) -> ServerConfig {
        ServerConfig {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            startup_timeout_secs: 2,
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn occupied_path_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.0.sock");
        let _owner = tokio::net::UnixListener::bind(&path).unwrap();

        let mut launcher = CommandLauncher::new(config("sh", &["-c", "exit 0"]));
        let err = launcher.start(&path).await.unwrap_err();

        assert_eq!(err.kind(), LaunchErrorKind::AddrInUse);
        assert!(launcher.child_id().is_none());
    }

    #[tokio::test]
    async fn stale_socket_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.0.sock");
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let mut launcher = CommandLauncher::new(config("sh", &["-c", "exit 0"]));
        let err = launcher.start(&path).await.unwrap_err();

        assert!(matches!(err, LaunchError::Exited(_)));
        assert_eq!(err.kind(), LaunchErrorKind::Other);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.0.sock");

        let mut launcher = CommandLauncher::new(config("/nonexistent/socket-gateway-server", &[]));
        let err = launcher.start(&path).await.unwrap_err();

        assert!(matches!(err, LaunchError::Spawn(_)));
        assert_eq!(err.kind(), LaunchErrorKind::Other);
    }

    #[tokio::test]
    async fn silent_child_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.0.sock");

        let mut server = config("sleep", &["30"]);
        server.startup_timeout_secs = 1;
        let mut launcher = CommandLauncher::new(server);
        let err = launcher.start(&path).await.unwrap_err();

        assert!(matches!(err, LaunchError::Timeout { .. }));
        assert!(launcher.child_id().is_none());
    }

    #[tokio::test]
    async fn huge_timeout_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.0.sock");

        let mut server = config("sh", &["-c", "exit 0"]);
        server.startup_timeout_secs = u64::MAX;
        let mut launcher = CommandLauncher::new(server);
        let err = launcher.start(&path).await.unwrap_err();

        assert!(matches!(err, LaunchError::Exited(_)));
    }

    #[tokio::test]
    async fn child_listening_on_socket_env_starts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.0.sock");

        let mut launcher = CommandLauncher::new(listening_server());
        launcher.start(&path).await.unwrap();

        assert!(launcher.child_id().is_some());
        assert!(UnixStream::connect(&path).await.is_ok());
    }

    #[tokio::test]
    async fn respawn_replaces_previous_child() {
        let dir = tempfile::tempdir().unwrap();
        let first_path = dir.path().join("server.0.sock");
        let second_path = dir.path().join("server.1.sock");

        let mut launcher = CommandLauncher::new(listening_server());
        launcher.start(&first_path).await.unwrap();
        let first_pid = launcher.child_id().unwrap();

        launcher.start(&second_path).await.unwrap();
        let second_pid = launcher.child_id().unwrap();

        assert_ne!(first_pid, second_pid);
        assert!(!Path::new(&format!("/proc/{first_pid}")).exists());
        assert!(UnixStream::connect(&second_path).await.is_ok());
    }
}
