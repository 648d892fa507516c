//! JSON-lines invocation driver.
//!
//! Each input line is `{"event": {...}, "context": {...}}`; each output line
//! is the `OutboundResult` for the matching input line.

use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::{InboundEvent, InvocationContext, OutboundResult};
use crate::lifecycle::{ConnectionLifecycleManager, ServerLauncher};

/// One line of driver input.
#[derive(Debug, Deserialize)]
pub struct Invocation {
    pub event: InboundEvent,
    #[serde(default = "empty_context")]
    pub context: InvocationContext,
}

fn empty_context() -> InvocationContext {
    Value::Object(Map::new())
}

/// Feed every line of `input` through `manager`, writing one result per line.
///
/// Blank lines are skipped. Lines that do not parse yield the internal-error
/// result so output stays aligned with input.
pub async fn run<L, R, W>(
    manager: &mut ConnectionLifecycleManager<L>,
    mut input: R,
    mut output: W,
) -> std::io::Result<()>
where
    L: ServerLauncher,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();

    loop {
        line.clear();
        if input.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        // Raw bytes so a line that is not UTF-8 fails like any other bad JSON.
        let result = match serde_json::from_slice::<Invocation>(&line) {
            Ok(invocation) => manager.handle(&invocation.event, &invocation.context).await,
            Err(e) => {
                tracing::error!(error = %e, "Malformed invocation");
                OutboundResult::internal_error()
            }
        };

        let mut encoded = serde_json::to_vec(&result)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::lifecycle::RouterLauncher;
    use crate::net::SocketAddressAllocator;
    use axum::routing::get;
    use axum::Router;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn one_result_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = RouterLauncher::new(Router::new().route("/hello", get(|| async { "hi" })));
        let mut manager = ConnectionLifecycleManager::new(
            launcher,
            SocketAddressAllocator::new(dir.path(), "server"),
            RetryConfig::default(),
        );

        let input = concat!(
            r#"{"event": {"httpMethod": "GET", "path": "/hello"}}"#,
            "\n\n",
            "not json\n",
            r#"{"event": {"httpMethod": "GET", "path": "/hello", "headers": null},"#,
            r#" "context": {"id": 1}}"#,
            "\n",
        );
        let mut output = Vec::new();

        run(&mut manager, BufReader::new(input.as_bytes()), &mut output)
            .await
            .unwrap();

        let results: Vec<OutboundResult> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].status_code, 200);
        assert_eq!(results[0].body, "hi");
        assert_eq!(results[1], OutboundResult::internal_error());
        assert_eq!(results[2].status_code, 200);
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_stop_the_driver() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = RouterLauncher::new(Router::new().route("/hello", get(|| async { "hi" })));
        let mut manager = ConnectionLifecycleManager::new(
            launcher,
            SocketAddressAllocator::new(dir.path(), "server"),
            RetryConfig::default(),
        );

        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(br#"{"event": {"httpMethod": "GET", "path": "/hello"}}"#);
        input.push(b'\n');
        let mut output = Vec::new();

        run(&mut manager, BufReader::new(input.as_slice()), &mut output)
            .await
            .unwrap();

        let results: Vec<OutboundResult> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], OutboundResult::internal_error());
        assert_eq!(results[1].status_code, 200);
        assert_eq!(results[1].body, "hi");
    }
}
