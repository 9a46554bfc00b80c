//! Devtools MCP
//!
//! Exposes read-only introspection of a running application (registered
//! objects, active profiles, process health, loaded dependencies) as MCP
//! tools over HTTP with server-sent events.
//!
//! A host calls [`start`] once during startup with its [`HostContext`] and
//! keeps the returned [`McpServerHandle`].

pub mod config;
pub mod error;
pub mod inspect;
pub mod server;
pub mod tools;

pub use config::McpConfig;
pub use error::{ServerError, ToolError};
pub use server::{McpServer, McpServerHandle};

use devtools_types::HostContext;

/// Read configuration from the host environment, bind the listener and start serving
///
/// A bind failure is fatal; there is no retry or fallback port.
pub async fn start(host: HostContext) -> Result<McpServerHandle, ServerError> {
    let server = McpServer::new(&host)?;
    tracing::info!(
        "Starting {} v{} on {}",
        server.config().server_name,
        server.config().server_version,
        server.config().bind_address()
    );
    server.bind().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use devtools_host::{Container, HostEnvironment, ProcRuntimeProbe, StaticManifests};

    #[tokio::test]
    async fn test_start_serves_sse() {
        let host = HostContext::new(
            Container::new_shared(),
            Arc::new(HostEnvironment::from_value(serde_json::json!({
                "devtools": { "mcp": { "host": "127.0.0.1", "port": 0 } }
            }))),
            Arc::new(ProcRuntimeProbe::new()),
            Arc::new(StaticManifests::new(Vec::new())),
        );

        let handle = start(host).await.unwrap();
        let addr = handle.local_addr();
        assert!(addr.ip().is_loopback());

        // Raw HTTP/1.1 request; the first bytes of the stream carry the endpoint event
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /sse HTTP/1.1\r\nHost: localhost\r\nAccept: text/event-stream\r\n\r\n")
            .await
            .unwrap();

        let mut received = String::new();
        let mut buf = [0u8; 1024];
        while !received.contains("sessionId=") {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed early: {}", received);
            received.push_str(&String::from_utf8_lossy(&buf[..n]));
        }

        assert!(received.starts_with("HTTP/1.1 200"));
        assert!(received.contains("text/event-stream"));
        assert!(received.contains("endpoint"));
        assert_eq!(handle.session_count(), 1);

        handle.abort();
    }
}
