//! MCP Server
//!
//! HTTP+SSE transport for the introspection tools. An [`McpServer`] is built
//! from the host handles and becomes an [`McpServerHandle`] once its listener
//! is bound.

mod handler;
mod protocol;
mod router;
mod state;

pub use handler::*;
pub use protocol::*;
pub use router::*;
pub use state::*;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::{AbortHandle, JoinHandle};

use devtools_types::HostContext;

use crate::config::McpConfig;
use crate::error::ServerError;
use crate::inspect::Introspector;

/// A server that has not bound its listener yet
pub struct McpServer {
    config: McpConfig,
    introspector: Introspector,
}

impl McpServer {
    /// Create a server, reading its configuration from the host environment
    pub fn new(host: &HostContext) -> Result<Self, ServerError> {
        let config = McpConfig::from_environment(host.environment.as_ref())?;
        Ok(Self::with_config(host, config))
    }

    /// Create a server with explicit configuration
    pub fn with_config(host: &HostContext, config: McpConfig) -> Self {
        Self {
            config,
            introspector: Introspector::new(host),
        }
    }

    pub fn config(&self) -> &McpConfig {
        &self.config
    }

    /// Bind the listener and start serving in the background
    pub async fn bind(self) -> Result<McpServerHandle, ServerError> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(&addr, e))?;
        let local_addr = listener.local_addr()?;

        let state = AppState::new(self.config, self.introspector);
        let app = create_router(state.clone());

        tracing::info!("MCP server listening on http://{}", local_addr);
        tracing::info!(
            "SSE endpoint: http://{}{}, message endpoint: http://{}{}",
            local_addr,
            state.config().sse_path,
            local_addr,
            state.config().message_path
        );

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.map_err(ServerError::from)
        });

        Ok(McpServerHandle {
            local_addr,
            state,
            task,
        })
    }
}

/// A bound, serving server
///
/// Dropping the handle leaves the server running; use [`abort`](Self::abort)
/// to stop it.
pub struct McpServerHandle {
    local_addr: SocketAddr,
    state: AppState,
    task: JoinHandle<Result<(), ServerError>>,
}

impl McpServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of open SSE sessions
    pub fn session_count(&self) -> usize {
        self.state.session_count()
    }

    /// Stop serving
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Handle that stops the server without owning it
    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }

    /// Wait for the server task to finish
    pub async fn join(self) -> Result<(), ServerError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(ServerError::Serve(std::io::Error::other(e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use devtools_host::{Container, HostEnvironment, StaticManifests};
    use super::state::tests::FixedProbe;

    fn host(values: serde_json::Value) -> HostContext {
        HostContext::new(
            Container::new_shared(),
            Arc::new(HostEnvironment::from_value(values)),
            Arc::new(FixedProbe),
            Arc::new(StaticManifests::new(Vec::new())),
        )
    }

    fn local_config() -> McpConfig {
        McpConfig::default().with_host("127.0.0.1").with_port(0)
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let handle = McpServer::with_config(&host(serde_json::json!({})), local_config())
            .bind()
            .await
            .unwrap();

        assert_ne!(handle.local_addr().port(), 0);
        assert_eq!(handle.session_count(), 0);

        handle.abort();
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_port_in_use_is_bind_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let result = McpServer::with_config(&host(serde_json::json!({})), local_config().with_port(port))
            .bind()
            .await;

        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let result = McpServer::new(&host(serde_json::json!({"devtools": {"mcp": {"port": "nine"}}})));
        assert!(matches!(result, Err(ServerError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_from_environment() {
        let server = McpServer::new(&host(serde_json::json!({"devtools": {"mcp": {"port": 7070}}}))).unwrap();
        assert_eq!(server.config().port, 7070);
    }
}
