//! Server Configuration
//!
//! Listener settings read from the host environment under `devtools.mcp.*`.

use devtools_types::Environment;

use crate::error::ServerError;

pub const PORT_KEY: &str = "devtools.mcp.port";
pub const HOST_KEY: &str = "devtools.mcp.host";
pub const MESSAGE_PATH_KEY: &str = "devtools.mcp.path";
pub const SSE_PATH_KEY: &str = "devtools.mcp.sse-path";
pub const SERVER_NAME_KEY: &str = "devtools.mcp.server-name";
pub const SERVER_VERSION_KEY: &str = "devtools.mcp.server-version";

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_MESSAGE_PATH: &str = "/mcp";
pub const DEFAULT_SSE_PATH: &str = "/sse";
pub const DEFAULT_SERVER_NAME: &str = "Devtools MCP Server";
pub const DEFAULT_SERVER_VERSION: &str = "1.0.0";

/// Listener and identity settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpConfig {
    pub host: String,
    pub port: u16,
    /// Endpoint that accepts posted JSON-RPC messages
    pub message_path: String,
    /// Endpoint that opens the event stream
    pub sse_path: String,
    pub server_name: String,
    pub server_version: String,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            message_path: DEFAULT_MESSAGE_PATH.to_string(),
            sse_path: DEFAULT_SSE_PATH.to_string(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            server_version: DEFAULT_SERVER_VERSION.to_string(),
        }
    }
}

impl McpConfig {
    /// Read settings from the environment, falling back to defaults
    pub fn from_environment(env: &dyn Environment) -> Result<Self, ServerError> {
        let port = match env.property(PORT_KEY) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ServerError::invalid_config(PORT_KEY, format!("'{}' is not a port: {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        let config = Self {
            host: env.property_or(HOST_KEY, DEFAULT_HOST),
            port,
            message_path: env.property_or(MESSAGE_PATH_KEY, DEFAULT_MESSAGE_PATH),
            sse_path: env.property_or(SSE_PATH_KEY, DEFAULT_SSE_PATH),
            server_name: env.property_or(SERVER_NAME_KEY, DEFAULT_SERVER_NAME),
            server_version: env.property_or(SERVER_VERSION_KEY, DEFAULT_SERVER_VERSION),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Check paths are absolute and distinct
    pub fn validate(&self) -> Result<(), ServerError> {
        for (key, path) in [(MESSAGE_PATH_KEY, &self.message_path), (SSE_PATH_KEY, &self.sse_path)] {
            if !path.starts_with('/') {
                return Err(ServerError::invalid_config(key, format!("'{}' must start with '/'", path)));
            }
        }
        if self.message_path == self.sse_path {
            return Err(ServerError::invalid_config(
                SSE_PATH_KEY,
                format!("must differ from {} ('{}')", MESSAGE_PATH_KEY, self.message_path),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ServerError::invalid_config(HOST_KEY, "must not be empty"));
        }
        Ok(())
    }

    /// `host:port` as given to the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
