//! Server Application State
//!
//! Shared state accessible by all HTTP handlers: the introspection readers,
//! the tool table and the table of open SSE sessions.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::McpConfig;
use crate::inspect::Introspector;
use crate::tools::ToolTable;

use super::protocol::{LogLevel, ServerMessage};

/// Bound of each session's outgoing queue
pub const SESSION_CHANNEL_CAPACITY: usize = 64;

/// Logger name on MCP log notifications
pub const LOGGER_NAME: &str = "devtools-mcp";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: McpConfig,

    introspector: Introspector,

    tools: ToolTable,

    /// Open SSE sessions
    sessions: DashMap<Uuid, SessionState>,
}

/// Per-session state
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: Uuid,

    /// Minimum level of log notifications sent to this session
    pub log_level: LogLevel,

    /// Channel feeding this session's SSE stream
    pub tx: mpsc::Sender<ServerMessage>,
}

impl AppState {
    pub fn new(config: McpConfig, introspector: Introspector) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                introspector,
                tools: ToolTable::builtin(),
                sessions: DashMap::new(),
            }),
        }
    }

    pub fn config(&self) -> &McpConfig {
        &self.inner.config
    }

    pub fn introspector(&self) -> &Introspector {
        &self.inner.introspector
    }

    pub fn tools(&self) -> &ToolTable {
        &self.inner.tools
    }

    /// Open a session and return its id with the receiving end of its queue
    pub fn register_session(&self) -> (Uuid, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        let session_id = Uuid::new_v4();

        self.inner.sessions.insert(
            session_id,
            SessionState {
                session_id,
                log_level: LogLevel::default(),
                tx,
            },
        );
        tracing::info!("Session opened: {}", session_id);

        (session_id, rx)
    }

    pub fn remove_session(&self, session_id: Uuid) {
        if self.inner.sessions.remove(&session_id).is_some() {
            tracing::info!("Session closed: {}", session_id);
        }
    }

    pub fn has_session(&self, session_id: Uuid) -> bool {
        self.inner.sessions.contains_key(&session_id)
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    /// Queue a message on a session's stream
    ///
    /// Full or closed queues drop the message.
    pub fn send_to_session(&self, session_id: Uuid, message: ServerMessage) {
        // Clone the sender so no map guard is held while sending
        let tx = match self.inner.sessions.get(&session_id) {
            Some(session) => session.tx.clone(),
            None => {
                tracing::warn!("Dropping message for unknown session {}", session_id);
                return;
            }
        };

        if let Err(e) = tx.try_send(message) {
            tracing::warn!("Failed to send message to session {}: {}", session_id, e);
        }
    }

    pub fn set_log_level(&self, session_id: Uuid, level: LogLevel) {
        if let Some(mut session) = self.inner.sessions.get_mut(&session_id) {
            tracing::debug!("Session {} log level set to {:?}", session_id, level);
            session.log_level = level;
        }
    }

    pub fn log_level(&self, session_id: Uuid) -> Option<LogLevel> {
        self.inner.sessions.get(&session_id).map(|s| s.log_level)
    }

    /// Send a log notification if the session's level allows it
    pub fn notify_log(&self, session_id: Uuid, level: LogLevel, data: Value) {
        match self.log_level(session_id) {
            Some(min) if level >= min => {
                self.send_to_session(session_id, ServerMessage::log(level, LOGGER_NAME, data));
            }
            _ => {}
        }
    }
}
