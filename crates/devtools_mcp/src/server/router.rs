//! HTTP Router
//!
//! MCP over HTTP with server-sent events: clients open a stream on the SSE
//! path, then post JSON-RPC messages to the message path with the session id
//! the stream announced.

use std::convert::Infallible;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::Deserialize;
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use super::handler::handle_client_message;
use super::protocol::{ClientMessage, ErrorCode, ServerMessage};
use super::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config().clone();

    Router::new()
        .route(&config.sse_path, get(sse_connect))
        .route(&config.message_path, post(post_message))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Stream
// ─────────────────────────────────────────────────────────────────────────────

/// Removes the session when the stream is dropped
struct SessionGuard {
    state: AppState,
    session_id: Uuid,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.remove_session(self.session_id);
    }
}

async fn sse_connect(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session_id, rx) = state.register_session();
    let endpoint = format!("{}?sessionId={}", state.config().message_path, session_id);

    let guard = SessionGuard {
        state: state.clone(),
        session_id,
    };

    let messages = ReceiverStream::new(rx).filter_map(move |message| {
        let _guard = &guard;
        message_event(&message)
    });

    let stream = tokio_stream::once(Event::default().event("endpoint").data(endpoint))
        .chain(messages)
        .map(Ok);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn message_event(message: &ServerMessage) -> Option<Event> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Event::default().event("message").data(json)),
        Err(e) => {
            tracing::warn!("Failed to serialize server message: {}", e);
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Message Endpoint
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

async fn post_message(State(state): State<AppState>, Query(query): Query<MessageQuery>, body: Bytes) -> Response {
    let Some(raw_id) = query.session_id else {
        return error_response(StatusCode::NOT_FOUND, "Missing sessionId");
    };
    let session_id = match Uuid::parse_str(&raw_id) {
        Ok(id) if state.has_session(id) => id,
        _ => return error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", raw_id)),
    };

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to parse message on session {}: {}", session_id, e);
            state.send_to_session(
                session_id,
                ServerMessage::error(serde_json::Value::Null, ErrorCode::ParseError, format!("Parse error: {}", e)),
            );
            return error_response(StatusCode::BAD_REQUEST, "Parse error");
        }
    };

    let id = value.get("id").cloned().unwrap_or(serde_json::Value::Null);
    let message: ClientMessage = match serde_json::from_value(value) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Invalid JSON-RPC message on session {}: {}", session_id, e);
            state.send_to_session(
                session_id,
                ServerMessage::error(id, ErrorCode::InvalidRequest, format!("Invalid request: {}", e)),
            );
            return error_response(StatusCode::BAD_REQUEST, "Invalid request");
        }
    };

    if let Some(reply) = handle_client_message(&state, session_id, message).await {
        state.send_to_session(session_id, reply);
    }

    StatusCode::ACCEPTED.into_response()
}
