//! JSON-RPC Message Handler
//!
//! Dispatches one posted client message and produces the reply, if any, that
//! belongs on the session's stream.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::error::ToolError;

use super::protocol::{
    CallToolParams, CallToolResult, ClientMessage, Content, ErrorCode, InitializeParams, InitializeResult,
    Implementation, JSONRPC_VERSION, ListToolsResult, LogLevel, LoggingCapability, PROTOCOL_VERSION,
    ServerCapabilities, ServerMessage, SetLevelParams, ToolsCapability,
};
use super::state::AppState;

const INSTRUCTIONS: &str = "Read-only introspection of a running application: registered objects, \
                            active profiles, process health and loaded dependencies.";

/// Handle one client message
///
/// Returns `None` for notifications and for responses to server requests.
pub async fn handle_client_message(state: &AppState, session_id: Uuid, msg: ClientMessage) -> Option<ServerMessage> {
    let Some(method) = msg.method else {
        // Client answering a server request; this server never sends any
        tracing::debug!("Ignoring client response on session {}", session_id);
        return None;
    };

    let Some(id) = msg.id else {
        tracing::debug!("Notification {} on session {}", method, session_id);
        return None;
    };

    if msg.jsonrpc != JSONRPC_VERSION {
        return Some(ServerMessage::error(
            id,
            ErrorCode::InvalidRequest,
            format!("Unsupported jsonrpc version: {}", msg.jsonrpc),
        ));
    }

    tracing::debug!("Request {} ({}) on session {}", method, id, session_id);

    let params = msg.params.unwrap_or(Value::Null);
    let reply = match method.as_str() {
        "initialize" => handle_initialize(state, params),
        "ping" => Ok(json!({})),
        "tools/list" => handle_list_tools(state),
        "tools/call" => handle_call_tool(state, session_id, params).await,
        "logging/setLevel" => handle_set_level(state, session_id, params),
        other => Err((ErrorCode::MethodNotFound, format!("Method not found: {}", other))),
    };

    Some(match reply {
        Ok(result) => ServerMessage::result(id, result),
        Err((code, message)) => ServerMessage::error(id, code, message),
    })
}

type HandlerResult = Result<Value, (ErrorCode, String)>;

fn parse_params<T: for<'de> serde::Deserialize<'de>>(params: Value) -> Result<T, (ErrorCode, String)> {
    serde_json::from_value(params).map_err(|e| (ErrorCode::InvalidParams, format!("Invalid params: {}", e)))
}

fn to_result<T: serde::Serialize>(value: T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| (ErrorCode::InternalError, e.to_string()))
}

fn handle_initialize(state: &AppState, params: Value) -> HandlerResult {
    // Clients on other revisions are answered with ours; they decide whether to continue
    if let Ok(params) = serde_json::from_value::<InitializeParams>(params) {
        let client = params
            .client_info
            .map(|c| format!("{} {}", c.name, c.version))
            .unwrap_or_else(|| "unknown client".to_string());
        tracing::info!(
            "Initialize from {} (protocol {})",
            client,
            params.protocol_version.as_deref().unwrap_or("unspecified")
        );
    }

    let config = state.config();
    to_result(InitializeResult {
        protocol_version: PROTOCOL_VERSION,
        capabilities: ServerCapabilities {
            tools: ToolsCapability { list_changed: false },
            logging: LoggingCapability {},
        },
        server_info: Implementation {
            name: config.server_name.clone(),
            version: config.server_version.clone(),
        },
        instructions: INSTRUCTIONS.to_string(),
    })
}

fn handle_list_tools(state: &AppState) -> HandlerResult {
    to_result(ListToolsResult {
        tools: state.tools().list(),
    })
}

async fn handle_call_tool(state: &AppState, session_id: Uuid, params: Value) -> HandlerResult {
    let CallToolParams { name, arguments } = parse_params(params)?;

    state.notify_log(session_id, LogLevel::Debug, json!({ "tool": name.as_str() }));

    // Host readers block (lazy instantiation, /proc, lockfile reads)
    let worker_state = state.clone();
    let tool_name = name.clone();
    let output = tokio::task::spawn_blocking(move || call_tool(&worker_state, &tool_name, &arguments))
        .await
        .map_err(|e| (ErrorCode::InternalError, format!("Tool {} panicked: {}", name, e)))?;

    let output = output.map_err(|e| match &e {
        ToolError::NotFound(_) | ToolError::InvalidArguments { .. } => (ErrorCode::InvalidParams, e.to_string()),
        ToolError::Serialization(_) => (ErrorCode::InternalError, e.to_string()),
    })?;

    let text = serde_json::to_string_pretty(&output).map_err(|e| (ErrorCode::InternalError, e.to_string()))?;
    to_result(CallToolResult {
        content: vec![Content::Text { text }],
        is_error: false,
    })
}

fn call_tool(state: &AppState, name: &str, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
    state.tools().call(state.introspector(), name, arguments)
}

fn handle_set_level(state: &AppState, session_id: Uuid, params: Value) -> HandlerResult {
    let SetLevelParams { level } = parse_params(params)?;
    state.set_log_level(session_id, level);
    Ok(json!({}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::state::tests::test_state;

    fn request(id: i64, method: &str, params: Value) -> ClientMessage {
        ClientMessage {
            jsonrpc: "2.0".into(),
            id: Some(json!(id)),
            method: Some(method.into()),
            params: Some(params),
        }
    }

    async fn call(state: &AppState, session_id: Uuid, msg: ClientMessage) -> Value {
        let reply = handle_client_message(state, session_id, msg).await.unwrap();
        serde_json::to_value(reply).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let state = test_state();
        let (session, _rx) = state.register_session();

        let reply = call(
            &state,
            session,
            request(
                1,
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "inspector", "version": "0.1"}
                }),
            ),
        )
        .await;

        let result = &reply["result"];
        assert_eq!(reply["id"], 1);
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["capabilities"]["logging"], json!({}));
        assert_eq!(result["serverInfo"], json!({"name": "Devtools MCP Server", "version": "1.0.0"}));
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let state = test_state();
        let (session, _rx) = state.register_session();

        let msg = ClientMessage {
            jsonrpc: "2.0".into(),
            id: None,
            method: Some("notifications/initialized".into()),
            params: None,
        };
        assert!(handle_client_message(&state, session, msg).await.is_none());
    }

    #[tokio::test]
    async fn test_ping_and_unknown_method() {
        let state = test_state();
        let (session, _rx) = state.register_session();

        assert_eq!(call(&state, session, request(2, "ping", Value::Null)).await["result"], json!({}));

        let reply = call(&state, session, request(3, "resources/list", Value::Null)).await;
        assert_eq!(reply["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_tools_call_wraps_pretty_json() {
        let state = test_state();
        let (session, _rx) = state.register_session();

        let reply = call(
            &state,
            session,
            request(4, "tools/call", json!({"name": "getActiveProfiles", "arguments": {}})),
        )
        .await;

        assert_eq!(reply["result"]["isError"], false);
        assert_eq!(reply["result"]["content"][0]["type"], "text");
        assert_eq!(reply["result"]["content"][0]["text"], "[]");
    }

    #[tokio::test]
    async fn test_tools_call_errors_are_invalid_params() {
        let state = test_state();
        let (session, _rx) = state.register_session();

        let unknown = call(&state, session, request(5, "tools/call", json!({"name": "nope"}))).await;
        assert_eq!(unknown["error"]["code"], -32602);
        assert_eq!(unknown["error"]["message"], "Tool not found: nope");

        let missing_arg = call(&state, session, request(6, "tools/call", json!({"name": "describeObject"}))).await;
        assert_eq!(missing_arg["error"]["code"], -32602);

        let no_params = call(&state, session, request(7, "tools/call", Value::Null)).await;
        assert_eq!(no_params["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_set_level_enables_tool_logging() {
        let state = test_state();
        let (session, mut rx) = state.register_session();

        let reply = call(&state, session, request(8, "logging/setLevel", json!({"level": "debug"}))).await;
        assert_eq!(reply["result"], json!({}));
        assert_eq!(state.log_level(session), Some(LogLevel::Debug));

        call(&state, session, request(9, "tools/call", json!({"name": "listObjects"}))).await;

        let log = serde_json::to_value(rx.try_recv().unwrap()).unwrap();
        assert_eq!(log["method"], "notifications/message");
        assert_eq!(log["params"]["logger"], "devtools-mcp");
        assert_eq!(log["params"]["data"]["tool"], "listObjects");
    }

    #[tokio::test]
    async fn test_bad_level_rejected() {
        let state = test_state();
        let (session, _rx) = state.register_session();

        let reply = call(&state, session, request(10, "logging/setLevel", json!({"level": "verbose"}))).await;
        assert_eq!(reply["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let state = test_state();
        let (session, _rx) = state.register_session();

        let mut msg = request(11, "ping", Value::Null);
        msg.jsonrpc = "1.0".into();
        assert_eq!(call(&state, session, msg).await["error"]["code"], -32600);
    }
}
