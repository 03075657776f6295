//! JSON-RPC 2.0 dispatcher for the `/mcp` endpoint.
//!
//! Supports the tool subset of the Model Context Protocol: `initialize`,
//! `notifications/initialized`, `ping`, `tools/list` and `tools/call`.
//! Batches are not accepted.

use log::{debug, warn};
use serde_json::{json, Value};

use crate::operations::tool_registry::{descriptors, parse_call};
use crate::operations::OperationFacade;
use crate::output_normalization::envelope::ResultEnvelope;
use crate::process_execution::ToolRunner;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

pub fn success_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": JSONRPC_VERSION, "id": id, "result": result })
}

pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "error": { "code": code, "message": message }
    })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

/// Handles one JSON-RPC message. Returns `None` for notifications, which
/// never get a response.
pub async fn dispatch<R: ToolRunner>(facade: &OperationFacade<R>, message: Value) -> Option<Value> {
    let object = match message.as_object() {
        Some(object) => object,
        None => {
            return Some(error_response(
                Value::Null,
                INVALID_REQUEST,
                "request must be a JSON object",
            ))
        }
    };

    let id = object.get("id").cloned();
    let reply_id = id.clone().unwrap_or(Value::Null);

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Some(error_response(reply_id, INVALID_REQUEST, "jsonrpc must be \"2.0\""));
    }
    let method = match object.get("method").and_then(Value::as_str) {
        Some(method) => method,
        None => return Some(error_response(reply_id, INVALID_REQUEST, "method is required")),
    };
    let params = object.get("params").cloned().unwrap_or(Value::Null);
    debug!("JSON-RPC {} (id {})", method, reply_id);

    let outcome = match method {
        "initialize" => Ok(initialize_result()),
        "ping" => Ok(json!({})),
        "notifications/initialized" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": descriptors() })),
        "tools/call" => call_tool(facade, params).await,
        other => {
            warn!("Unknown JSON-RPC method {}", other);
            Err((METHOD_NOT_FOUND, format!("method not found: {}", other)))
        }
    };

    if id.is_none() {
        debug!("Notification {} processed", method);
        return None;
    }
    Some(match outcome {
        Ok(result) => success_response(reply_id, result),
        Err((code, message)) => error_response(reply_id, code, &message),
    })
}

/// Wraps an envelope as MCP tool content.
fn tool_result(envelope: &ResultEnvelope) -> Value {
    json!({
        "content": [{ "type": "text", "text": envelope.to_json_pretty() }],
        "isError": envelope.is_error()
    })
}

/// A missing tool name is a protocol error. Unknown tools and undecodable
/// arguments are tool failures, reported as an error envelope the same way
/// the REST route reports them.
async fn call_tool<R: ToolRunner>(
    facade: &OperationFacade<R>,
    params: Value,
) -> Result<Value, (i64, String)> {
    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or((INVALID_PARAMS, "params.name is required".to_string()))?;
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    let envelope = match parse_call(name, arguments) {
        Ok(request) => facade.invoke(request).await,
        Err(err) => facade.rejected(name, &err),
    };
    Ok(tool_result(&envelope))
}
