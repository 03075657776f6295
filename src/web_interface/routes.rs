use log::{debug, warn};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::{StatusCode, Uri};
use warp::{reply, Filter, Rejection, Reply};

use super::rpc;
use super::types::{ApiError, StatusInfo};
use crate::error_handling::types::ToolError;
use crate::operations::tool_registry::{descriptors, find, parse_call};
use crate::operations::OperationFacade;
use crate::process_execution::ToolRunner;

/// Largest request body accepted on the JSON endpoints.
pub const MAX_BODY_BYTES: u64 = 256 * 1024;

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders the HTML status page.
pub fn status_page(info: &StatusInfo) -> String {
    let timeout = match info.command_timeout_secs {
        0 => "none".to_string(),
        secs => format!("{}s", secs),
    };
    let tools: String = descriptors()
        .iter()
        .map(|d| {
            format!(
                "<li><code>{}</code> &mdash; {}</li>",
                d.name,
                escape_html(d.description)
            )
        })
        .collect();

    format!(
        r#"<html><head><title>Sharkline Status</title></head>
<body><h1>Sharkline is running</h1>
<table>
<tr><th>tshark</th><td>{}</td></tr>
<tr><th>version</th><td>{}</td></tr>
<tr><th>listening on</th><td>{}</td></tr>
<tr><th>command timeout</th><td>{}</td></tr>
<tr><th>capture grace</th><td>{}s</td></tr>
<tr><th>started</th><td>{}</td></tr>
</table>
<h2>Tools</h2><ul>{}</ul>
<p>JSON-RPC on <code>POST /mcp</code>, descriptors on <code>GET /tools</code>.</p>
</body></html>"#,
        escape_html(&info.tshark_path.display().to_string()),
        escape_html(&info.tool_version),
        info.listen_addr,
        timeout,
        info.capture_grace_secs,
        info.started_at.to_rfc3339(),
        tools
    )
}

/// GET /status
pub fn status_route(
    info: Arc<StatusInfo>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || reply::html(status_page(&info)))
}

/// GET / -> /status
pub fn root_route() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path::end()
        .and(warp::get())
        .map(|| warp::redirect::see_other(Uri::from_static("/status")))
}

/// GET /tools
pub fn list_tools_route() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("tools")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| reply::json(&descriptors()))
}

/// Runs a named tool with a JSON arguments object and answers with its
/// envelope. Unknown tools are 404, undecodable arguments 400.
pub async fn call_tool<R: ToolRunner>(
    facade: &OperationFacade<R>,
    name: &str,
    arguments: Value,
) -> reply::Response {
    if find(name).is_none() {
        let err = ToolError::InvalidRequest(format!("unknown tool: {}", name));
        return reply::with_status(
            reply::json(&facade.rejected(name, &err)),
            StatusCode::NOT_FOUND,
        )
        .into_response();
    }

    match parse_call(name, arguments) {
        Ok(request) => reply::json(&facade.invoke(request).await).into_response(),
        Err(err) => reply::with_status(
            reply::json(&facade.rejected(name, &err)),
            StatusCode::BAD_REQUEST,
        )
        .into_response(),
    }
}

/// POST /tools/:name
pub fn call_tool_route<R: ToolRunner + 'static>(
    facade: Arc<OperationFacade<R>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("tools" / String)
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<Value>())
        .and_then(move |name: String, arguments: Value| {
            let facade = facade.clone();
            async move { Ok::<_, Rejection>(call_tool(facade.as_ref(), &name, arguments).await) }
        })
}

/// POST /mcp
pub fn mcp_route<R: ToolRunner + 'static>(
    facade: Arc<OperationFacade<R>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("mcp")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<Value>())
        .and_then(move |message: Value| {
            let facade = facade.clone();
            async move {
                let res = match rpc::dispatch(facade.as_ref(), message).await {
                    Some(response) => reply::json(&response).into_response(),
                    None => reply::with_status(reply::reply(), StatusCode::ACCEPTED).into_response(),
                };
                Ok::<_, Rejection>(res)
            }
        })
}

/// Turns rejections into JSON bodies. Undecodable JSON is answered with a
/// JSON-RPC parse error so `/mcp` clients can read it.
pub async fn handle_rejection(err: Rejection) -> Result<reply::Response, Infallible> {
    if err.is_not_found() {
        return Ok(reply::with_status(
            reply::json(&ApiError {
                message: "Not found".to_string(),
            }),
            StatusCode::NOT_FOUND,
        )
        .into_response());
    }

    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        debug!("Rejected request body: {}", e);
        return Ok(reply::with_status(
            reply::json(&rpc::error_response(
                Value::Null,
                rpc::PARSE_ERROR,
                &format!("parse error: {}", e),
            )),
            StatusCode::BAD_REQUEST,
        )
        .into_response());
    }

    warn!("Unhandled rejection: {:?}", err);
    Ok(reply::with_status(
        reply::json(&ApiError {
            message: format!("Bad request: {:?}", err),
        }),
        StatusCode::BAD_REQUEST,
    )
    .into_response())
}
