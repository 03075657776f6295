use chrono::Utc;
use log::{error, info};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use super::routes::{
    call_tool_route, handle_rejection, list_tools_route, mcp_route, root_route, status_route,
};
use super::types::StatusInfo;
use crate::configuration::Config;
use crate::error_handling::types::{ConfigError, WebError};
use crate::operations::OperationFacade;
use crate::process_execution::ToolRunner;

/// HTTP front end exposing the tools over JSON-RPC and plain JSON routes.
pub struct WebServer<R: ToolRunner + 'static> {
    facade: Arc<OperationFacade<R>>,
    addr: SocketAddr,
    status: Arc<StatusInfo>,
}

impl<R: ToolRunner + 'static> WebServer<R> {
    pub fn new(facade: Arc<OperationFacade<R>>, config: &Config) -> Result<Self, ConfigError> {
        let addr = config.socket_addr()?;
        let status = StatusInfo {
            tool_version: facade.tool_version().to_string(),
            tshark_path: facade.program().to_path_buf(),
            listen_addr: addr,
            command_timeout_secs: config.command_timeout_secs,
            capture_grace_secs: config.capture_grace_secs,
            started_at: Utc::now(),
        };
        Ok(Self {
            facade,
            addr,
            status: Arc::new(status),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serves until `shutdown` resolves.
    ///
    /// The address is probed first so a port already in use is reported as
    /// [`WebError::BindFailed`] instead of aborting inside the server task.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), WebError>
    where
        F: Future<Output = ()>,
    {
        std::net::TcpListener::bind(self.addr).map_err(|e| {
            error!("Cannot bind {}: {}", self.addr, e);
            WebError::BindFailed(format!("{}: {}", self.addr, e))
        })?;

        let cors = warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_headers(vec!["content-type", "accept"]);

        // Compose routes
        let routes = root_route()
            .or(status_route(self.status.clone()))
            .or(list_tools_route())
            .or(call_tool_route(self.facade.clone()))
            .or(mcp_route(self.facade.clone()))
            .recover(handle_rejection)
            .with(cors);

        info!("Listening on http://{}", self.addr);
        tokio::select! {
            _ = warp::serve(routes).run(self.addr) => {}
            _ = shutdown => info!("Shutdown requested, stopping web server"),
        }
        Ok(())
    }
}
