use log::{error, info};
use std::future::Future;
use std::sync::Arc;

use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::operations::OperationFacade;
use crate::process_execution::ProcessExecutor;
use crate::web_interface::WebServer;

/// Owns everything a running server needs. Built once in `main`, run until
/// a termination signal, then torn down with [`Controller::shutdown`].
pub struct Controller {
    config: Config,
    facade: Arc<OperationFacade<ProcessExecutor>>,
}

impl Controller {
    /// Probes the configured tshark binary; an unusable binary is fatal.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Creating controller");
        let facade = OperationFacade::connect(&config).await.map_err(|e| {
            error!("tshark is not usable: {}", e);
            ControllerError::ToolError(e)
        })?;
        Ok(Self {
            config,
            facade: Arc::new(facade),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tool_version(&self) -> &str {
        self.facade.tool_version()
    }

    /// Serves until Ctrl-C or SIGTERM.
    pub async fn run(&self) -> Result<(), ControllerError> {
        self.serve_until(shutdown_signal()).await
    }

    pub async fn serve_until<F>(&self, shutdown: F) -> Result<(), ControllerError>
    where
        F: Future<Output = ()>,
    {
        let server = WebServer::new(self.facade.clone(), &self.config)?;
        info!(
            "Serving {} tool(s) for {} on {}",
            crate::operations::descriptors().len(),
            self.tool_version(),
            server.addr()
        );
        server.run_until(shutdown).await?;
        Ok(())
    }

    pub fn shutdown(self) {
        info!(
            "Controller shut down ({} handle(s) to the tool facade released)",
            Arc::strong_count(&self.facade)
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
