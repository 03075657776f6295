use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

/// Server facts rendered on the status page.
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub tool_version: String,
    pub tshark_path: PathBuf,
    pub listen_addr: SocketAddr,
    /// `0` when file operations run without a wall-clock limit.
    pub command_timeout_secs: u64,
    pub capture_grace_secs: u64,
    pub started_at: DateTime<Utc>,
}
