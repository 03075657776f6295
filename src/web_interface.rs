// Web Interface module root
pub mod routes;
pub mod rpc;
pub mod types;
pub mod web_server;

// Re-export commonly used items
pub use types::StatusInfo;
pub use web_server::WebServer;
