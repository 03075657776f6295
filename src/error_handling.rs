//! Error types shared by the pipeline, the configuration layer and the server.

pub mod types;

pub use types::{ConfigError, ControllerError, ToolError, WebError};
