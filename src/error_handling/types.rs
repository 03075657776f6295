use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadIPFormatting(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadIPFormatting(e) => write!(f, "IP formatting error: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures of a single tool invocation.
///
/// Every variant is turned into an `error` envelope at the facade boundary,
/// so callers see [`ToolError::kind`] and [`ToolError::suggestions`] rather
/// than this type.
#[derive(Debug)]
pub enum ToolError {
    /// Malformed input, caught before any process is spawned.
    InvalidRequest(String),
    /// The external tool is missing or not executable.
    ToolUnavailable { program: PathBuf, reason: String },
    /// The capture file failed path validation.
    FileNotFound { path: PathBuf, reason: String },
    /// The tool exited with a nonzero status.
    ExecutionFailure { command: String, stderr: String },
    /// Output looked structured but did not parse.
    MalformedOutput { reason: String, raw_sample: String },
    /// The tool did not finish within its wall-clock limit and was killed.
    Timeout { command: String, limit: Duration },
}

impl ToolError {
    /// Stable identifier reported as `error.type`.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidRequest(_) => "invalid_request",
            ToolError::ToolUnavailable { .. } => "tool_unavailable",
            ToolError::FileNotFound { .. } => "file_not_found",
            ToolError::ExecutionFailure { .. } => "execution_failure",
            ToolError::MalformedOutput { .. } => "malformed_output",
            ToolError::Timeout { .. } => "timeout",
        }
    }

    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            ToolError::InvalidRequest(_) => vec!["check the operation arguments"],
            ToolError::ToolUnavailable { .. } => vec![
                "install tshark or point --tshark-path at the executable",
                "verify the executable permissions",
            ],
            ToolError::FileNotFound { .. } => vec![
                "check that the file path is correct",
                "confirm that the file exists",
                "verify the file access permissions",
            ],
            ToolError::ExecutionFailure { .. } => {
                vec!["verify the path is correct and readable"]
            }
            ToolError::MalformedOutput { .. } => vec!["retry with a narrower filter"],
            ToolError::Timeout { .. } => vec![
                "narrow the display filter",
                "lower max_packets",
                "raise command_timeout_secs",
            ],
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            ToolError::ToolUnavailable { program, reason } => {
                write!(f, "Tool {} unavailable: {}", program.display(), reason)
            }
            ToolError::FileNotFound { path, reason } => {
                write!(f, "File not found: {} ({})", path.display(), reason)
            }
            ToolError::ExecutionFailure { stderr, .. } => {
                write!(f, "tshark command failed: {}", stderr)
            }
            ToolError::MalformedOutput { reason, .. } => {
                write!(f, "Malformed tool output: {}", reason)
            }
            ToolError::Timeout { limit, .. } => {
                write!(f, "tshark did not finish within {}s", limit.as_secs())
            }
        }
    }
}

impl std::error::Error for ToolError {}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    ToolError(ToolError),
    WebError(WebError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::ToolError(e) => write!(f, "Tool error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<ToolError> for ControllerError {
    fn from(err: ToolError) -> Self {
        ControllerError::ToolError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}
