//! Translation of typed tool requests into tshark argument vectors.
//!
//! Nothing in this module performs I/O. Arguments are produced as discrete
//! tokens and handed to the executor unchanged, so filters, paths and field
//! names are never seen by a shell.

pub mod command_builder;
pub mod types;

pub use command_builder::{build_command, ToolCommand};
pub use types::{
    CaptureRequest, ErrorAnalysisRequest, FieldExtractionRequest, FileAnalysisRequest,
    OutputMode, ProtocolAnalysisRequest, StatisticsRequest, ToolRequest,
};
