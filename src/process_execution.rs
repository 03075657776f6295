//! Spawning the external capture tool.
//!
//! Arguments always travel as a vector straight to `execve`; no shell is
//! involved, so filters and paths containing metacharacters stay literal.
//!
//! Re-exports:
//! - [`ProcessExecutor`]: runs the configured tshark binary.
//! - [`ToolRunner`]: the seam the operation facade is generic over.
//! - [`RawToolOutput`]: captured stdout/stderr of a finished run.

pub mod process_executor;
pub mod types;

pub use process_executor::{display_command, ProcessExecutor, ToolRunner};
pub use types::RawToolOutput;
