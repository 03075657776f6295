//! The operation facade and the tool catalogue served over the transport.
//!
//! Re-exports:
//! - [`OperationFacade`]: validates, runs and normalizes one request.
//! - [`parse_call`], [`descriptors`]: decoding and listing of tool calls.

pub mod facade;
#[cfg(test)]
pub mod tests;
pub mod tool_registry;

pub use facade::OperationFacade;
pub use tool_registry::{descriptors, parse_call, ToolDescriptor};
