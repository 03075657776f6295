pub mod analysis;
pub mod command_building;
pub mod configuration;
pub mod controller;
pub mod error_handling;
pub mod operations;
pub mod output_normalization;
pub mod process_execution;
pub mod web_interface;

pub use command_building::ToolRequest;
pub use controller::Controller;
pub use operations::OperationFacade;
pub use output_normalization::{ResultEnvelope, Status};
