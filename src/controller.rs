//! Process-level ownership of the tool facade and the web server.

pub mod controller_handler;

pub use controller_handler::Controller;
