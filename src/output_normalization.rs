//! Output normalization subsystem.
//!
//! Turns the raw standard output of one tshark run into a
//! [`ResultEnvelope`]:
//! - `envelope`: the envelope and its sections.
//! - `normalizer`: output-shape classification and packet-array truncation.
//! - `listings`: parsers for interface and protocol listings.

pub mod envelope;
pub mod listings;
pub mod normalizer;

pub use envelope::{Metadata, RequestContext, ResultEnvelope, Status};
pub use normalizer::{normalize, OutputShape};
