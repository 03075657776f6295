//! Post-processing applied after normalization, per operation kind.
//!
//! - `field_statistics`: frequency ranking of extracted field rows.
//! - `error_classifier`: error categories, their display filters, and the
//!   annotation of error-analysis results.

pub mod error_classifier;
pub mod field_statistics;

pub use error_classifier::{annotate, ErrorCategory, ResolvedCategory};
pub use field_statistics::field_envelope;
