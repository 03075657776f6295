use log::debug;
use serde_json::{json, Map, Value};

use super::envelope::{Metadata, PacketStatistics, ResultEnvelope};
use crate::command_building::types::OutputMode;
use crate::error_handling::types::ToolError;

/// Characters of raw output kept in a `malformed_output` error.
pub const RAW_SAMPLE_CHARS: usize = 200;

/// Shape of tshark's standard output, decided once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputShape {
    /// Nothing but whitespace was printed.
    Empty,
    StructuredArray(Vec<Value>),
    StructuredObject(Map<String, Value>),
    /// Trimmed, non-empty lines in output order.
    PlainLines(Vec<String>),
}

impl OutputShape {
    /// Classifies raw stdout.
    ///
    /// Field rows are always lines: a field value may itself start with `[`.
    /// Otherwise output whose first non-blank character is `[` or `{` must
    /// parse as JSON.
    pub fn from_stdout(stdout: &str, mode: OutputMode) -> Result<Self, ToolError> {
        if mode == OutputMode::Fields {
            return Ok(OutputShape::PlainLines(split_lines(stdout)));
        }

        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(OutputShape::Empty);
        }

        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Array(items)) => Ok(OutputShape::StructuredArray(items)),
                Ok(Value::Object(object)) => Ok(OutputShape::StructuredObject(object)),
                Ok(other) => Err(ToolError::MalformedOutput {
                    reason: format!("unexpected JSON value: {}", other),
                    raw_sample: raw_sample(stdout),
                }),
                Err(e) => Err(ToolError::MalformedOutput {
                    reason: e.to_string(),
                    raw_sample: raw_sample(stdout),
                }),
            };
        }

        Ok(OutputShape::PlainLines(split_lines(stdout)))
    }
}

pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// First [`RAW_SAMPLE_CHARS`] characters, with `...` appended when cut.
pub fn raw_sample(raw: &str) -> String {
    let mut chars = raw.chars();
    let head: String = chars.by_ref().take(RAW_SAMPLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

pub fn possible_reasons() -> Value {
    json!({
        "possible_reasons": [
            "the filter may be too restrictive",
            "the capture may not contain the requested protocol",
            "the source file may be empty"
        ]
    })
}

/// Wraps a classified output into an envelope.
///
/// Packet arrays are truncated to `metadata.max_packets`; an empty array is
/// reported as `no_data` like empty output.
pub fn normalize(shape: OutputShape, metadata: Metadata) -> ResultEnvelope {
    match shape {
        OutputShape::Empty => {
            ResultEnvelope::no_data(metadata, "no matching packets found", possible_reasons())
        }
        OutputShape::StructuredArray(packets) if packets.is_empty() => {
            ResultEnvelope::no_data(metadata, "no matching packets found", possible_reasons())
        }
        OutputShape::StructuredArray(mut packets) => {
            let bound = usize::try_from(metadata.max_packets).unwrap_or(usize::MAX);
            let statistics = PacketStatistics::compute(packets.len(), bound);
            if statistics.truncated {
                debug!(
                    "Truncating {} packets to {}",
                    statistics.total_packets, statistics.returned_packets
                );
                packets.truncate(bound);
            }
            ResultEnvelope::packets(metadata, statistics, packets)
        }
        OutputShape::StructuredObject(object) => {
            ResultEnvelope::success(metadata, Value::Object(object))
        }
        OutputShape::PlainLines(lines) => ResultEnvelope::success(
            metadata,
            Value::Array(lines.into_iter().map(Value::String).collect()),
        ),
    }
}
