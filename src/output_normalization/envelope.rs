//! The uniform result shape returned by every tool operation.
//!
//! An envelope is assembled once by one of the constructors below and then
//! only moved; [`ResultEnvelope::with_classification`] consumes the value it
//! extends.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::error_handling::types::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NoData,
    Error,
}

/// Request fields echoed into the metadata block for traceability.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub timestamp: DateTime<Utc>,
    pub tool_version: String,
    pub operation: String,
    /// Effective bound; `0` only for an unbounded field extraction.
    pub max_packets: u64,
    #[serde(flatten)]
    pub context: RequestContext,
}

impl Metadata {
    pub fn new(
        operation: &str,
        tool_version: &str,
        max_packets: u64,
        context: RequestContext,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            tool_version: tool_version.to_string(),
            operation: operation.to_string(),
            max_packets,
            context,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketStatistics {
    pub total_packets: usize,
    pub returned_packets: usize,
    pub truncated: bool,
}

impl PacketStatistics {
    pub fn compute(total_packets: usize, max_packets: usize) -> Self {
        Self {
            total_packets,
            returned_packets: total_packets.min(max_packets),
            truncated: total_packets > max_packets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopValue {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
    /// `"count/total"`.
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldStatistics {
    pub total_values: usize,
    pub unique_values: usize,
    pub top_values: Vec<TopValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub most_common: String,
    pub most_common_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Statistics {
    Packets(PacketStatistics),
    Fields(FieldStatistics),
}

/// Annotation attached to error-analysis results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorClassification {
    pub total_error_packets: usize,
    pub error_type: String,
    pub filter_expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

impl From<&ToolError> for ErrorBody {
    fn from(err: &ToolError) -> Self {
        let (command, raw_data) = match err {
            ToolError::ExecutionFailure { command, .. } | ToolError::Timeout { command, .. } => {
                (Some(command.clone()), None)
            }
            ToolError::MalformedOutput { raw_sample, .. } => (None, Some(raw_sample.clone())),
            _ => (None, None),
        };
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            suggestions: err.suggestions().into_iter().map(String::from).collect(),
            command,
            raw_data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub status: Status,
    pub metadata: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<FieldSummary>,
    #[serde(flatten)]
    pub classification: Option<ErrorClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ResultEnvelope {
    fn bare(status: Status, metadata: Metadata) -> Self {
        Self {
            status,
            metadata,
            message: None,
            statistics: None,
            summary: None,
            classification: None,
            data: None,
            details: None,
            error: None,
        }
    }

    pub fn success(metadata: Metadata, data: Value) -> Self {
        Self {
            data: Some(data),
            ..Self::bare(Status::Success, metadata)
        }
    }

    pub fn packets(metadata: Metadata, statistics: PacketStatistics, packets: Vec<Value>) -> Self {
        Self {
            statistics: Some(Statistics::Packets(statistics)),
            data: Some(Value::Array(packets)),
            ..Self::bare(Status::Success, metadata)
        }
    }

    pub fn field_statistics(
        metadata: Metadata,
        statistics: FieldStatistics,
        summary: Option<FieldSummary>,
    ) -> Self {
        Self {
            statistics: Some(Statistics::Fields(statistics)),
            summary,
            ..Self::bare(Status::Success, metadata)
        }
    }

    pub fn no_data(metadata: Metadata, message: &str, details: Value) -> Self {
        Self {
            message: Some(message.to_string()),
            details: Some(details),
            ..Self::bare(Status::NoData, metadata)
        }
    }

    pub fn failure(metadata: Metadata, err: &ToolError) -> Self {
        Self {
            error: Some(ErrorBody::from(err)),
            ..Self::bare(Status::Error, metadata)
        }
    }

    pub fn with_classification(self, classification: ErrorClassification) -> Self {
        Self {
            classification: Some(classification),
            ..self
        }
    }

    pub fn packet_statistics(&self) -> Option<&PacketStatistics> {
        match &self.statistics {
            Some(Statistics::Packets(stats)) => Some(stats),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "status": "error",
                "error": { "type": "serialization", "message": e.to_string() }
            })
        })
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> Metadata {
        Metadata::new("analyze_pcap", "TShark (Wireshark) 4.2.2", 100, RequestContext::default())
    }

    #[test]
    fn packet_statistics_invariants() {
        let under = PacketStatistics::compute(3, 100);
        assert_eq!((under.returned_packets, under.truncated), (3, false));

        let exact = PacketStatistics::compute(100, 100);
        assert_eq!((exact.returned_packets, exact.truncated), (100, false));

        let over = PacketStatistics::compute(101, 100);
        assert_eq!((over.returned_packets, over.truncated), (100, true));
    }

    #[test]
    fn serializes_only_present_sections() {
        let value = ResultEnvelope::success(metadata(), json!(["a"])).to_value();
        assert_eq!(value["status"], "success");
        assert_eq!(value["metadata"]["max_packets"], 100);
        assert!(value["metadata"].get("file_path").is_none());
        assert!(value.get("statistics").is_none());
        assert!(value.get("error").is_none());
        assert!(value.get("error_type").is_none());
    }

    #[test]
    fn classification_is_flattened_to_top_level() {
        let envelope = ResultEnvelope::packets(metadata(), PacketStatistics::compute(2, 100), vec![])
            .with_classification(ErrorClassification {
                total_error_packets: 2,
                error_type: "retransmission".into(),
                filter_expression: "tcp.analysis.retransmission".into(),
            });
        let value = envelope.to_value();
        assert_eq!(value["error_type"], "retransmission");
        assert_eq!(value["filter_expression"], "tcp.analysis.retransmission");
        assert_eq!(value["total_error_packets"], 2);
        assert_eq!(value["statistics"]["total_packets"], 2);
    }

    #[test]
    fn failure_reports_kind_and_command() {
        let err = ToolError::ExecutionFailure {
            command: "tshark -r /tmp/x.pcap".into(),
            stderr: "bad file".into(),
        };
        let value = ResultEnvelope::failure(metadata(), &err).to_value();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["type"], "execution_failure");
        assert_eq!(value["error"]["command"], "tshark -r /tmp/x.pcap");
        assert!(value["error"]["message"].as_str().unwrap().contains("bad file"));
    }
}
