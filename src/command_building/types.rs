//! Typed requests for the eight tool operations.
//!
//! Request structs deserialize straight from tool-call arguments; omitted
//! arguments take the defaults documented on each field.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::output_normalization::envelope::RequestContext;

fn default_duration() -> i64 {
    10
}

fn default_packet_max() -> i64 {
    100
}

fn default_bulk_max() -> i64 {
    5000
}

fn default_error_type() -> String {
    "all".to_string()
}

/// Clamps a caller-supplied packet bound to the `>= 1` tshark requires.
pub fn clamp_packet_bound(requested: i64) -> u64 {
    requested.max(1) as u64
}

/// Returns `Some` only for a positive bound; zero or negative means unbounded.
pub fn optional_packet_bound(requested: i64) -> Option<u64> {
    (requested > 0).then_some(requested as u64)
}

/// Treats `None`, `""` and whitespace-only filters alike.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Live capture on a network interface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptureRequest {
    pub interface: String,
    /// Capture duration in whole seconds, default 10.
    #[serde(default = "default_duration")]
    pub duration: i64,
    /// Capture (BPF) filter.
    #[serde(default)]
    pub filter: Option<String>,
    /// Default 100, clamped to at least 1.
    #[serde(default = "default_packet_max")]
    pub max_packets: i64,
}

impl CaptureRequest {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            duration: default_duration(),
            filter: None,
            max_packets: default_packet_max(),
        }
    }
}

/// Plain analysis of a capture file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileAnalysisRequest {
    pub file_path: PathBuf,
    /// Display filter.
    #[serde(default)]
    pub filter: Option<String>,
    /// Default 100, clamped to at least 1.
    #[serde(default = "default_packet_max")]
    pub max_packets: i64,
}

impl FileAnalysisRequest {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            filter: None,
            max_packets: default_packet_max(),
        }
    }
}

/// Analysis restricted to one protocol, whose name doubles as display filter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProtocolAnalysisRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default = "default_packet_max")]
    pub max_packets: i64,
}

impl ProtocolAnalysisRequest {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            protocol: None,
            max_packets: default_packet_max(),
        }
    }
}

/// Analysis restricted to packets flagged with a class of errors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorAnalysisRequest {
    pub file_path: PathBuf,
    /// Category name; unknown names resolve to `all`.
    #[serde(default = "default_error_type")]
    pub error_type: String,
    #[serde(default = "default_bulk_max")]
    pub max_packets: i64,
}

impl ErrorAnalysisRequest {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            error_type: default_error_type(),
            max_packets: default_bulk_max(),
        }
    }
}

/// Extraction of named fields as flat rows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldExtractionRequest {
    pub file_path: PathBuf,
    pub fields: Vec<String>,
    #[serde(default)]
    pub filter: Option<String>,
    /// Default 5000; zero or negative disables the limit.
    #[serde(default = "default_bulk_max")]
    pub max_packets: i64,
}

impl FieldExtractionRequest {
    pub fn new(file_path: impl Into<PathBuf>, fields: Vec<String>) -> Self {
        Self {
            file_path: file_path.into(),
            fields,
            filter: None,
            max_packets: default_bulk_max(),
        }
    }
}

/// I/O-rate, conversation and endpoint reports for a capture file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatisticsRequest {
    pub file_path: PathBuf,
    #[serde(default)]
    pub filter: Option<String>,
}

impl StatisticsRequest {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            filter: None,
        }
    }
}

/// How tshark is asked to format its standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `-T json`: a packet array.
    Json,
    /// `-T fields`: one tab-separated row per packet.
    Fields,
    /// Listings and `-z` reports.
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    ListInterfaces,
    CaptureLive(CaptureRequest),
    AnalyzePcap(FileAnalysisRequest),
    GetProtocols,
    PacketStatistics(StatisticsRequest),
    ExtractFields(FieldExtractionRequest),
    AnalyzeProtocols(ProtocolAnalysisRequest),
    AnalyzeErrors(ErrorAnalysisRequest),
}

impl ToolRequest {
    /// Name under which the operation is registered as a tool.
    pub fn operation_name(&self) -> &'static str {
        match self {
            ToolRequest::ListInterfaces => "list_interfaces",
            ToolRequest::CaptureLive(_) => "capture_live",
            ToolRequest::AnalyzePcap(_) => "analyze_pcap",
            ToolRequest::GetProtocols => "get_protocols",
            ToolRequest::PacketStatistics(_) => "get_packet_statistics",
            ToolRequest::ExtractFields(_) => "extract_fields",
            ToolRequest::AnalyzeProtocols(_) => "analyze_protocols",
            ToolRequest::AnalyzeErrors(_) => "analyze_errors",
        }
    }

    /// Capture file the operation reads, if any.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            ToolRequest::AnalyzePcap(r) => Some(&r.file_path),
            ToolRequest::PacketStatistics(r) => Some(&r.file_path),
            ToolRequest::ExtractFields(r) => Some(&r.file_path),
            ToolRequest::AnalyzeProtocols(r) => Some(&r.file_path),
            ToolRequest::AnalyzeErrors(r) => Some(&r.file_path),
            ToolRequest::ListInterfaces | ToolRequest::CaptureLive(_) | ToolRequest::GetProtocols => {
                None
            }
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        match self {
            ToolRequest::CaptureLive(_)
            | ToolRequest::AnalyzePcap(_)
            | ToolRequest::AnalyzeProtocols(_)
            | ToolRequest::AnalyzeErrors(_) => OutputMode::Json,
            ToolRequest::ExtractFields(_) => OutputMode::Fields,
            ToolRequest::ListInterfaces
            | ToolRequest::GetProtocols
            | ToolRequest::PacketStatistics(_) => OutputMode::Text,
        }
    }

    /// Effective packet bound: clamped for packet-array operations, `0` for
    /// an unbounded field extraction, `listing_default` for the rest.
    pub fn max_packets(&self, listing_default: u64) -> u64 {
        match self {
            ToolRequest::CaptureLive(r) => clamp_packet_bound(r.max_packets),
            ToolRequest::AnalyzePcap(r) => clamp_packet_bound(r.max_packets),
            ToolRequest::AnalyzeProtocols(r) => clamp_packet_bound(r.max_packets),
            ToolRequest::AnalyzeErrors(r) => clamp_packet_bound(r.max_packets),
            ToolRequest::ExtractFields(r) => optional_packet_bound(r.max_packets).unwrap_or(0),
            ToolRequest::ListInterfaces
            | ToolRequest::GetProtocols
            | ToolRequest::PacketStatistics(_) => listing_default,
        }
    }

    /// Request fields echoed back in the envelope metadata.
    pub fn context(&self) -> RequestContext {
        let mut context = RequestContext::default();
        match self {
            ToolRequest::ListInterfaces | ToolRequest::GetProtocols => {}
            ToolRequest::CaptureLive(r) => {
                context.interface = Some(r.interface.clone());
                context.filter = non_blank(&r.filter).map(str::to_string);
            }
            ToolRequest::AnalyzePcap(r) => {
                context.file_path = Some(r.file_path.clone());
                context.filter = non_blank(&r.filter).map(str::to_string);
            }
            ToolRequest::PacketStatistics(r) => {
                context.file_path = Some(r.file_path.clone());
                context.filter = non_blank(&r.filter).map(str::to_string);
            }
            ToolRequest::ExtractFields(r) => {
                context.file_path = Some(r.file_path.clone());
                context.fields = Some(r.fields.clone());
                context.filter = non_blank(&r.filter).map(str::to_string);
            }
            ToolRequest::AnalyzeProtocols(r) => {
                context.file_path = Some(r.file_path.clone());
                context.protocol = Some(
                    non_blank(&r.protocol)
                        .map(str::to_lowercase)
                        .unwrap_or_else(|| "all".to_string()),
                );
            }
            ToolRequest::AnalyzeErrors(r) => {
                context.file_path = Some(r.file_path.clone());
            }
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_bounds_clamp_and_unbound() {
        assert_eq!(clamp_packet_bound(0), 1);
        assert_eq!(clamp_packet_bound(-20), 1);
        assert_eq!(clamp_packet_bound(250), 250);
        assert_eq!(optional_packet_bound(0), None);
        assert_eq!(optional_packet_bound(-1), None);
        assert_eq!(optional_packet_bound(7), Some(7));
    }

    #[test]
    fn deserializes_with_defaults() {
        let capture: CaptureRequest =
            serde_json::from_value(serde_json::json!({ "interface": "eth0" })).unwrap();
        assert_eq!(capture, CaptureRequest::new("eth0"));

        let errors: ErrorAnalysisRequest =
            serde_json::from_value(serde_json::json!({ "file_path": "/tmp/a.pcap" })).unwrap();
        assert_eq!(errors.error_type, "all");
        assert_eq!(errors.max_packets, 5000);

        let fields: FieldExtractionRequest = serde_json::from_value(serde_json::json!({
            "file_path": "/tmp/a.pcap",
            "fields": ["ip.src", "ip.dst"],
            "filter": ""
        }))
        .unwrap();
        assert_eq!(fields.max_packets, 5000);
        assert_eq!(non_blank(&fields.filter), None);
    }

    #[test]
    fn effective_bounds_per_operation() {
        let mut fields = FieldExtractionRequest::new("/tmp/a.pcap", vec!["ip.src".into()]);
        fields.max_packets = 0;
        assert_eq!(ToolRequest::ExtractFields(fields).max_packets(5000), 0);

        let mut analyze = FileAnalysisRequest::new("/tmp/a.pcap");
        analyze.max_packets = -3;
        assert_eq!(ToolRequest::AnalyzePcap(analyze).max_packets(5000), 1);

        assert_eq!(ToolRequest::GetProtocols.max_packets(5000), 5000);
    }

    #[test]
    fn protocol_context_defaults_to_all() {
        let request = ToolRequest::AnalyzeProtocols(ProtocolAnalysisRequest::new("/tmp/a.pcap"));
        assert_eq!(request.context().protocol.as_deref(), Some("all"));
        assert_eq!(request.output_mode(), OutputMode::Json);
    }
}
