//! Static catalogue of the exposed tools and decoding of tool-call arguments.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::command_building::ToolRequest;
use crate::error_handling::types::ToolError;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn file_path_schema() -> Value {
    json!({ "type": "string", "description": "Path to a pcap/pcapng capture file" })
}

fn max_packets_schema(default: i64) -> Value {
    json!({
        "type": "integer",
        "default": default,
        "description": "Maximum number of packets to return"
    })
}

/// Descriptors for every tool, in registration order.
pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "list_interfaces",
            description: "List the network interfaces available for live capture",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDescriptor {
            name: "capture_live",
            description: "Capture live traffic on an interface for a bounded duration",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "interface": { "type": "string", "description": "Interface name, e.g. eth0" },
                    "duration": { "type": "integer", "default": 10, "minimum": 1, "description": "Capture duration in seconds" },
                    "filter": { "type": "string", "default": "", "description": "Capture (BPF) filter" },
                    "max_packets": max_packets_schema(100)
                },
                "required": ["interface"]
            }),
        },
        ToolDescriptor {
            name: "analyze_pcap",
            description: "Decode the packets of a capture file, optionally filtered",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": file_path_schema(),
                    "filter": { "type": "string", "default": "", "description": "Display filter" },
                    "max_packets": max_packets_schema(100)
                },
                "required": ["file_path"]
            }),
        },
        ToolDescriptor {
            name: "get_protocols",
            description: "List the display-filter names of every supported protocol",
            input_schema: json!({ "type": "object", "properties": {} }),
        },
        ToolDescriptor {
            name: "get_packet_statistics",
            description: "I/O, conversation and endpoint statistics for a capture file",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": file_path_schema(),
                    "filter": { "type": "string", "default": "", "description": "Display filter" }
                },
                "required": ["file_path"]
            }),
        },
        ToolDescriptor {
            name: "extract_fields",
            description: "Extract named fields from a capture file and rank their values",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": file_path_schema(),
                    "fields": {
                        "type": "array",
                        "items": { "type": "string" },
                        "minItems": 1,
                        "description": "Field names such as ip.src or tcp.port"
                    },
                    "filter": { "type": "string", "default": "", "description": "Display filter" },
                    "max_packets": {
                        "type": "integer",
                        "default": 5000,
                        "description": "Maximum packets to read; 0 reads the whole file"
                    }
                },
                "required": ["file_path", "fields"]
            }),
        },
        ToolDescriptor {
            name: "analyze_protocols",
            description: "Decode only the packets of one protocol",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": file_path_schema(),
                    "protocol": { "type": "string", "default": "", "description": "Protocol name, e.g. http or dns" },
                    "max_packets": max_packets_schema(100)
                },
                "required": ["file_path"]
            }),
        },
        ToolDescriptor {
            name: "analyze_errors",
            description: "Find malformed packets and TCP anomalies in a capture file",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": file_path_schema(),
                    "error_type": {
                        "type": "string",
                        "default": "all",
                        "enum": ["all", "malformed", "tcp", "retransmission", "duplicate_ack", "lost_segment"]
                    },
                    "max_packets": max_packets_schema(5000)
                },
                "required": ["file_path"]
            }),
        },
    ]
}

pub fn find(name: &str) -> Option<ToolDescriptor> {
    descriptors().into_iter().find(|d| d.name == name)
}

fn decode<T: DeserializeOwned>(name: &str, arguments: Value) -> Result<T, ToolError> {
    // a call without arguments behaves like one with an empty object
    let arguments = match arguments {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidRequest(format!("invalid arguments for {}: {}", name, e)))
}

/// Decodes a tool call into a typed request, applying argument defaults.
pub fn parse_call(name: &str, arguments: Value) -> Result<ToolRequest, ToolError> {
    let request = match name {
        "list_interfaces" => ToolRequest::ListInterfaces,
        "get_protocols" => ToolRequest::GetProtocols,
        "capture_live" => ToolRequest::CaptureLive(decode(name, arguments)?),
        "analyze_pcap" => ToolRequest::AnalyzePcap(decode(name, arguments)?),
        "get_packet_statistics" => ToolRequest::PacketStatistics(decode(name, arguments)?),
        "extract_fields" => ToolRequest::ExtractFields(decode(name, arguments)?),
        "analyze_protocols" => ToolRequest::AnalyzeProtocols(decode(name, arguments)?),
        "analyze_errors" => ToolRequest::AnalyzeErrors(decode(name, arguments)?),
        other => {
            return Err(ToolError::InvalidRequest(format!("unknown tool: {}", other)));
        }
    };
    Ok(request)
}
