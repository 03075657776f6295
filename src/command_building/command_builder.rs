use super::types::*;
use crate::analysis::error_classifier::{ErrorCategory, ResolvedCategory};
use crate::error_handling::types::ToolError;

/// `-z` report specifiers used by the statistics operation.
pub const STATISTICS_REPORTS: [&str; 3] = ["io,stat,1", "conv,ip", "endpoints,ip"];

/// A validated tshark invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Arguments after the program name.
    pub args: Vec<String>,
    /// Error category the display filter was built from, for `analyze_errors`.
    pub category: Option<ResolvedCategory>,
}

/// Builds the tshark invocation for `request`.
///
/// Validation happens here, so an `InvalidRequest` is always reported before
/// a process exists. An `analyze_errors` category is resolved exactly once,
/// here, and carried on the result for post-processing.
pub fn build_command(request: &ToolRequest) -> Result<ToolCommand, ToolError> {
    let mut category = None;
    let args = match request {
        ToolRequest::ListInterfaces => vec!["-D".to_string()],
        ToolRequest::GetProtocols => vec!["-G".to_string(), "protocols".to_string()],
        ToolRequest::CaptureLive(r) => capture_args(r)?,
        ToolRequest::AnalyzePcap(r) => {
            file_json_args(&r.file_path, r.max_packets, non_blank(&r.filter))?
        }
        ToolRequest::AnalyzeProtocols(r) => {
            let protocol = non_blank(&r.protocol).map(str::to_lowercase);
            file_json_args(&r.file_path, r.max_packets, protocol.as_deref())?
        }
        ToolRequest::AnalyzeErrors(r) => {
            let resolved = ErrorCategory::resolve(&r.error_type);
            category = Some(resolved);
            file_json_args(
                &r.file_path,
                r.max_packets,
                Some(resolved.category.filter_expression()),
            )?
        }
        ToolRequest::ExtractFields(r) => field_args(r)?,
        ToolRequest::PacketStatistics(r) => statistics_args(r)?,
    };
    Ok(ToolCommand { args, category })
}

fn require_path(path: &std::path::Path) -> Result<String, ToolError> {
    let display = path.to_string_lossy();
    if display.trim().is_empty() {
        return Err(ToolError::InvalidRequest("file_path must not be empty".into()));
    }
    Ok(display.into_owned())
}

fn capture_args(request: &CaptureRequest) -> Result<Vec<String>, ToolError> {
    let interface = request.interface.trim();
    if interface.is_empty() {
        return Err(ToolError::InvalidRequest("interface must not be empty".into()));
    }
    if request.duration < 1 {
        return Err(ToolError::InvalidRequest(format!(
            "duration must be at least 1 second, got {}",
            request.duration
        )));
    }

    let mut args = vec![
        "-i".to_string(),
        interface.to_string(),
        "-a".to_string(),
        format!("duration:{}", request.duration),
        "-T".to_string(),
        "json".to_string(),
        "-c".to_string(),
        clamp_packet_bound(request.max_packets).to_string(),
    ];
    if let Some(filter) = non_blank(&request.filter) {
        args.push("-f".to_string());
        args.push(filter.to_string());
    }
    Ok(args)
}

fn file_json_args(
    path: &std::path::Path,
    max_packets: i64,
    display_filter: Option<&str>,
) -> Result<Vec<String>, ToolError> {
    let mut args = vec![
        "-r".to_string(),
        require_path(path)?,
        "-T".to_string(),
        "json".to_string(),
        "-c".to_string(),
        clamp_packet_bound(max_packets).to_string(),
    ];
    if let Some(filter) = display_filter {
        args.push("-Y".to_string());
        args.push(filter.to_string());
    }
    Ok(args)
}

fn field_args(request: &FieldExtractionRequest) -> Result<Vec<String>, ToolError> {
    if request.fields.is_empty() {
        return Err(ToolError::InvalidRequest("fields must not be empty".into()));
    }
    if let Some(position) = request.fields.iter().position(|f| f.trim().is_empty()) {
        return Err(ToolError::InvalidRequest(format!(
            "field #{} is blank",
            position + 1
        )));
    }

    let mut args = vec![
        "-r".to_string(),
        require_path(&request.file_path)?,
        "-T".to_string(),
        "fields".to_string(),
    ];
    for field in &request.fields {
        args.push("-e".to_string());
        args.push(field.trim().to_string());
    }
    if let Some(filter) = non_blank(&request.filter) {
        args.push("-Y".to_string());
        args.push(filter.to_string());
    }
    if let Some(limit) = optional_packet_bound(request.max_packets) {
        args.push("-c".to_string());
        args.push(limit.to_string());
    }
    Ok(args)
}

fn statistics_args(request: &StatisticsRequest) -> Result<Vec<String>, ToolError> {
    let mut args = vec![
        "-r".to_string(),
        require_path(&request.file_path)?,
        "-q".to_string(),
    ];
    for report in STATISTICS_REPORTS {
        args.push("-z".to_string());
        args.push(report.to_string());
    }
    if let Some(filter) = non_blank(&request.filter) {
        args.push("-Y".to_string());
        args.push(filter.to_string());
    }
    Ok(args)
}
