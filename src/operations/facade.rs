use log::{debug, info, warn};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::analysis::error_classifier::{annotate, ResolvedCategory};
use crate::analysis::field_statistics::field_envelope;
use crate::command_building::{
    build_command, CaptureRequest, ErrorAnalysisRequest, FieldExtractionRequest,
    FileAnalysisRequest, ProtocolAnalysisRequest, StatisticsRequest, ToolRequest,
};
use crate::configuration::Config;
use crate::error_handling::types::ToolError;
use crate::output_normalization::envelope::{Metadata, RequestContext, ResultEnvelope};
use crate::output_normalization::listings::{parse_interfaces, parse_protocols};
use crate::output_normalization::normalizer::{normalize, OutputShape};
use crate::process_execution::{ProcessExecutor, ToolRunner};

/// Entry point for the eight tool operations.
///
/// The facade holds only data fixed at construction (the runner, the probed
/// tool version and the limits from [`Config`]), so one instance is shared
/// by every concurrent caller. Each operation resolves to a
/// [`ResultEnvelope`]; failures are reported inside the envelope and never
/// as a Rust error.
pub struct OperationFacade<R: ToolRunner> {
    runner: R,
    tool_version: String,
    command_timeout: Option<Duration>,
    capture_grace: Duration,
    listing_max_packets: u64,
}

impl OperationFacade<ProcessExecutor> {
    /// Probes the configured tshark binary and builds a facade around it.
    ///
    /// Fails with [`ToolError::ToolUnavailable`] when the binary cannot be
    /// started.
    pub async fn connect(config: &Config) -> Result<Self, ToolError> {
        let executor = ProcessExecutor::new(&config.tshark_path);
        let version = executor.probe_version().await?;
        info!("Using {} ({})", config.tshark_path.display(), version);
        Ok(Self::with_runner(executor, version, config))
    }
}

impl<R: ToolRunner> OperationFacade<R> {
    pub fn with_runner(runner: R, tool_version: impl Into<String>, config: &Config) -> Self {
        Self {
            runner,
            tool_version: tool_version.into(),
            command_timeout: config.command_timeout(),
            capture_grace: config.capture_grace(),
            listing_max_packets: config.listing_max_packets,
        }
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn program(&self) -> &Path {
        self.runner.program()
    }

    pub async fn list_interfaces(&self) -> ResultEnvelope {
        self.invoke(ToolRequest::ListInterfaces).await
    }

    pub async fn capture_live(&self, request: CaptureRequest) -> ResultEnvelope {
        self.invoke(ToolRequest::CaptureLive(request)).await
    }

    pub async fn analyze_pcap(&self, request: FileAnalysisRequest) -> ResultEnvelope {
        self.invoke(ToolRequest::AnalyzePcap(request)).await
    }

    pub async fn get_protocols(&self) -> ResultEnvelope {
        self.invoke(ToolRequest::GetProtocols).await
    }

    pub async fn get_packet_statistics(&self, request: StatisticsRequest) -> ResultEnvelope {
        self.invoke(ToolRequest::PacketStatistics(request)).await
    }

    pub async fn extract_fields(&self, request: FieldExtractionRequest) -> ResultEnvelope {
        self.invoke(ToolRequest::ExtractFields(request)).await
    }

    pub async fn analyze_protocols(&self, request: ProtocolAnalysisRequest) -> ResultEnvelope {
        self.invoke(ToolRequest::AnalyzeProtocols(request)).await
    }

    pub async fn analyze_errors(&self, request: ErrorAnalysisRequest) -> ResultEnvelope {
        self.invoke(ToolRequest::AnalyzeErrors(request)).await
    }

    /// Error envelope for a call whose arguments never became a request.
    pub fn rejected(&self, operation: &str, err: &ToolError) -> ResultEnvelope {
        warn!("Rejected call to {}: {}", operation, err);
        let metadata = Metadata::new(
            operation,
            &self.tool_version,
            self.listing_max_packets,
            RequestContext::default(),
        );
        ResultEnvelope::failure(metadata, err)
    }

    /// Runs one request through validation, execution, normalization and
    /// post-processing.
    pub async fn invoke(&self, request: ToolRequest) -> ResultEnvelope {
        let invocation = Uuid::new_v4();
        let operation = request.operation_name();
        info!("[{}] {} started", invocation, operation);

        let metadata = Metadata::new(
            operation,
            &self.tool_version,
            request.max_packets(self.listing_max_packets),
            request.context(),
        );

        let envelope = match self.execute(invocation, &request, metadata.clone()).await {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!("[{}] {} failed: {}", invocation, operation, err);
                ResultEnvelope::failure(metadata, &err)
            }
        };

        info!(
            "[{}] {} finished with status {:?}",
            invocation, operation, envelope.status
        );
        envelope
    }

    async fn execute(
        &self,
        invocation: Uuid,
        request: &ToolRequest,
        metadata: Metadata,
    ) -> Result<ResultEnvelope, ToolError> {
        let command = build_command(request)?;
        if let Some(path) = request.file_path() {
            check_capture_file(path).await?;
        }

        let limit = self.limit_for(request);
        debug!(
            "[{}] {} argument(s), limit {:?}",
            invocation,
            command.args.len(),
            limit
        );
        let output = self.runner.run(&command.args, limit).await?;
        debug!(
            "[{}] tool exited with code {:?}",
            invocation, output.exit_code
        );
        if !output.stderr.trim().is_empty() {
            debug!("[{}] tool stderr: {}", invocation, output.stderr.trim());
        }

        let shape = OutputShape::from_stdout(&output.stdout, request.output_mode())?;
        post_process(invocation, request, command.category, shape, metadata)
    }

    /// Live captures are bounded by their own duration plus the grace
    /// period; everything else by the configured command timeout.
    fn limit_for(&self, request: &ToolRequest) -> Option<Duration> {
        match request {
            ToolRequest::CaptureLive(r) => {
                let secs = u64::try_from(r.duration.max(1)).unwrap_or(1);
                Some(Duration::from_secs(secs) + self.capture_grace)
            }
            _ => self.command_timeout,
        }
    }
}

/// Rejects capture paths that do not name a readable regular file.
async fn check_capture_file(path: &Path) -> Result<(), ToolError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ToolError::FileNotFound {
            path: path.to_path_buf(),
            reason: match e.kind() {
                std::io::ErrorKind::NotFound => "no such file".to_string(),
                _ => e.to_string(),
            },
        })?;

    if !metadata.is_file() {
        return Err(ToolError::InvalidRequest(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    tokio::fs::File::open(path)
        .await
        .map_err(|e| ToolError::FileNotFound {
            path: path.to_path_buf(),
            reason: format!("not readable: {}", e),
        })?;
    Ok(())
}

fn post_process(
    invocation: Uuid,
    request: &ToolRequest,
    category: Option<ResolvedCategory>,
    shape: OutputShape,
    metadata: Metadata,
) -> Result<ResultEnvelope, ToolError> {
    let envelope = match (request, category, shape) {
        (ToolRequest::ExtractFields(_), _, OutputShape::PlainLines(lines)) => {
            field_envelope(&lines, metadata)
        }
        (ToolRequest::AnalyzeErrors(r), Some(resolved), shape) => {
            debug!(
                "[{}] classifying as '{}' (requested '{}', fell back: {})",
                invocation,
                resolved.category.name(),
                r.error_type,
                resolved.fell_back
            );
            annotate(normalize(shape, metadata), resolved.category)
        }
        (ToolRequest::ListInterfaces, _, OutputShape::PlainLines(lines)) => {
            let interfaces = serde_json::to_value(parse_interfaces(&lines)).map_err(|e| {
                ToolError::MalformedOutput {
                    reason: e.to_string(),
                    raw_sample: String::new(),
                }
            })?;
            ResultEnvelope::success(metadata, interfaces)
        }
        (ToolRequest::GetProtocols, _, OutputShape::PlainLines(lines)) => ResultEnvelope::success(
            metadata,
            Value::Array(
                parse_protocols(&lines)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
        ),
        (_, _, shape) => normalize(shape, metadata),
    };
    Ok(envelope)
}
