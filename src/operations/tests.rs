#[cfg(test)]
mod tests {
    use crate::command_building::{
        CaptureRequest, ErrorAnalysisRequest, FieldExtractionRequest, FileAnalysisRequest,
        ProtocolAnalysisRequest, StatisticsRequest,
    };
    use crate::configuration::Config;
    use crate::error_handling::types::ToolError;
    use crate::operations::OperationFacade;
    use crate::output_normalization::envelope::{ResultEnvelope, Statistics, Status};
    use crate::process_execution::{display_command, RawToolOutput, ToolRunner};
    use serde_json::{json, Value};
    use std::future::Future;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::{NamedTempFile, TempDir};

    const VERSION: &str = "TShark (Wireshark) 4.2.2 (Git v4.2.2 packaged as 4.2.2-1)";

    enum Script {
        Stdout(String),
        Fails(String),
    }

    /// In-process stand-in for tshark that replays one canned response and
    /// records every call.
    struct ScriptedRunner {
        script: Script,
        calls: Mutex<Vec<(Vec<String>, Option<Duration>)>>,
    }

    impl ScriptedRunner {
        fn stdout(text: &str) -> Self {
            Self {
                script: Script::Stdout(text.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(stderr: &str) -> Self {
            Self {
                script: Script::Fails(stderr.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ToolRunner for ScriptedRunner {
        fn program(&self) -> &Path {
            Path::new("tshark")
        }

        fn run(
            &self,
            args: &[String],
            limit: Option<Duration>,
        ) -> impl Future<Output = Result<RawToolOutput, ToolError>> + Send {
            self.calls.lock().unwrap().push((args.to_vec(), limit));
            let result = match &self.script {
                Script::Stdout(text) => Ok(RawToolOutput::from_stdout(text.clone())),
                Script::Fails(stderr) => Err(ToolError::ExecutionFailure {
                    command: display_command(self.program(), args),
                    stderr: stderr.clone(),
                }),
            };
            async move { result }
        }
    }

    fn facade(runner: ScriptedRunner) -> OperationFacade<ScriptedRunner> {
        OperationFacade::with_runner(runner, VERSION, &Config::default())
    }

    fn calls(facade: &OperationFacade<ScriptedRunner>) -> Vec<(Vec<String>, Option<Duration>)> {
        facade.runner().calls.lock().unwrap().clone()
    }

    fn capture_file() -> NamedTempFile {
        tempfile::Builder::new().suffix(".pcap").tempfile().unwrap()
    }

    fn packet_array(n: usize) -> String {
        let packets: Vec<Value> = (0..n)
            .map(|i| json!({ "_source": { "layers": { "frame": { "frame.number": i.to_string() } } } }))
            .collect();
        serde_json::to_string_pretty(&packets).unwrap()
    }

    fn without_timestamp(envelope: &ResultEnvelope) -> Value {
        let mut value = envelope.to_value();
        value["metadata"]
            .as_object_mut()
            .unwrap()
            .remove("timestamp");
        value
    }

    #[tokio::test]
    async fn missing_file_is_reported_with_its_path() {
        let facade = facade(ScriptedRunner::stdout("[]"));
        let envelope = facade
            .analyze_pcap(FileAnalysisRequest::new("/no/such/capture.pcap"))
            .await;

        assert_eq!(envelope.status, Status::Error);
        let error = envelope.error.as_ref().unwrap();
        assert_eq!(error.kind, "file_not_found");
        assert!(error.message.contains("/no/such/capture.pcap"));
        assert!(!error.suggestions.is_empty());
        assert_eq!(
            envelope.metadata.context.file_path.as_deref(),
            Some(Path::new("/no/such/capture.pcap"))
        );
        assert!(calls(&facade).is_empty());
    }

    #[tokio::test]
    async fn directory_is_not_a_capture_file() {
        let dir = TempDir::new().unwrap();
        let facade = facade(ScriptedRunner::stdout("[]"));
        let envelope = facade
            .get_packet_statistics(StatisticsRequest::new(dir.path()))
            .await;

        assert_eq!(envelope.error.unwrap().kind, "invalid_request");
        assert!(calls(&facade).is_empty());
    }

    #[tokio::test]
    async fn retransmission_analysis_is_annotated() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout(&packet_array(3)));
        let mut request = ErrorAnalysisRequest::new(file.path());
        request.error_type = "retransmission".into();

        let envelope = facade.analyze_errors(request).await;

        let recorded = calls(&facade);
        let (args, _) = &recorded[0];
        let filter_at = args.iter().position(|a| a == "-Y").unwrap();
        assert_eq!(args[filter_at + 1], "tcp.analysis.retransmission");

        assert_eq!(envelope.status, Status::Success);
        let value = envelope.to_value();
        assert_eq!(value["error_type"], "retransmission");
        assert_eq!(value["filter_expression"], "tcp.analysis.retransmission");
        assert_eq!(value["total_error_packets"], 3);
        assert_eq!(value["statistics"]["returned_packets"], 3);
        assert_eq!(value["metadata"]["operation"], "analyze_errors");
    }

    #[tokio::test]
    async fn unknown_error_type_uses_the_combined_filter() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout(&packet_array(1)));
        let mut request = ErrorAnalysisRequest::new(file.path());
        request.error_type = "checksum".into();

        let value = facade.analyze_errors(request).await.to_value();
        assert_eq!(value["error_type"], "all");
        assert!(value["filter_expression"]
            .as_str()
            .unwrap()
            .contains("(_ws.malformed)"));

        let recorded = calls(&facade);
        let (args, _) = &recorded[0];
        assert_eq!(args.last().unwrap(), value["filter_expression"].as_str().unwrap());
    }

    #[tokio::test]
    async fn repeated_calls_differ_only_in_timestamp() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout(&packet_array(4)));
        let mut request = FileAnalysisRequest::new(file.path());
        request.filter = Some("tcp".into());

        let first = facade.analyze_pcap(request.clone()).await;
        let second = facade.analyze_pcap(request).await;
        assert_eq!(without_timestamp(&first), without_timestamp(&second));
    }

    #[tokio::test]
    async fn packet_bounds_truncate_and_clamp() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout(&packet_array(5)));

        let mut exact = FileAnalysisRequest::new(file.path());
        exact.max_packets = 5;
        let stats = facade.analyze_pcap(exact).await.packet_statistics().cloned().unwrap();
        assert_eq!((stats.returned_packets, stats.truncated), (5, false));

        let mut below = FileAnalysisRequest::new(file.path());
        below.max_packets = 4;
        let envelope = facade.analyze_pcap(below).await;
        let stats = envelope.packet_statistics().cloned().unwrap();
        assert_eq!((stats.total_packets, stats.returned_packets, stats.truncated), (5, 4, true));
        assert_eq!(envelope.data.unwrap().as_array().unwrap().len(), 4);

        let mut zero = FileAnalysisRequest::new(file.path());
        zero.max_packets = 0;
        let envelope = facade.analyze_pcap(zero).await;
        assert_eq!(envelope.metadata.max_packets, 1);
        let (args, _) = calls(&facade).pop().unwrap();
        assert!(args.windows(2).any(|w| w[0] == "-c" && w[1] == "1"));
    }

    #[tokio::test]
    async fn empty_output_is_no_data() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout("\n  \n"));
        let mut request = ProtocolAnalysisRequest::new(file.path());
        request.protocol = Some("DNS".into());

        let envelope = facade.analyze_protocols(request).await;
        assert_eq!(envelope.status, Status::NoData);
        assert_eq!(envelope.metadata.context.protocol.as_deref(), Some("dns"));
        assert!(envelope.details.unwrap()["possible_reasons"].is_array());
    }

    #[tokio::test]
    async fn field_extraction_ranks_values() {
        let file = capture_file();
        let rows = "10.0.0.1\n10.0.0.2\n10.0.0.1\n10.0.0.3\n10.0.0.1\n10.0.0.1\n10.0.0.2\n10.0.0.1\n10.0.0.4\n10.0.0.1\n";
        let facade = facade(ScriptedRunner::stdout(rows));

        let envelope = facade
            .extract_fields(FieldExtractionRequest::new(file.path(), vec!["ip.src".into()]))
            .await;

        assert_eq!(envelope.status, Status::Success);
        match envelope.statistics.as_ref().unwrap() {
            Statistics::Fields(stats) => {
                assert_eq!(stats.total_values, 10);
                assert_eq!(stats.unique_values, 4);
                assert_eq!(stats.top_values[0].value, "10.0.0.1");
                assert_eq!(stats.top_values[0].count, 6);
                assert_eq!(stats.top_values[0].percentage, 60.0);
            }
            other => panic!("unexpected statistics: {:?}", other),
        }
        assert_eq!(envelope.summary.unwrap().most_common_count, 6);
    }

    #[tokio::test]
    async fn field_extraction_without_rows_explains_itself() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout(""));
        let mut request = FieldExtractionRequest::new(file.path(), vec!["http.host".into()]);
        request.filter = Some("http".into());
        request.max_packets = 0;

        let envelope = facade.extract_fields(request).await;
        assert_eq!(envelope.status, Status::NoData);
        assert_eq!(envelope.metadata.max_packets, 0);
        let details = envelope.details.unwrap();
        assert_eq!(details["fields_requested"], json!(["http.host"]));
        assert_eq!(details["filter_applied"], "http");
        let (args, _) = calls(&facade).pop().unwrap();
        assert!(!args.contains(&"-c".to_string()));
    }

    #[tokio::test]
    async fn blank_field_never_reaches_the_tool() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout("x"));
        let envelope = facade
            .extract_fields(FieldExtractionRequest::new(file.path(), vec!["  ".into()]))
            .await;

        assert_eq!(envelope.error.unwrap().kind, "invalid_request");
        assert!(calls(&facade).is_empty());
    }

    #[tokio::test]
    async fn interfaces_are_parsed_into_entries() {
        let facade = facade(ScriptedRunner::stdout(
            "1. eth0\n2. any (Pseudo-device that captures on all interfaces)\n3. lo (Loopback)\n",
        ));
        let envelope = facade.list_interfaces().await;

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.metadata.tool_version, VERSION);
        assert_eq!(envelope.metadata.max_packets, 5000);
        let data = envelope.data.unwrap();
        assert_eq!(data[0], json!({ "name": "eth0", "description": "" }));
        assert_eq!(data[2]["description"], "Loopback");
    }

    #[tokio::test]
    async fn protocols_are_reduced_to_filter_names() {
        let facade = facade(ScriptedRunner::stdout(
            "Hypertext Transfer Protocol\tHTTP\thttp\nTransmission Control Protocol\tTCP\ttcp\n",
        ));
        let envelope = facade.get_protocols().await;
        assert_eq!(envelope.data.unwrap(), json!(["http", "tcp"]));
        assert_eq!(calls(&facade)[0].0, vec!["-G", "protocols"]);
    }

    #[tokio::test]
    async fn statistics_report_is_returned_as_lines() {
        let file = capture_file();
        let report = "\n===================\n| IO Statistics   |\n===================\n";
        let facade = facade(ScriptedRunner::stdout(report));

        let envelope = facade
            .get_packet_statistics(StatisticsRequest::new(file.path()))
            .await;
        assert_eq!(envelope.status, Status::Success);
        assert!(envelope.statistics.is_none());
        assert_eq!(envelope.data.unwrap().as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn tool_failure_becomes_an_error_envelope() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::failing("tshark: The file isn't a capture file"));

        let value = facade
            .analyze_pcap(FileAnalysisRequest::new(file.path()))
            .await
            .to_value();

        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["type"], "execution_failure");
        assert!(value["error"]["command"].as_str().unwrap().starts_with("tshark -r "));
        assert_eq!(
            value["error"]["suggestions"],
            json!(["verify the path is correct and readable"])
        );
    }

    #[tokio::test]
    async fn broken_json_is_malformed_output() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout("[{\"_source\": "));

        let envelope = facade.analyze_pcap(FileAnalysisRequest::new(file.path())).await;
        let error = envelope.error.unwrap();
        assert_eq!(error.kind, "malformed_output");
        assert_eq!(error.raw_data.as_deref(), Some("[{\"_source\": "));
    }

    #[tokio::test]
    async fn limits_follow_the_operation() {
        let file = capture_file();
        let facade = facade(ScriptedRunner::stdout(&packet_array(1)));

        let mut capture = CaptureRequest::new("eth0");
        capture.duration = 20;
        facade.capture_live(capture).await;
        facade.analyze_pcap(FileAnalysisRequest::new(file.path())).await;

        let recorded = calls(&facade);
        assert_eq!(recorded[0].1, Some(Duration::from_secs(25)));
        assert_eq!(recorded[1].1, Some(Duration::from_secs(300)));

        let unbounded = OperationFacade::with_runner(
            ScriptedRunner::stdout(&packet_array(1)),
            VERSION,
            &Config {
                command_timeout_secs: 0,
                ..Config::default()
            },
        );
        unbounded.analyze_pcap(FileAnalysisRequest::new(file.path())).await;
        assert_eq!(calls(&unbounded)[0].1, None);
    }

    #[tokio::test]
    async fn capture_context_is_echoed() {
        let facade = facade(ScriptedRunner::stdout(&packet_array(2)));
        let mut request = CaptureRequest::new("eth0");
        request.filter = Some("port 53".into());

        let value = facade.capture_live(request).await.to_value();
        assert_eq!(value["metadata"]["interface"], "eth0");
        assert_eq!(value["metadata"]["filter"], "port 53");
        assert_eq!(value["metadata"]["max_packets"], 100);
        assert!(value["metadata"].get("file_path").is_none());
    }
}
