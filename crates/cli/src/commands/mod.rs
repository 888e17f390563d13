pub mod analyze;
pub mod config;
pub mod input;
pub mod personas;

use serde::Serialize;
use serde_json::Value;
use winloss_core::errors::{AnalysisError, ApplicationError};

use self::input::SkippedRecord;

pub const EXIT_INTERNAL: u8 = 1;
pub const EXIT_CONFIG_VALIDATION: u8 = 2;
pub const EXIT_INPUT_READ: u8 = 3;
pub const EXIT_INPUT_PARSE: u8 = 4;
pub const EXIT_ANALYSIS_REJECTED: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped_records: Vec<SkippedRecord>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            result: None,
            skipped_records: Vec::new(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Success carrying a structured report under `result`.
    pub fn report(
        command: &str,
        message: impl Into<String>,
        correlation_id: &str,
        result: &impl Serialize,
        skipped_records: &[SkippedRecord],
    ) -> Self {
        let result = match serde_json::to_value(result) {
            Ok(value) => value,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), EXIT_INTERNAL);
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: Some(correlation_id.to_string()),
            result: Some(result),
            skipped_records: skipped_records.to_vec(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            result: None,
            skipped_records: Vec::new(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps a fatal analysis error onto the CLI's error classes and exit codes.
    pub fn analysis_failure(
        command: &str,
        error: AnalysisError,
        correlation_id: &str,
        skipped_records: &[SkippedRecord],
    ) -> Self {
        let (error_class, exit_code) = match error {
            AnalysisError::EmptyBatch => ("empty_batch", EXIT_ANALYSIS_REJECTED),
            AnalysisError::NoValidRecords { .. } => ("no_valid_records", EXIT_ANALYSIS_REJECTED),
            AnalysisError::Serialization(_) => ("serialization", EXIT_INTERNAL),
        };
        let detail = error.to_string();
        let interface = ApplicationError::from(error).into_interface(correlation_id);
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({detail})", interface.user_message()),
            correlation_id: Some(interface.correlation_id().to_string()),
            result: None,
            skipped_records: skipped_records.to_vec(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use winloss_core::errors::AnalysisError;

    use super::{CommandResult, EXIT_ANALYSIS_REJECTED, EXIT_INTERNAL};

    #[test]
    fn analysis_failure_carries_class_and_correlation_id() {
        let result = CommandResult::analysis_failure(
            "analyze",
            AnalysisError::NoValidRecords { rejected: 4 },
            "req-1",
            &[],
        );
        assert_eq!(result.exit_code, EXIT_ANALYSIS_REJECTED);

        let payload: Value = serde_json::from_str(&result.output).expect("payload is json");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "no_valid_records");
        assert_eq!(payload["correlation_id"], "req-1");
        assert!(payload["message"].as_str().unwrap_or_default().contains("4 rejected"));
    }

    #[test]
    fn serialization_failure_is_an_internal_error() {
        let result = CommandResult::analysis_failure(
            "analyze",
            AnalysisError::Serialization("key must be a string".to_string()),
            "req-2",
            &[],
        );
        assert_eq!(result.exit_code, EXIT_INTERNAL);

        let payload: Value = serde_json::from_str(&result.output).expect("payload is json");
        assert_eq!(payload["error_class"], "serialization");
        assert!(payload["message"]
            .as_str()
            .unwrap_or_default()
            .starts_with("An unexpected internal error occurred."));
    }

    #[test]
    fn plain_success_omits_optional_fields() {
        let result = CommandResult::success("config", "done");
        let payload: Value = serde_json::from_str(&result.output).expect("payload is json");
        assert!(payload.get("result").is_none());
        assert!(payload.get("correlation_id").is_none());
        assert!(payload.get("skipped_records").is_none());
        assert_eq!(payload["error_class"], Value::Null);
    }
}
