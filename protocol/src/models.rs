use serde::Deserialize;
use serde::Serialize;

use crate::Language;

/// The three job kinds the backend accepts.
///
/// `compile` answers synchronously; `run` and `verify` hand back an execution
/// id and complete asynchronously. The status endpoint echoes the kind as
/// `operation_type` so the client can decide how to render the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    Compile,
    Run,
    Verify,
}

impl ExecutionKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            ExecutionKind::Compile => "/compile",
            ExecutionKind::Run => "/run",
            ExecutionKind::Verify => "/verify",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionKind::Compile => "compile",
            ExecutionKind::Run => "run",
            ExecutionKind::Verify => "verify",
        }
    }
}

/// A named buffer of a multi-file program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Paths of a previously compiled program, reported by a successful compile
/// and optionally referenced by a later run to skip recompilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifacts {
    pub file_path: String,
    pub output_path: Option<String>,
}

/// Body of a compile/run/verify submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub language: Language,
    pub files: Vec<SourceFile>,
    pub main_file: String,
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}

/// Reply to a submission.
///
/// Two shapes share this model: a terminal reply (`started == false`, the
/// compile path and early failures) carrying the final message/output, and an
/// accepted async job (`started == true`) carrying the `execution_id` to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl SubmitResponse {
    /// Artifact paths reported by a successful compile, if any.
    pub fn artifacts(&self) -> Option<CompiledArtifacts> {
        self.file_path.as_ref().map(|file_path| CompiledArtifacts {
            file_path: file_path.clone(),
            output_path: self.output_path.clone(),
        })
    }
}

/// Reply from `GET /status/{execution_id}`.
///
/// While the job runs only `running`, `elapsed_time` and `timeout` are
/// meaningful. A 404 for an unknown or reaped job arrives as
/// `running == false, completed == false` with a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub elapsed_time: Option<f64>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub operation_type: Option<ExecutionKind>,
}

impl StatusResponse {
    /// Verification results are preformatted rich content; everything else is
    /// plain text.
    pub fn is_rich_output(&self) -> bool {
        self.operation_type == Some(ExecutionKind::Verify)
    }
}

/// Generic confirm/deny reply used by the cancel and session-cleanup
/// endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendAck {
    pub success: bool,
    pub message: String,
}

/// Container metadata attached to an active session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub container_id: String,
    pub status: String,
    pub age_seconds: f64,
}

/// Reply from `GET /session/info`.
///
/// The backend reports a missing session either as a 404 `message` body or as
/// an `{"error": ...}` body; both leave `session_id` unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfoResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_created: Option<f64>,
    #[serde(default)]
    pub session_last_used: Option<f64>,
    #[serde(default)]
    pub container: Option<ContainerInfo>,
}

impl SessionInfoResponse {
    pub fn is_no_session(&self) -> bool {
        self.session_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn submit_response_terminal_compile_shape() {
        let json = r#"{
            "success": false,
            "message": "Compilation failed",
            "output": "main.c:3: error: expected `;`"
        }"#;
        let parsed: SubmitResponse = serde_json::from_str(json).expect("parse");
        assert!(!parsed.started);
        assert_eq!(parsed.execution_id, None);
        assert_eq!(parsed.artifacts(), None);
    }

    #[test]
    fn submit_response_started_shape() {
        let json = r#"{
            "success": true,
            "message": "Execution started in container",
            "started": true,
            "execution_id": "17"
        }"#;
        let parsed: SubmitResponse = serde_json::from_str(json).expect("parse");
        assert!(parsed.started);
        assert_eq!(parsed.execution_id.as_deref(), Some("17"));
    }

    #[test]
    fn compile_success_reports_artifacts() {
        let json = r#"{
            "success": true,
            "message": "Compilation successful",
            "output": "",
            "file_path": "/work/main.c",
            "output_path": "/work/a.out"
        }"#;
        let parsed: SubmitResponse = serde_json::from_str(json).expect("parse");
        let artifacts = parsed.artifacts().expect("artifacts");
        assert_eq!(artifacts.file_path, "/work/main.c");
        assert_eq!(artifacts.output_path.as_deref(), Some("/work/a.out"));
    }

    #[test]
    fn status_running_shape() {
        let json = r#"{"running": true, "completed": false, "elapsed_time": 2.5, "cancelled": false}"#;
        let parsed: StatusResponse = serde_json::from_str(json).expect("parse");
        assert!(parsed.running);
        assert_eq!(parsed.elapsed_time, Some(2.5));
        assert!(!parsed.is_rich_output());
    }

    #[test]
    fn status_finished_verify_is_rich() {
        let json = r#"{
            "running": false,
            "completed": true,
            "success": true,
            "message": "Verification complete",
            "output": "<div>ok</div>",
            "exit_code": 0,
            "elapsed_time": 4.1,
            "operation_type": "verify"
        }"#;
        let parsed: StatusResponse = serde_json::from_str(json).expect("parse");
        assert!(parsed.is_rich_output());
        assert_eq!(parsed.exit_code, Some(0));
    }

    #[test]
    fn status_not_found_shape() {
        let json = r#"{"running": false, "message": "Execution not found or completed"}"#;
        let parsed: StatusResponse = serde_json::from_str(json).expect("parse");
        assert!(!parsed.running);
        assert!(!parsed.completed);
    }

    #[test]
    fn session_info_active_and_missing() {
        let active: SessionInfoResponse = serde_json::from_str(
            r#"{
                "session_id": "abcd1234",
                "session_created": 1000.0,
                "session_last_used": 1120.0,
                "container": {"container_id": "deadbeef", "status": "running", "age_seconds": 42.0}
            }"#,
        )
        .expect("parse");
        assert!(!active.is_no_session());
        assert_eq!(
            active.container.as_ref().map(|c| c.status.as_str()),
            Some("running")
        );

        let missing: SessionInfoResponse =
            serde_json::from_str(r#"{"message": "No active session with id: None"}"#)
                .expect("parse");
        assert!(missing.is_no_session());

        let errored: SessionInfoResponse =
            serde_json::from_str(r#"{"error": "Failed to get session info"}"#).expect("parse");
        assert!(errored.is_no_session());
    }

    #[test]
    fn submit_request_omits_absent_artifacts() {
        let request = SubmitRequest {
            language: Language::C,
            files: vec![SourceFile::new("main.c", "int main(){}")],
            main_file: "main.c".to_string(),
            timeout: 30,
            file_path: None,
            output_path: None,
        };
        let json = serde_json::to_string(&request).expect("serialize");
        assert!(!json.contains("file_path"));
        assert!(!json.contains("output_path"));
    }
}
