// Shared by several integration test binaries; not every binary uses every
// helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use playpen_backend_client::BackendError;
use playpen_backend_client::ExecBackend;
use playpen_backend_client::StatusCode;
use playpen_core::SessionSnapshot;
use playpen_core::StatusSurface;
use playpen_protocol::BackendAck;
use playpen_protocol::ExecutionKind;
use playpen_protocol::SessionInfoResponse;
use playpen_protocol::SourceFile;
use playpen_protocol::StatusResponse;
use playpen_protocol::SubmitRequest;
use playpen_protocol::SubmitResponse;

/// In-process [`ExecBackend`] that replays scripted replies in order. Any
/// call past the end of its queue is a test bug and panics.
#[derive(Default)]
pub struct ScriptedBackend {
    submits: Mutex<VecDeque<Result<SubmitResponse, BackendError>>>,
    statuses: Mutex<VecDeque<Result<StatusResponse, BackendError>>>,
    cancels: Mutex<VecDeque<Result<BackendAck, BackendError>>>,
    infos: Mutex<VecDeque<Result<SessionInfoResponse, BackendError>>>,
    cleanups: Mutex<VecDeque<Result<BackendAck, BackendError>>>,
    calls: Mutex<Vec<&'static str>>,
    last_submit: Mutex<Option<SubmitRequest>>,
}

impl ScriptedBackend {
    pub fn push_submit(&self, reply: Result<SubmitResponse, BackendError>) {
        self.submits.lock().unwrap().push_back(reply);
    }

    pub fn push_status(&self, reply: Result<StatusResponse, BackendError>) {
        self.statuses.lock().unwrap().push_back(reply);
    }

    pub fn push_cancel(&self, reply: Result<BackendAck, BackendError>) {
        self.cancels.lock().unwrap().push_back(reply);
    }

    pub fn push_info(&self, reply: Result<SessionInfoResponse, BackendError>) {
        self.infos.lock().unwrap().push_back(reply);
    }

    pub fn push_cleanup(&self, reply: Result<BackendAck, BackendError>) {
        self.cleanups.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| **call == name).count()
    }

    pub fn last_submit(&self) -> Option<SubmitRequest> {
        self.last_submit.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl ExecBackend for ScriptedBackend {
    async fn submit(
        &self,
        _kind: ExecutionKind,
        request: &SubmitRequest,
    ) -> Result<SubmitResponse, BackendError> {
        self.record("submit");
        *self.last_submit.lock().unwrap() = Some(request.clone());
        self.submits
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted submit call")
    }

    async fn status(&self, _execution_id: &str) -> Result<StatusResponse, BackendError> {
        self.record("status");
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted status call")
    }

    async fn cancel(&self, _execution_id: &str) -> Result<BackendAck, BackendError> {
        self.record("cancel");
        self.cancels
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted cancel call")
    }

    async fn session_info(&self) -> Result<SessionInfoResponse, BackendError> {
        self.record("session_info");
        self.infos
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted session_info call")
    }

    async fn session_cleanup(&self) -> Result<BackendAck, BackendError> {
        self.record("session_cleanup");
        self.cleanups
            .lock()
            .unwrap()
            .pop_front()
            .expect("unscripted session_cleanup call")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Status(String, bool),
    Output(String, bool),
    Session(Option<String>),
}

/// Records everything published to it, for asserting on user-visible flow.
#[derive(Default)]
pub struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl StatusSurface for RecordingSurface {
    fn show_status(&self, message: &str, ok: bool) {
        self.events
            .lock()
            .unwrap()
            .push(SurfaceEvent::Status(message.to_string(), ok));
    }

    fn show_output(&self, output: &str, rich: bool) {
        self.events
            .lock()
            .unwrap()
            .push(SurfaceEvent::Output(output.to_string(), rich));
    }

    fn show_session(&self, session: Option<&SessionSnapshot>) {
        self.events
            .lock()
            .unwrap()
            .push(SurfaceEvent::Session(
                session.map(|s| s.session_id.clone()),
            ));
    }
}

pub fn transport_error() -> BackendError {
    BackendError::Status(StatusCode::BAD_GATEWAY)
}

pub fn one_file(content: &str) -> Vec<SourceFile> {
    vec![SourceFile::new("main.py", content)]
}

pub fn started(execution_id: &str) -> SubmitResponse {
    SubmitResponse {
        success: true,
        message: "Execution started in container".to_string(),
        started: true,
        execution_id: Some(execution_id.to_string()),
        output: None,
        file_path: None,
        output_path: None,
    }
}

pub fn terminal_submit(success: bool, message: &str, output: Option<&str>) -> SubmitResponse {
    SubmitResponse {
        success,
        message: message.to_string(),
        started: false,
        execution_id: None,
        output: output.map(str::to_string),
        file_path: None,
        output_path: None,
    }
}

pub fn running(elapsed: f64, timeout: u64) -> StatusResponse {
    StatusResponse {
        running: true,
        completed: false,
        success: false,
        message: None,
        output: None,
        exit_code: None,
        elapsed_time: Some(elapsed),
        timeout: Some(timeout),
        cancelled: false,
        operation_type: Some(ExecutionKind::Run),
    }
}

pub fn completed(success: bool, output: &str) -> StatusResponse {
    StatusResponse {
        running: false,
        completed: true,
        success,
        message: Some(if success {
            "Execution completed".to_string()
        } else {
            "Execution failed".to_string()
        }),
        output: Some(output.to_string()),
        exit_code: Some(if success { 0 } else { 1 }),
        elapsed_time: Some(1.3),
        timeout: Some(30),
        cancelled: false,
        operation_type: Some(ExecutionKind::Run),
    }
}

pub fn ack(success: bool, message: &str) -> BackendAck {
    BackendAck {
        success,
        message: message.to_string(),
    }
}

pub fn session_info(session_id: &str) -> SessionInfoResponse {
    SessionInfoResponse {
        error: None,
        message: None,
        session_id: Some(session_id.to_string()),
        session_created: Some(1_700_000_000.0),
        session_last_used: Some(1_700_000_120.0),
        container: None,
    }
}

pub fn no_session() -> SessionInfoResponse {
    SessionInfoResponse {
        error: None,
        message: Some("No active session".to_string()),
        session_id: None,
        session_created: None,
        session_last_used: None,
        container: None,
    }
}
