use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio::time::interval;
use tokio::time::sleep;

use playpen_backend_client::ExecBackend;
use playpen_protocol::CompiledArtifacts;
use playpen_protocol::ExecutionKind;
use playpen_protocol::Language;
use playpen_protocol::SourceFile;
use playpen_protocol::StatusResponse;
use playpen_protocol::SubmitRequest;
use playpen_protocol::SubmitResponse;

use crate::error::ControllerError;
use crate::session::SessionTracker;
use crate::surface::StatusSurface;

/// Client-side grace factor applied on top of the declared execution timeout.
/// The backend enforces the real limit; this backstop only fires when the
/// backend stops answering honestly about an execution it should have killed.
const TIMEOUT_GRACE: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

impl ExecStatus {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Submitting | Self::Polling)
    }
}

/// Terminal outcome of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecResult {
    pub status: ExecStatus,
    pub message: String,
    pub output: Option<String>,
    pub exit_code: Option<i32>,
    pub elapsed: Option<f64>,
    /// Structured report (currently only verification runs produce one) that
    /// surfaces should render rather than dump as plain text.
    pub rich_output: bool,
}

impl ExecResult {
    fn from_status(response: &StatusResponse) -> Self {
        let status = if response.cancelled {
            ExecStatus::Cancelled
        } else if response.success {
            ExecStatus::Completed
        } else {
            ExecStatus::Failed
        };
        Self {
            status,
            message: response.message.clone().unwrap_or_default(),
            output: response.output.clone(),
            exit_code: response.exit_code,
            elapsed: response.elapsed_time,
            rich_output: response.is_rich_output(),
        }
    }

    fn from_submit(response: &SubmitResponse) -> Self {
        Self {
            status: if response.success {
                ExecStatus::Completed
            } else {
                ExecStatus::Failed
            },
            message: response.message.clone(),
            output: response.output.clone(),
            exit_code: None,
            elapsed: None,
            rich_output: false,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            status: ExecStatus::Failed,
            message,
            output: None,
            exit_code: None,
            elapsed: None,
            rich_output: false,
        }
    }

    fn timed_out(elapsed: f64) -> Self {
        Self {
            status: ExecStatus::TimedOut,
            message: format!("Execution timed out after {elapsed:.1}s with no verdict from the backend"),
            output: None,
            exit_code: None,
            elapsed: Some(elapsed),
            rich_output: false,
        }
    }
}

/// What `submit` resolved to: some operations (compiles, trivial failures)
/// finish synchronously, the rest hand back an execution id and a running
/// poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Finished(ExecResult),
    Started { execution_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Running { elapsed: f64, remaining: f64 },
    Finished(ExecResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancellationOutcome {
    Cancelled,
    /// The backend declined (typically because the execution already
    /// finished); polling continues and will pick up the real verdict.
    Refused { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSnapshot {
    pub status: ExecStatus,
    pub execution_id: Option<String>,
    pub last_result: Option<ExecResult>,
}

#[derive(Debug, Clone)]
pub struct SubmitPayload {
    pub kind: ExecutionKind,
    pub language: Language,
    pub files: Vec<SourceFile>,
    pub main_file: String,
    pub timeout: u64,
    /// Reuse the artifacts remembered from the last successful compile
    /// instead of compiling again. Only meaningful for runs.
    pub use_compiled: bool,
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_period: Duration,
    /// How long to wait after a terminal verdict before refreshing session
    /// metadata; the backend updates container bookkeeping asynchronously.
    pub refresh_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_secs(1),
            refresh_delay: Duration::from_millis(500),
        }
    }
}

struct ExecState {
    status: ExecStatus,
    execution_id: Option<String>,
    started_at: Option<Instant>,
    declared_timeout: u64,
    artifacts: Option<CompiledArtifacts>,
    last_result: Option<ExecResult>,
}

struct ControllerInner {
    backend: Arc<dyn ExecBackend>,
    surface: Arc<dyn StatusSurface>,
    tracker: Option<SessionTracker>,
    state: Mutex<ExecState>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    config: ControllerConfig,
}

/// Drives one execution at a time against the backend: validate, submit,
/// poll, and settle on a terminal [`ExecResult`].
///
/// Cheap to clone; all clones share the same execution state.
#[derive(Clone)]
pub struct ExecutionController {
    inner: Arc<ControllerInner>,
}

impl ExecutionController {
    pub fn new(backend: Arc<dyn ExecBackend>, surface: Arc<dyn StatusSurface>) -> Self {
        Self::with_config(backend, surface, None, ControllerConfig::default())
    }

    pub fn with_config(
        backend: Arc<dyn ExecBackend>,
        surface: Arc<dyn StatusSurface>,
        tracker: Option<SessionTracker>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                backend,
                surface,
                tracker,
                state: Mutex::new(ExecState {
                    status: ExecStatus::Idle,
                    execution_id: None,
                    started_at: None,
                    declared_timeout: 0,
                    artifacts: None,
                    last_result: None,
                }),
                poll_task: Mutex::new(None),
                config,
            }),
        }
    }

    pub async fn status(&self) -> ExecStatus {
        self.inner.state.lock().await.status
    }

    pub async fn snapshot(&self) -> ExecutionSnapshot {
        let state = self.inner.state.lock().await;
        ExecutionSnapshot {
            status: state.status,
            execution_id: state.execution_id.clone(),
            last_result: state.last_result.clone(),
        }
    }

    pub async fn compiled_artifacts(&self) -> Option<CompiledArtifacts> {
        self.inner.state.lock().await.artifacts.clone()
    }

    /// Forget the remembered compile artifacts, forcing the next
    /// `use_compiled` run to compile from source again. Call this whenever
    /// the sources change.
    pub async fn reset_compiled_artifacts(&self) {
        self.inner.state.lock().await.artifacts = None;
    }

    /// Validate and submit one operation. Validation failures and an
    /// execution already in flight are rejected before anything reaches the
    /// network.
    pub async fn submit(
        &self,
        payload: SubmitPayload,
    ) -> Result<SubmissionOutcome, ControllerError> {
        if payload.files.is_empty()
            || payload
                .files
                .iter()
                .all(|file| file.content.trim().is_empty())
        {
            return Err(ControllerError::EmptyInput);
        }
        if payload.kind == ExecutionKind::Verify && !payload.language.supports_verification() {
            return Err(ControllerError::UnsupportedOperation(payload.language));
        }

        let carried = {
            let mut state = self.inner.state.lock().await;
            if state.status.is_active() {
                return Err(ControllerError::ExecutionInProgress);
            }
            state.status = ExecStatus::Submitting;
            state.execution_id = None;
            state.declared_timeout = payload.timeout;
            if payload.use_compiled && payload.kind == ExecutionKind::Run {
                state.artifacts.clone()
            } else {
                None
            }
        };

        self.inner
            .surface
            .show_status(&format!("Submitting {}...", payload.kind.as_str()), true);

        let request = SubmitRequest {
            language: payload.language,
            files: payload.files,
            main_file: payload.main_file,
            timeout: payload.timeout,
            file_path: carried.as_ref().map(|a| a.file_path.clone()),
            output_path: carried.as_ref().and_then(|a| a.output_path.clone()),
        };

        let response = match self.inner.backend.submit(payload.kind, &request).await {
            Ok(response) => response,
            Err(err) => {
                let mut state = self.inner.state.lock().await;
                state.status = ExecStatus::Failed;
                state.last_result = Some(ExecResult::failed(format!("request failed: {err}")));
                return Err(err.into());
            }
        };

        if response.started {
            if let Some(execution_id) = response.execution_id.clone() {
                {
                    let mut state = self.inner.state.lock().await;
                    state.status = ExecStatus::Polling;
                    state.execution_id = Some(execution_id.clone());
                    state.started_at = Some(Instant::now());
                }
                self.inner
                    .surface
                    .show_status("Running in container...", true);
                self.spawn_poll_loop().await;
                return Ok(SubmissionOutcome::Started { execution_id });
            }
            tracing::warn!("backend reported started without an execution id");
        }

        // Synchronous verdict: compiles and early rejections land here.
        let result = ExecResult::from_submit(&response);
        {
            let mut state = self.inner.state.lock().await;
            state.status = result.status;
            if payload.kind == ExecutionKind::Compile && response.success {
                state.artifacts = response.artifacts();
            }
            state.last_result = Some(result.clone());
        }
        self.inner.surface.show_output(
            result.output.as_deref().unwrap_or(&result.message),
            result.rich_output,
        );
        self.schedule_session_refresh();
        Ok(SubmissionOutcome::Finished(result))
    }

    /// One status round trip. Exposed so tests and callers that drive their
    /// own cadence can poll without the background task.
    pub async fn poll_once(&self) -> Result<PollOutcome, ControllerError> {
        let (execution_id, started_at, declared_timeout) = {
            let state = self.inner.state.lock().await;
            let Some(id) = state.execution_id.clone() else {
                return Err(ControllerError::NoActiveExecution);
            };
            (id, state.started_at, state.declared_timeout)
        };

        let status = match self.inner.backend.status(&execution_id).await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(%execution_id, "status poll failed: {err}");
                let result = ExecResult::failed(format!("status request failed: {err}"));
                self.finish(&execution_id, result.clone()).await;
                return Ok(PollOutcome::Finished(result));
            }
        };

        if status.running {
            let elapsed = status.elapsed_time.unwrap_or_else(|| {
                started_at.map_or(0.0, |start| start.elapsed().as_secs_f64())
            });
            let declared = status.timeout.unwrap_or(declared_timeout) as f64;
            let limit = declared * TIMEOUT_GRACE;
            if declared > 0.0 && elapsed >= limit {
                let result = ExecResult::timed_out(elapsed);
                self.inner.surface.show_status(&result.message, false);
                self.finish(&execution_id, result.clone()).await;
                return Ok(PollOutcome::Finished(result));
            }
            let remaining = (declared - elapsed).max(0.0);
            self.inner.surface.show_status(
                &format!("Running in container... ({elapsed:.1}s elapsed, {remaining:.1}s remaining)"),
                true,
            );
            return Ok(PollOutcome::Running { elapsed, remaining });
        }

        let result = ExecResult::from_status(&status);
        self.inner.surface.show_output(
            result.output.as_deref().unwrap_or(&result.message),
            result.rich_output,
        );
        self.finish(&execution_id, result.clone()).await;
        Ok(PollOutcome::Finished(result))
    }

    /// Ask the backend to kill the in-flight execution.
    ///
    /// Races against completion: if the backend refuses because the run
    /// finished first, the poll loop is left alone to fetch the real verdict.
    pub async fn cancel(&self) -> Result<CancellationOutcome, ControllerError> {
        let execution_id = {
            let state = self.inner.state.lock().await;
            state
                .execution_id
                .clone()
                .ok_or(ControllerError::NoActiveExecution)?
        };

        let ack = self.inner.backend.cancel(&execution_id).await?;
        if !ack.success {
            tracing::debug!(%execution_id, message = %ack.message, "cancel refused");
            return Ok(CancellationOutcome::Refused {
                message: ack.message,
            });
        }

        let mut result = ExecResult::failed(ack.message.clone());
        result.status = ExecStatus::Cancelled;
        let finished = self.finish(&execution_id, result).await;
        if finished {
            if let Some(task) = self.inner.poll_task.lock().await.take() {
                task.abort();
            }
            self.inner.surface.show_status(&ack.message, true);
        }
        Ok(CancellationOutcome::Cancelled)
    }

    /// Block until the in-flight execution (if any) reaches a terminal
    /// state, then return it.
    pub async fn wait(&self) -> Option<ExecResult> {
        let task = self.inner.poll_task.lock().await.take();
        if let Some(task) = task {
            // Abort shows up as a JoinError; the state already holds the
            // cancellation result by then.
            let _ = task.await;
        }
        self.inner.state.lock().await.last_result.clone()
    }

    /// Record a terminal result, guarding against an already-settled
    /// execution. Returns whether this call was the one that settled it.
    async fn finish(&self, execution_id: &str, result: ExecResult) -> bool {
        {
            let mut state = self.inner.state.lock().await;
            if state.execution_id.as_deref() != Some(execution_id) {
                return false;
            }
            state.execution_id = None;
            state.started_at = None;
            state.status = result.status;
            state.last_result = Some(result);
        }
        self.schedule_session_refresh();
        true
    }

    async fn spawn_poll_loop(&self) {
        let controller = self.clone();
        let period = self.inner.config.poll_period;
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately; the first status check should
            // wait a full period after submission.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match controller.poll_once().await {
                    Ok(PollOutcome::Running { .. }) => {}
                    Ok(PollOutcome::Finished(_)) | Err(_) => break,
                }
            }
        });
        *self.inner.poll_task.lock().await = Some(handle);
    }

    fn schedule_session_refresh(&self) {
        let Some(tracker) = self.inner.tracker.clone() else {
            return;
        };
        let delay = self.inner.config.refresh_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            if let Err(err) = tracker.refresh().await {
                tracing::warn!("session refresh after execution failed: {err}");
            }
        });
    }
}
