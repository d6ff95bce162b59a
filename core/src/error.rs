use thiserror::Error;

use playpen_backend_client::BackendError;
use playpen_protocol::Language;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// Submission rejected before any network call: no source content.
    #[error("no source content to submit")]
    EmptyInput,
    /// Submission rejected before any network call: the language cannot be
    /// verified.
    #[error("verification is not supported for {0}")]
    UnsupportedOperation(Language),
    /// Cancellation requested with no tracked execution id.
    #[error("no execution to cancel")]
    NoActiveExecution,
    /// A second submission arrived while one execution was still in flight.
    /// Concurrent submissions are rejected rather than silently replacing the
    /// bookkeeping of the job already being polled.
    #[error("an execution is already in progress")]
    ExecutionInProgress,
    #[error(transparent)]
    Backend(#[from] BackendError),
}
