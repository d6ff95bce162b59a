//! Execution-lifecycle orchestration for the playpen backend.
//!
//! [`controller::ExecutionController`] drives one compile/run/verify job from
//! submission through polling to a terminal state; [`session::SessionTracker`]
//! mirrors the backend's ephemeral session/container metadata. Both publish
//! into an abstract [`surface::StatusSurface`] so the crate stays independent
//! of any concrete UI.

pub mod controller;
pub mod error;
pub mod session;
pub mod surface;

pub use controller::CancellationOutcome;
pub use controller::ControllerConfig;
pub use controller::ExecResult;
pub use controller::ExecStatus;
pub use controller::ExecutionController;
pub use controller::ExecutionSnapshot;
pub use controller::PollOutcome;
pub use controller::SubmissionOutcome;
pub use controller::SubmitPayload;
pub use error::ControllerError;
pub use session::CleanupOutcome;
pub use session::ContainerSnapshot;
pub use session::SessionRefreshTask;
pub use session::SessionSnapshot;
pub use session::SessionTracker;
pub use session::format_duration;
pub use surface::NullSurface;
pub use surface::StatusSurface;
