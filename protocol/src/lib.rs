//! Wire and shared domain types for the playpen execution backend.
//!
//! Field names mirror the backend's JSON models so that request and response
//! bodies round-trip without renaming layers.

mod language;
mod models;

pub use language::Language;
pub use language::ParseLanguageError;
pub use models::BackendAck;
pub use models::CompiledArtifacts;
pub use models::ContainerInfo;
pub use models::ExecutionKind;
pub use models::SessionInfoResponse;
pub use models::SourceFile;
pub use models::StatusResponse;
pub use models::SubmitRequest;
pub use models::SubmitResponse;
