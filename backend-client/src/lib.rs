//! HTTP client for the playpen execution backend.
//!
//! The [`ExecBackend`] trait is the seam the orchestration layer depends on;
//! [`HttpBackend`] is the reqwest implementation. Tests substitute scripted
//! backends behind the same trait.

use async_trait::async_trait;
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use playpen_protocol::BackendAck;
use playpen_protocol::ExecutionKind;
use playpen_protocol::SessionInfoResponse;
use playpen_protocol::StatusResponse;
use playpen_protocol::SubmitRequest;
use playpen_protocol::SubmitResponse;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(StatusCode),
    #[error("malformed response body: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// The five backend operations the client orchestrates.
///
/// All replies are protocol-level: the backend answers 422/404/500 with
/// meaningful JSON bodies, which implementations surface as `Ok` values.
/// Errors are reserved for transport failures and unintelligible bodies.
#[async_trait]
pub trait ExecBackend: Send + Sync {
    async fn submit(
        &self,
        kind: ExecutionKind,
        request: &SubmitRequest,
    ) -> Result<SubmitResponse, BackendError>;

    async fn status(&self, execution_id: &str) -> Result<StatusResponse, BackendError>;

    async fn cancel(&self, execution_id: &str) -> Result<BackendAck, BackendError>;

    async fn session_info(&self) -> Result<SessionInfoResponse, BackendError>;

    async fn session_cleanup(&self) -> Result<BackendAck, BackendError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Decode a reply, accepting non-2xx statuses whose bodies still parse as
    /// the expected shape (the backend reports failures that way).
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        let body = response.bytes().await?;
        match serde_json::from_slice(&body) {
            Ok(parsed) => Ok(parsed),
            Err(err) if status.is_success() => Err(BackendError::Malformed(err)),
            Err(_) => Err(BackendError::Status(status)),
        }
    }
}

#[async_trait]
impl ExecBackend for HttpBackend {
    async fn submit(
        &self,
        kind: ExecutionKind,
        request: &SubmitRequest,
    ) -> Result<SubmitResponse, BackendError> {
        let url = self.endpoint(kind.endpoint())?;
        tracing::debug!(kind = kind.as_str(), %url, "submitting execution request");
        let response = self.client.post(url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn status(&self, execution_id: &str) -> Result<StatusResponse, BackendError> {
        let url = self.endpoint(&format!("status/{execution_id}"))?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn cancel(&self, execution_id: &str) -> Result<BackendAck, BackendError> {
        let url = self.endpoint("cancel")?;
        tracing::debug!(execution_id, "requesting cancellation");
        let response = self
            .client
            .post(url)
            .form(&[("execution_id", execution_id)])
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn session_info(&self) -> Result<SessionInfoResponse, BackendError> {
        let url = self.endpoint("session/info")?;
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    async fn session_cleanup(&self) -> Result<BackendAck, BackendError> {
        let url = self.endpoint("session/cleanup")?;
        let response = self.client.post(url).send().await?;
        Self::decode(response).await
    }
}
