//! Earth Engine REST implementation of the export backend.

mod error;
mod types;

use std::sync::LazyLock;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{Level, debug, info, warn};
use uuid::Uuid;

use crate::config::EarthEngineConfig;
use crate::export::{BackendFuture, ExportBackend, ExportHandle, ExportRequest, ExportStatus};
use types::{ErrorEnvelope, Operation};

pub use error::EarthEngineError;
pub use types::{DriveDestination, ExportTableBody, FileExportOptions};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Backend that queues table exports through the Earth Engine REST API.
#[derive(Clone)]
pub struct EarthEngineBackend {
    api_base: String,
    project: String,
    access_token: String,
}

impl EarthEngineBackend {
    /// Constructs a new backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EarthEngineError::Config`] when the configuration lacks the
    /// project, the access token, or any field needed to build requests.
    pub fn new(config: &EarthEngineConfig) -> Result<Self, EarthEngineError> {
        config.validate_credentials()?;
        Ok(Self {
            api_base: config.api_base.trim().trim_end_matches('/').to_owned(),
            project: config.project.as_deref().unwrap_or_default().trim().to_owned(),
            access_token: config
                .access_token
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_owned(),
        })
    }

    /// Cloud project the exports are queued under.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    fn export_url(&self) -> String {
        format!("{}/projects/{}/table:export", self.api_base, self.project)
    }

    /// Accepts either a full operation name or a bare operation id.
    fn operation_url(&self, operation: &str) -> String {
        let trimmed = operation.trim().trim_start_matches('/');
        if trimmed.starts_with("projects/") {
            format!("{}/{trimmed}", self.api_base)
        } else {
            format!(
                "{}/projects/{}/operations/{trimmed}",
                self.api_base, self.project
            )
        }
    }

    async fn read_json<T: DeserializeOwned>(
        action: &str,
        response: reqwest::Response,
    ) -> Result<T, EarthEngineError> {
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|err| EarthEngineError::Decode {
                action: action.to_owned(),
                message: err.to_string(),
            });
        }

        Err(EarthEngineError::Api {
            action: action.to_owned(),
            status: status.as_u16(),
            message: api_error_message(&body),
        })
    }
}

/// Extracts the message from an API error body, falling back to the raw text.
fn api_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorEnvelope>(body).map_or_else(
        |_| String::from_utf8_lossy(body).trim().to_owned(),
        |envelope| envelope.error.message,
    )
}

impl ExportBackend for EarthEngineBackend {
    type Error = EarthEngineError;

    fn submit<'a>(
        &'a self,
        request: &'a ExportRequest,
    ) -> BackendFuture<'a, ExportHandle, Self::Error> {
        Box::pin(async move {
            request.validate()?;
            let body = ExportTableBody::new(request, Uuid::new_v4().to_string());
            if tracing::enabled!(Level::DEBUG) {
                debug!(
                    description = %body.description,
                    request_id = %body.request_id,
                    body = %body.render(),
                    "submitting table export"
                );
            }

            let response = HTTP_CLIENT
                .post(self.export_url())
                .bearer_auth(&self.access_token)
                .json(&body)
                .send()
                .await?;
            let operation: Operation = Self::read_json("table export", response).await?;

            if operation.name.is_empty() {
                warn!(
                    description = %request.description,
                    "export acknowledged without an operation name"
                );
            } else {
                info!(
                    operation = %operation.name,
                    description = %request.description,
                    "export task started"
                );
            }

            Ok(ExportHandle {
                operation: operation.name,
                variable: request.variable(),
                description: request.description.clone(),
            })
        })
    }

    fn status<'a>(&'a self, operation: &'a str) -> BackendFuture<'a, ExportStatus, Self::Error> {
        Box::pin(async move {
            let response = HTTP_CLIENT
                .get(self.operation_url(operation))
                .bearer_auth(&self.access_token)
                .send()
                .await?;
            let found: Operation = Self::read_json("operation lookup", response).await?;
            Ok(found.into_status())
        })
    }
}
