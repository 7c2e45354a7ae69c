//! Backend abstraction for submitting asynchronous table exports.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::table::CombinedTable;
use crate::variable::Variable;

/// File format requested from the platform.
pub const CSV_FORMAT: &str = "CSV";

/// Parameters required to queue one table export.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRequest {
    /// Table to export.
    pub table: CombinedTable,
    /// Human readable task description shown in the platform's task list.
    pub description: String,
    /// Destination folder in cloud storage.
    pub folder: String,
    /// Output file name prefix.
    pub file_name_prefix: String,
    /// Output file format, always [`CSV_FORMAT`] for this tool.
    pub file_format: String,
}

impl ExportRequest {
    /// Starts a builder for `table`.
    #[must_use]
    pub fn builder(table: CombinedTable) -> ExportRequestBuilder {
        ExportRequestBuilder::new(table)
    }

    /// Variable carried by the exported table.
    #[must_use]
    pub const fn variable(&self) -> Variable {
        self.table.variable()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] when any string field is empty.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.description.is_empty() {
            return Err(ExportError::Validation("description".to_owned()));
        }
        if self.folder.is_empty() {
            return Err(ExportError::Validation("folder".to_owned()));
        }
        if self.file_name_prefix.is_empty() {
            return Err(ExportError::Validation("file_name_prefix".to_owned()));
        }
        if self.file_format.is_empty() {
            return Err(ExportError::Validation("file_format".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`ExportRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRequestBuilder {
    table: CombinedTable,
    description: String,
    folder: String,
    file_name_prefix: String,
    file_format: String,
}

impl ExportRequestBuilder {
    /// Creates a builder exporting `table` as CSV; the remaining fields must
    /// be populated before build.
    #[must_use]
    pub fn new(table: CombinedTable) -> Self {
        Self {
            table,
            description: String::new(),
            folder: String::new(),
            file_name_prefix: String::new(),
            file_format: CSV_FORMAT.to_owned(),
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = value.into();
        self
    }

    /// Sets the destination folder.
    #[must_use]
    pub fn folder(mut self, value: impl Into<String>) -> Self {
        self.folder = value.into();
        self
    }

    /// Sets the file name prefix.
    #[must_use]
    pub fn file_name_prefix(mut self, value: impl Into<String>) -> Self {
        self.file_name_prefix = value.into();
        self
    }

    /// Builds and validates the [`ExportRequest`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] when any required field is empty.
    pub fn build(self) -> Result<ExportRequest, ExportError> {
        let request = ExportRequest {
            table: self.table,
            description: self.description.trim().to_owned(),
            folder: self.folder.trim().to_owned(),
            file_name_prefix: self.file_name_prefix.trim().to_owned(),
            file_format: self.file_format.trim().to_owned(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Acknowledgment returned once the platform has queued an export.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportHandle {
    /// Provider specific operation name, used to query progress later.
    pub operation: String,
    /// Variable whose table was queued.
    pub variable: Variable,
    /// Task description echoed back for reporting.
    pub description: String,
}

/// Progress of a previously queued export as reported by the platform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportStatus {
    /// Operation name.
    pub operation: String,
    /// Provider reported state, for example `RUNNING` or `SUCCEEDED`.
    pub state: String,
    /// Task description.
    pub description: Option<String>,
    /// Whether the operation has finished, successfully or not.
    pub done: bool,
    /// Failure message when the operation finished with an error.
    pub error: Option<String>,
}

/// Errors raised by export requests independent of the provider.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ExportError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by export backends.
pub trait ExportBackend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Queues an export and returns as soon as the platform acknowledges it.
    fn submit<'a>(
        &'a self,
        request: &'a ExportRequest,
    ) -> BackendFuture<'a, ExportHandle, Self::Error>;

    /// Fetches the current status of a queued export.
    fn status<'a>(&'a self, operation: &'a str) -> BackendFuture<'a, ExportStatus, Self::Error>;
}
