//! Request and response bodies of the Earth Engine REST API.

use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::export::{ExportRequest, ExportStatus};

/// Body of `projects/{project}/table:export`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTableBody {
    /// Encoded table expression.
    pub expression: Expression,
    /// Task description.
    pub description: String,
    /// Idempotency key; repeated submissions with the same key queue once.
    pub request_id: String,
    /// Output format and destination.
    pub file_export_options: FileExportOptions,
}

/// Output format and destination of an export.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileExportOptions {
    /// Output file format.
    pub file_format: String,
    /// Drive destination.
    pub drive_destination: DriveDestination,
}

/// Drive folder and file name prefix.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveDestination {
    /// Folder name.
    pub folder: String,
    /// File name prefix.
    pub filename_prefix: String,
}

impl ExportTableBody {
    /// Builds the body for `request` under idempotency key `request_id`.
    #[must_use]
    pub fn new(request: &ExportRequest, request_id: impl Into<String>) -> Self {
        Self {
            expression: Expression::encode(request.table.collection().as_value()),
            description: request.description.clone(),
            request_id: request_id.into(),
            file_export_options: FileExportOptions {
                file_format: request.file_format.clone(),
                drive_destination: DriveDestination {
                    folder: request.folder.clone(),
                    filename_prefix: request.file_name_prefix.clone(),
                },
            },
        }
    }

    /// Compact JSON rendering of the body for debug logs.
    pub(crate) fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| format!("<unrenderable body: {err}>"))
    }
}

/// Long-running operation returned by export and lookup calls.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(crate) struct Operation {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) done: bool,
    #[serde(default)]
    pub(crate) metadata: Option<OperationMetadata>,
    #[serde(default)]
    pub(crate) error: Option<Status>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(crate) struct OperationMetadata {
    #[serde(default)]
    pub(crate) state: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub(crate) struct Status {
    #[serde(default)]
    pub(crate) message: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub(crate) struct ErrorEnvelope {
    pub(crate) error: Status,
}

const UNKNOWN_STATE: &str = "UNKNOWN";

impl Operation {
    pub(crate) fn into_status(self) -> ExportStatus {
        let (state, description) = self
            .metadata
            .map_or((None, None), |meta| (meta.state, meta.description));
        ExportStatus {
            operation: self.name,
            state: state.unwrap_or_else(|| UNKNOWN_STATE.to_owned()),
            description,
            done: self.done,
            error: self.error.map(|status| status.message),
        }
    }
}
