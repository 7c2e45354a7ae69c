//! Core library for the `zonal-export` tool.
//!
//! The crate describes per-polygon zonal statistics for cropland, built-up
//! surface, and nighttime light layers as Earth Engine expressions, combines
//! every year of a variable into one table, and queues each table as a CSV
//! export through an [`ExportBackend`]. An Earth Engine REST implementation
//! powers the real submissions.

pub mod config;
pub mod earthengine;
pub mod export;
pub mod expression;
pub mod pipeline;
pub mod source;
pub mod table;
pub mod test_support;
pub mod variable;
pub mod zonal;

pub use config::{ConfigError, EarthEngineConfig};
pub use earthengine::{EarthEngineBackend, EarthEngineError, ExportTableBody};
pub use export::{
    BackendFuture, ExportBackend, ExportError, ExportHandle, ExportRequest, ExportRequestBuilder,
    ExportStatus,
};
pub use pipeline::{ExportOrchestrator, ExportPlan, PipelineError, RequestFactory};
pub use source::{SourceError, SourceRule, source_image};
pub use table::{CombinedTable, TableAssembler, TableError};
pub use variable::{Variable, YearRange};
pub use zonal::ZonalRequest;
