//! Configuration loading via `ortho-config`.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::export::{ExportError, ExportRequest};
use crate::table::{CombinedTable, TableAssembler};
use crate::variable::Variable;

/// Default REST endpoint of the Earth Engine API.
pub const DEFAULT_API_BASE: &str = "https://earthengine.googleapis.com/v1";
/// Default boundary collection: tehsils of Punjab.
pub const DEFAULT_BOUNDARY_ASSET: &str = "projects/ee-malikiftikhar273/assets/tehsils_punjab";
/// Default Drive folder receiving the CSV files.
pub const DEFAULT_EXPORT_FOLDER: &str = "GEE_exports";
/// Default region label used in file names and task descriptions.
pub const DEFAULT_REGION_LABEL: &str = "punjab_buffer";
/// Default coordinate reference system for every aggregation.
pub const DEFAULT_CRS: &str = "EPSG:4326";

const CONFIG_FILE: &str = "zonal-export.toml";
const DESCRIPTION_SUFFIX: &str = "AllYears";

/// Earth Engine settings derived from environment variables and
/// configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "EE",
    discovery(
        app_name = "zonal-export",
        env_var = "ZONAL_EXPORT_CONFIG_PATH",
        config_file_name = "zonal-export.toml",
        dotfile_name = ".zonal-export.toml",
        project_file_name = "zonal-export.toml"
    )
)]
pub struct EarthEngineConfig {
    /// Cloud project that owns the export tasks. Required to submit.
    pub project: Option<String>,
    /// OAuth bearer token, for example from `gcloud auth print-access-token`.
    /// Required to submit.
    pub access_token: Option<String>,
    /// REST endpoint. Defaults to the public v1 API.
    #[ortho_config(default = DEFAULT_API_BASE.to_owned())]
    pub api_base: String,
    /// Table asset holding the boundary polygons.
    #[ortho_config(default = DEFAULT_BOUNDARY_ASSET.to_owned())]
    pub boundary_asset: String,
    /// Drive folder receiving the exported files.
    #[ortho_config(default = DEFAULT_EXPORT_FOLDER.to_owned())]
    pub export_folder: String,
    /// Region label appended to file name prefixes and task descriptions.
    #[ortho_config(default = DEFAULT_REGION_LABEL.to_owned())]
    pub region_label: String,
    /// Coordinate reference system used for every aggregation.
    #[ortho_config(default = DEFAULT_CRS.to_owned())]
    pub crs: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl Default for EarthEngineConfig {
    fn default() -> Self {
        Self {
            project: None,
            access_token: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            boundary_asset: DEFAULT_BOUNDARY_ASSET.to_owned(),
            export_folder: DEFAULT_EXPORT_FOLDER.to_owned(),
            region_label: DEFAULT_REGION_LABEL.to_owned(),
            crs: DEFAULT_CRS.to_owned(),
        }
    }
}

impl EarthEngineConfig {
    fn require_field(value: Option<&str>, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.is_none_or(|text| text.trim().is_empty()) {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to {CONFIG_FILE}",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("zonal-export")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Checks the fields needed to build requests. Credentials are not
    /// required, so dry runs work without them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            Some(&self.api_base),
            &FieldMetadata::new("API endpoint", "EE_API_BASE", "api_base"),
        )?;
        Self::require_field(
            Some(&self.boundary_asset),
            &FieldMetadata::new("boundary asset", "EE_BOUNDARY_ASSET", "boundary_asset"),
        )?;
        Self::require_field(
            Some(&self.export_folder),
            &FieldMetadata::new("export folder", "EE_EXPORT_FOLDER", "export_folder"),
        )?;
        Self::require_field(
            Some(&self.region_label),
            &FieldMetadata::new("region label", "EE_REGION_LABEL", "region_label"),
        )?;
        Self::require_field(
            Some(&self.crs),
            &FieldMetadata::new("coordinate reference system", "EE_CRS", "crs"),
        )?;
        Ok(())
    }

    /// Checks the fields needed to talk to the API, on top of
    /// [`EarthEngineConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the project or access token
    /// is missing.
    pub fn validate_credentials(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Self::require_field(
            self.project.as_deref(),
            &FieldMetadata::new("Earth Engine cloud project", "EE_PROJECT", "project"),
        )?;
        Self::require_field(
            self.access_token.as_deref(),
            &FieldMetadata::new("OAuth access token", "EE_ACCESS_TOKEN", "access_token"),
        )?;
        Ok(())
    }

    /// Table assembler reducing over the configured boundaries and CRS.
    #[must_use]
    pub fn assembler(&self) -> TableAssembler {
        TableAssembler::new(self.boundary_asset.trim(), self.crs.trim())
    }

    /// File name prefix for `variable`, for example `cropland_punjab_buffer`.
    #[must_use]
    pub fn file_name_prefix(&self, variable: Variable) -> String {
        format!("{}_{}", variable.name(), self.region_label.trim())
    }

    /// Task description for `variable`, for example
    /// `Cropland_Punjab_Buffer_AllYears`.
    #[must_use]
    pub fn description(&self, variable: Variable) -> String {
        let mut words = vec![capitalise(variable.name())];
        words.extend(
            self.region_label
                .trim()
                .split('_')
                .filter(|word| !word.is_empty())
                .map(capitalise),
        );
        words.push(DESCRIPTION_SUFFIX.to_owned());
        words.join("_")
    }

    /// Builds the export request for `table` using the configured folder
    /// and naming.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn export_request(&self, table: CombinedTable) -> Result<ExportRequest, ConfigError> {
        self.validate()?;
        let variable = table.variable();
        ExportRequest::builder(table)
            .description(self.description(variable))
            .folder(&self.export_folder)
            .file_name_prefix(self.file_name_prefix(variable))
            .build()
            .map_err(ConfigError::from)
    }
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when the configured values produce an invalid export request.
    #[error("invalid export request: {0}")]
    Request(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

impl From<ExportError> for ConfigError {
    fn from(value: ExportError) -> Self {
        Self::Request(value.to_string())
    }
}
