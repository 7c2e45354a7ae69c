//! Builds and submits one combined table export per variable.
//!
//! Every table and request of a plan is built before the first submission,
//! so a year no catalogue covers fails the run with nothing queued. The
//! requests are then submitted strictly in sequence. Submission only waits
//! for the platform's acknowledgment; the exports themselves run remotely and
//! are never polled here.

use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, EarthEngineConfig};
use crate::export::{ExportBackend, ExportHandle, ExportRequest};
use crate::table::TableError;
use crate::variable::{Variable, YearRange};

/// Errors surfaced while preparing or submitting exports.
#[derive(Debug, Error)]
pub enum PipelineError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when a table cannot be assembled.
    #[error("failed to assemble {variable} table: {source}")]
    Table {
        /// Variable being assembled.
        variable: Variable,
        /// Underlying assembly error.
        #[source]
        source: TableError,
    },
    /// Raised when the configuration yields an invalid request.
    #[error("failed to prepare {variable} export: {source}")]
    Request {
        /// Variable being prepared.
        variable: Variable,
        /// Underlying configuration error.
        #[source]
        source: ConfigError,
    },
    /// Raised when the backend rejects a submission.
    #[error("failed to submit {variable} export: {source}")]
    Submit {
        /// Variable being submitted.
        variable: Variable,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
}

/// Variables and years selected for one run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExportPlan {
    entries: Vec<(Variable, YearRange)>,
}

impl ExportPlan {
    /// Every variable over its full year range, in submission order.
    #[must_use]
    pub fn all() -> Self {
        Self::for_variables(&Variable::ALL)
    }

    /// The given variables over their full year ranges.
    ///
    /// Repeated variables are kept once, in first-seen order.
    #[must_use]
    pub fn for_variables(variables: &[Variable]) -> Self {
        let mut entries: Vec<(Variable, YearRange)> = Vec::with_capacity(variables.len());
        for variable in variables {
            if entries.iter().all(|(seen, _)| seen != variable) {
                entries.push((*variable, variable.year_range()));
            }
        }
        Self { entries }
    }

    /// Replaces the year range of every selected variable with `years`.
    #[must_use]
    pub fn with_years(self, years: &YearRange) -> Self {
        Self {
            entries: self
                .entries
                .into_iter()
                .map(|(variable, _)| (variable, years.clone()))
                .collect(),
        }
    }

    /// Selected variables with their year ranges.
    #[must_use]
    pub fn entries(&self) -> &[(Variable, YearRange)] {
        &self.entries
    }
}

/// Prepares export requests from configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestFactory {
    config: EarthEngineConfig,
}

impl RequestFactory {
    /// Creates a factory using `config` for assets, naming, and CRS.
    #[must_use]
    pub const fn new(config: EarthEngineConfig) -> Self {
        Self { config }
    }

    /// Assembles the table for `variable` over `years` and wraps it in an
    /// export request.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Table`] or [`PipelineError::Request`] when the
    /// table or request cannot be built.
    pub fn prepare<E>(
        &self,
        variable: Variable,
        years: &YearRange,
    ) -> Result<ExportRequest, PipelineError<E>>
    where
        E: std::error::Error + 'static,
    {
        let table = self
            .config
            .assembler()
            .assemble(variable, years)
            .map_err(|source| PipelineError::Table { variable, source })?;
        self.config
            .export_request(table)
            .map_err(|source| PipelineError::Request { variable, source })
    }

    /// Prepares every request of `plan`, in plan order.
    ///
    /// # Errors
    ///
    /// Returns the first [`PipelineError`] encountered.
    pub fn prepare_all<E>(&self, plan: &ExportPlan) -> Result<Vec<ExportRequest>, PipelineError<E>>
    where
        E: std::error::Error + 'static,
    {
        plan.entries()
            .iter()
            .map(|(variable, years)| self.prepare(*variable, years))
            .collect()
    }
}

/// Submits export plans through a backend.
#[derive(Debug)]
pub struct ExportOrchestrator<B> {
    backend: B,
    requests: RequestFactory,
}

impl<B: ExportBackend> ExportOrchestrator<B> {
    /// Creates a new orchestrator.
    #[must_use]
    pub const fn new(backend: B, config: EarthEngineConfig) -> Self {
        Self {
            backend,
            requests: RequestFactory::new(config),
        }
    }

    /// Builds and submits one export per plan entry, in order.
    ///
    /// All requests are prepared up front; a preparation error means nothing
    /// was submitted. Exports already queued stay queued when a later
    /// submission fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for the first variable whose table, request,
    /// or submission fails.
    pub async fn execute(
        &self,
        plan: &ExportPlan,
    ) -> Result<Vec<ExportHandle>, PipelineError<B::Error>> {
        let requests = self.requests.prepare_all::<B::Error>(plan)?;
        let mut handles = Vec::with_capacity(requests.len());
        for request in &requests {
            let handle = self
                .backend
                .submit(request)
                .await
                .map_err(|source| PipelineError::Submit {
                    variable: request.variable(),
                    source,
                })?;
            handles.push(handle);
        }
        info!(
            submitted = handles.len(),
            "All export tasks started; check the Earth Engine task list for progress"
        );
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingBackend, RecordingError};
    use rstest::{fixture, rstest};

    #[fixture]
    fn config() -> EarthEngineConfig {
        EarthEngineConfig::default()
    }

    #[test]
    fn plan_all_lists_variables_in_submission_order() {
        let plan = ExportPlan::all();
        let variables: Vec<Variable> = plan.entries().iter().map(|(v, _)| *v).collect();
        assert_eq!(
            variables,
            vec![Variable::Cropland, Variable::Builtup, Variable::Nightlight]
        );
        let lengths: Vec<usize> = plan.entries().iter().map(|(_, years)| years.len()).collect();
        assert_eq!(lengths, vec![16, 6, 16]);
    }

    #[test]
    fn plan_deduplicates_variables() {
        let plan = ExportPlan::for_variables(&[Variable::Nightlight, Variable::Nightlight]);
        assert_eq!(plan.entries().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn execute_submits_each_variable_once_in_order(config: EarthEngineConfig) {
        let backend = RecordingBackend::new();
        let orchestrator = ExportOrchestrator::new(backend.clone(), config);

        let handles = orchestrator
            .execute(&ExportPlan::all())
            .await
            .unwrap_or_else(|err| panic!("execute: {err}"));

        assert_eq!(handles.len(), 3);
        let submitted: Vec<String> = backend
            .submissions()
            .iter()
            .map(|request| request.file_name_prefix.clone())
            .collect();
        assert_eq!(
            submitted,
            vec![
                "cropland_punjab_buffer",
                "builtup_punjab_buffer",
                "nightlight_punjab_buffer"
            ]
        );
    }

    #[rstest]
    #[tokio::test]
    async fn execute_stops_at_first_rejected_submission(config: EarthEngineConfig) {
        let backend = RecordingBackend::new();
        backend.reject_variable(Variable::Builtup);
        let orchestrator = ExportOrchestrator::new(backend.clone(), config);

        let err = orchestrator
            .execute(&ExportPlan::all())
            .await
            .expect_err("builtup submission should fail");

        assert!(matches!(
            err,
            PipelineError::Submit {
                variable: Variable::Builtup,
                source: RecordingError::Rejected(_),
            }
        ));
        assert_eq!(backend.submissions().len(), 1, "nightlight never submitted");
    }

    #[rstest]
    #[tokio::test]
    async fn execute_fails_fast_on_unsupported_year(config: EarthEngineConfig) {
        let backend = RecordingBackend::new();
        let orchestrator = ExportOrchestrator::new(backend.clone(), config);
        let plan = ExportPlan::for_variables(&[Variable::Builtup])
            .with_years(&YearRange::from(vec![2001]));

        let err = orchestrator
            .execute(&plan)
            .await
            .expect_err("2001 is not a GHSL epoch");

        assert!(matches!(
            err,
            PipelineError::Table {
                variable: Variable::Builtup,
                ..
            }
        ));
        assert!(backend.submissions().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn execute_checks_every_variable_before_submitting(config: EarthEngineConfig) {
        let backend = RecordingBackend::new();
        let orchestrator = ExportOrchestrator::new(backend.clone(), config);
        let plan = ExportPlan::all().with_years(&YearRange::from(vec![2021]));

        let err = orchestrator
            .execute(&plan)
            .await
            .expect_err("2021 is not a GHSL epoch");

        assert!(matches!(
            err,
            PipelineError::Table {
                variable: Variable::Builtup,
                ..
            }
        ));
        assert!(
            backend.submissions().is_empty(),
            "cropland must not be queued before builtup is checked"
        );
    }
}
