//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::export::{BackendFuture, ExportBackend, ExportHandle, ExportRequest, ExportStatus};
use crate::variable::Variable;

/// Errors produced by [`RecordingBackend`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RecordingError {
    /// The backend was scripted to reject submissions for this variable.
    #[error("submission rejected for {0}")]
    Rejected(Variable),
    /// No status was seeded for the operation.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

#[derive(Debug, Default)]
struct RecordingState {
    submissions: Vec<ExportRequest>,
    rejected: BTreeSet<Variable>,
    statuses: BTreeMap<String, ExportStatus>,
}

/// Export backend double that records submissions instead of calling a
/// remote service.
///
/// Operation names follow `operations/<n>-<variable>` where `n` counts
/// accepted submissions from one. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    state: Arc<StdMutex<RecordingState>>,
}

impl RecordingBackend {
    /// Creates a backend that accepts every submission.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RecordingState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Makes every later submission of `variable` fail.
    pub fn reject_variable(&self, variable: Variable) {
        self.with_state(|state| state.rejected.insert(variable));
    }

    /// Seeds the status returned for `status.operation`.
    pub fn seed_status(&self, status: ExportStatus) {
        self.with_state(|state| state.statuses.insert(status.operation.clone(), status));
    }

    /// Returns a snapshot of all accepted submissions, in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<ExportRequest> {
        self.with_state(|state| state.submissions.clone())
    }
}

impl ExportBackend for RecordingBackend {
    type Error = RecordingError;

    fn submit<'a>(
        &'a self,
        request: &'a ExportRequest,
    ) -> BackendFuture<'a, ExportHandle, Self::Error> {
        Box::pin(async move {
            let variable = request.variable();
            self.with_state(|state| {
                if state.rejected.contains(&variable) {
                    return Err(RecordingError::Rejected(variable));
                }
                state.submissions.push(request.clone());
                Ok(ExportHandle {
                    operation: format!("operations/{}-{variable}", state.submissions.len()),
                    variable,
                    description: request.description.clone(),
                })
            })
        })
    }

    fn status<'a>(&'a self, operation: &'a str) -> BackendFuture<'a, ExportStatus, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| {
                state
                    .statuses
                    .get(operation)
                    .cloned()
                    .ok_or_else(|| RecordingError::UnknownOperation(operation.to_owned()))
            })
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and removes environment variables while holding a global mutex.
    ///
    /// Pairs with a `None` value are removed for the guard's lifetime.
    pub async fn apply(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::apply"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(text) => env::set_var(key, text),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
