//! Assembly of per-year zonal results into one combined table per variable.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::info;

use crate::expression::FeatureCollection;
use crate::source::{SourceError, SourceRule};
use crate::variable::{Variable, YearRange};
use crate::zonal::ZonalRequest;

/// Errors raised while assembling a combined table.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TableError {
    /// A year could not be mapped to a source image.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// No years were requested.
    #[error("no years requested for {0}")]
    EmptyYearRange(Variable),
    /// The same year was requested more than once.
    #[error("year {year} requested more than once for {variable}")]
    DuplicateYear {
        /// Variable being assembled.
        variable: Variable,
        /// Repeated year.
        year: i32,
    },
}

/// Flattened union of every year's rows for one variable.
///
/// The table is an immutable description; the rows only exist once the
/// platform evaluates the export.
#[derive(Clone, Debug, PartialEq)]
pub struct CombinedTable {
    variable: Variable,
    years: YearRange,
    collection: FeatureCollection,
}

impl CombinedTable {
    /// Variable tagged on every row.
    #[must_use]
    pub const fn variable(&self) -> Variable {
        self.variable
    }

    /// Years contributing rows, in assembly order.
    #[must_use]
    pub const fn years(&self) -> &YearRange {
        &self.years
    }

    /// Deferred feature collection handed to the exporter.
    #[must_use]
    pub const fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Rows the export produces for `polygons` boundary features.
    #[must_use]
    pub fn expected_rows(&self, polygons: usize) -> usize {
        polygons.saturating_mul(self.years.len())
    }
}

/// Builds [`CombinedTable`]s against one boundary collection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableAssembler {
    boundary_asset: String,
    crs: String,
}

impl TableAssembler {
    /// Creates an assembler reducing over `boundary_asset` in `crs`.
    #[must_use]
    pub fn new(boundary_asset: impl Into<String>, crs: impl Into<String>) -> Self {
        Self {
            boundary_asset: boundary_asset.into(),
            crs: crs.into(),
        }
    }

    /// Builds the combined table for `variable` over `years`.
    ///
    /// Every year is validated before any part is built, so a bad year never
    /// yields a partial table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError`] when `years` is empty, repeats a year, or holds
    /// a year outside the variable's range.
    pub fn assemble(
        &self,
        variable: Variable,
        years: &YearRange,
    ) -> Result<CombinedTable, TableError> {
        let rules = Self::resolve_rules(variable, years)?;
        let boundaries = FeatureCollection::load(&self.boundary_asset);

        let parts = rules
            .into_iter()
            .map(|(year, rule)| {
                info!("Collecting {variable} for {year}...");
                ZonalRequest::for_variable(variable, year, &self.crs)
                    .aggregate(rule.image(year), boundaries.clone())
            })
            .collect();

        Ok(CombinedTable {
            variable,
            years: years.clone(),
            collection: FeatureCollection::from_collections(parts).flatten(),
        })
    }

    fn resolve_rules(
        variable: Variable,
        years: &YearRange,
    ) -> Result<Vec<(i32, SourceRule)>, TableError> {
        if years.is_empty() {
            return Err(TableError::EmptyYearRange(variable));
        }
        let mut seen = BTreeSet::new();
        years
            .iter()
            .map(|year| {
                if !seen.insert(year) {
                    return Err(TableError::DuplicateYear { variable, year });
                }
                Ok((year, SourceRule::select(variable, year)?))
            })
            .collect()
    }
}
