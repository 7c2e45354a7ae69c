//! Zonal aggregation of one source image over the boundary collection.

use std::collections::BTreeMap;

use crate::expression::{FeatureCollection, Image, Reducer, Value};
use crate::variable::Variable;

/// Column holding the source year on every row.
pub const YEAR_COLUMN: &str = "year";
/// Column holding the variable tag on every row.
pub const VARIABLE_COLUMN: &str = "variable";

/// Describes one `(variable, year)` aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct ZonalRequest<'a> {
    /// Variable the rows are tagged with.
    pub variable: Variable,
    /// Year the rows are tagged with.
    pub year: i32,
    /// Reducer applied inside each polygon.
    pub reducer: Reducer,
    /// Sampling scale in metres per pixel.
    pub scale: u32,
    /// Coordinate reference system used for sampling.
    pub crs: &'a str,
}

impl<'a> ZonalRequest<'a> {
    /// Request using the variable's own reducer and scale for `year`.
    #[must_use]
    pub const fn for_variable(variable: Variable, year: i32, crs: &'a str) -> Self {
        Self {
            variable,
            year,
            reducer: variable.reducer(),
            scale: variable.scale(year),
            crs,
        }
    }

    /// Reduces `image` over `boundaries`, one row per polygon, each stamped
    /// with [`YEAR_COLUMN`] and [`VARIABLE_COLUMN`].
    #[must_use]
    pub fn aggregate(&self, image: Image, boundaries: FeatureCollection) -> FeatureCollection {
        let mut tags = BTreeMap::new();
        tags.insert(YEAR_COLUMN.to_owned(), Value::from(self.year));
        tags.insert(
            VARIABLE_COLUMN.to_owned(),
            Value::string(self.variable.name()),
        );
        image
            .reduce_regions(boundaries, self.reducer, self.scale, self.crs)
            .set_properties(tags)
    }
}
