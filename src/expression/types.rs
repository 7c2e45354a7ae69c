//! Typed wrappers over [`Value`] for the platform objects this crate uses.
//!
//! Each wrapper only exposes the algorithms the exports need. Method names
//! follow the platform's client libraries; argument names follow the REST
//! algorithm signatures.

use std::collections::BTreeMap;

use super::Value;

const MAP_PARAMETER: &str = "_MAPPING_VAR_0_0";
const TIME_START_PROPERTY: &str = "system:time_start";

macro_rules! wrapper {
    ($name:ident) => {
        impl $name {
            /// Borrows the underlying graph node.
            #[must_use]
            pub const fn as_value(&self) -> &Value {
                &self.0
            }

            /// Consumes the wrapper, returning the graph node.
            #[must_use]
            pub fn into_value(self) -> Value {
                self.0
            }
        }

        impl From<$name> for Value {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Single raster image.
#[derive(Clone, Debug, PartialEq)]
pub struct Image(Value);

/// Collection of raster images.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageCollection(Value);

/// Collection of vector features.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureCollection(Value);

/// Collection filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter(Value);

wrapper!(Image);
wrapper!(ImageCollection);
wrapper!(FeatureCollection);
wrapper!(Filter);

/// Pixel reducers available to the exports.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Reducer {
    /// Sum of unmasked pixel values.
    Sum,
    /// Mean of unmasked pixel values.
    Mean,
    /// Most frequent value.
    Mode,
}

impl Reducer {
    /// Platform algorithm constructing this reducer.
    #[must_use]
    pub const fn algorithm(self) -> &'static str {
        match self {
            Self::Sum => "Reducer.sum",
            Self::Mean => "Reducer.mean",
            Self::Mode => "Reducer.mode",
        }
    }

    /// Builds the reducer node.
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::call(self.algorithm()).build()
    }
}

impl Image {
    /// Loads a single image asset.
    #[must_use]
    pub fn load(asset_id: &str) -> Self {
        Self(Value::call("Image.load").arg("id", asset_id).build())
    }

    /// Creates a constant image.
    #[must_use]
    pub fn constant(value: i64) -> Self {
        Self(Value::call("Image.constant").arg("value", value).build())
    }

    /// Keeps only the named band.
    #[must_use]
    pub fn select(self, band: &str) -> Self {
        Self(
            Value::call("Image.select")
                .arg("input", self)
                .arg("bandSelectors", Value::strings([band]))
                .build(),
        )
    }

    /// Per-pixel equality test against a constant.
    #[must_use]
    pub fn equals(self, value: i64) -> Self {
        Self(
            Value::call("Image.eq")
                .arg("image1", self)
                .arg("image2", Self::constant(value))
                .build(),
        )
    }

    /// Masks every pixel whose value is zero.
    #[must_use]
    pub fn self_mask(self) -> Self {
        Self(Value::call("Image.selfMask").arg("image", self).build())
    }

    /// Reduces the image over every feature of `collection`.
    #[must_use]
    pub fn reduce_regions(
        self,
        collection: FeatureCollection,
        reducer: Reducer,
        scale: u32,
        crs: &str,
    ) -> FeatureCollection {
        FeatureCollection(
            Value::call("Image.reduceRegions")
                .arg("image", self)
                .arg("collection", collection)
                .arg("reducer", reducer.to_value())
                .arg("scale", scale)
                .arg("crs", crs)
                .build(),
        )
    }
}

impl ImageCollection {
    /// Loads an image collection asset.
    #[must_use]
    pub fn load(asset_id: &str) -> Self {
        Self(Value::call("ImageCollection.load").arg("id", asset_id).build())
    }

    /// Keeps images matching `filter`.
    #[must_use]
    pub fn filter(self, filter: Filter) -> Self {
        Self(
            Value::call("Collection.filter")
                .arg("collection", self)
                .arg("filter", filter)
                .build(),
        )
    }

    /// Keeps images whose start time lies in `[start, end)`.
    #[must_use]
    pub fn filter_date(self, start: &str, end: &str) -> Self {
        self.filter(Filter::date(start, end))
    }

    /// Keeps only the named band on every image.
    #[must_use]
    pub fn select(self, band: &str) -> Self {
        let per_image =
            Value::lambda(MAP_PARAMETER, |image| Image(image).select(band).into_value());
        Self(
            Value::call("Collection.map")
                .arg("collection", self)
                .arg("baseAlgorithm", per_image)
                .build(),
        )
    }

    /// First image of the collection.
    #[must_use]
    pub fn first(self) -> Image {
        Image(Value::call("Collection.first").arg("collection", self).build())
    }

    /// Per-pixel temporal reduction.
    #[must_use]
    pub fn reduce(self, reducer: Reducer) -> Image {
        Image(
            Value::call("ImageCollection.reduce")
                .arg("collection", self)
                .arg("reducer", reducer.to_value())
                .build(),
        )
    }

    /// Per-pixel temporal mean.
    #[must_use]
    pub fn mean(self) -> Image {
        Image(Value::call("reduce.mean").arg("collection", self).build())
    }
}

impl FeatureCollection {
    /// Loads a table asset.
    #[must_use]
    pub fn load(table_id: &str) -> Self {
        Self(
            Value::call("Collection.loadTable")
                .arg("tableId", table_id)
                .build(),
        )
    }

    /// Builds a collection of collections from `parts`.
    #[must_use]
    pub fn from_collections(parts: Vec<Self>) -> Self {
        Self(
            Value::call("Collection")
                .arg(
                    "features",
                    Value::Array(parts.into_iter().map(Self::into_value).collect()),
                )
                .build(),
        )
    }

    /// Flattens a collection of collections into one collection.
    #[must_use]
    pub fn flatten(self) -> Self {
        Self(Value::call("Collection.flatten").arg("collection", self).build())
    }

    /// Sets `properties` on every feature.
    #[must_use]
    pub fn set_properties(self, properties: BTreeMap<String, Value>) -> Self {
        let per_feature = Value::lambda(MAP_PARAMETER, |feature| {
            Value::call("Element.setMulti")
                .arg("object", feature)
                .arg("properties", Value::Dictionary(properties))
                .build()
        });
        Self(
            Value::call("Collection.map")
                .arg("collection", self)
                .arg("baseAlgorithm", per_feature)
                .build(),
        )
    }
}

impl Filter {
    /// Matches elements whose calendar `field` lies in `[start, end]`.
    #[must_use]
    pub fn calendar_range(start: i64, end: i64, field: &str) -> Self {
        Self(
            Value::call("Filter.calendarRange")
                .arg("start", start)
                .arg("end", end)
                .arg("field", field)
                .build(),
        )
    }

    /// Matches elements whose start time lies in `[start, end)`.
    #[must_use]
    pub fn date(start: &str, end: &str) -> Self {
        let range = Value::call("DateRange")
            .arg("start", start)
            .arg("end", end)
            .build();
        Self(
            Value::call("Filter.dateRangeContains")
                .arg("leftValue", range)
                .arg("rightField", TIME_START_PROPERTY)
                .build(),
        )
    }
}
