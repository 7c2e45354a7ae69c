//! Source image selection.
//!
//! Each variable draws on one or more upstream catalogues. A [`SourceRule`]
//! names exactly one catalogue recipe; [`SourceRule::select`] picks the rule
//! for a `(variable, year)` pair through explicit year-band membership tests
//! so the band boundaries can be checked in isolation.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::expression::{Filter, Image, ImageCollection, Reducer};
use crate::variable::Variable;

/// Annual MODIS land cover (500 m).
pub const MODIS_LAND_COVER: &str = "MODIS/006/MCD12Q1";
/// ESA `WorldCover` 2021 release (10 m).
pub const WORLDCOVER_2021: &str = "ESA/WorldCover/v200/2021";
/// Dynamic World near-real-time land cover (10 m).
pub const DYNAMIC_WORLD: &str = "GOOGLE/DYNAMICWORLD/V1";
/// GHSL built-up surface, one image per epoch.
pub const GHSL_BUILT_SURFACE_PREFIX: &str = "JRC/GHSL/P2023A/GHS_BUILT_S";
/// VIIRS monthly nighttime radiance, stray-light corrected.
pub const VIIRS_MONTHLY: &str = "NOAA/VIIRS/DNB/MONTHLY_V1/VCMSLCFG";

const MODIS_YEARS: RangeInclusive<i32> = i32::MIN..=2020;
const WORLDCOVER_YEAR: i32 = 2021;
const DYNAMIC_WORLD_FROM: i32 = 2022;

const MODIS_BAND: &str = "LC_Type1";
const MODIS_CROPLAND_CLASS: i64 = 12;
const WORLDCOVER_BAND: &str = "Map";
const WORLDCOVER_CROPLAND_CLASS: i64 = 40;
const DYNAMIC_WORLD_BAND: &str = "label";
const DYNAMIC_WORLD_CROPLAND_CLASS: i64 = 1;
const GHSL_BAND: &str = "built_surface";
const VIIRS_BAND: &str = "avg_rad";

/// Raised when a source image cannot be selected.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SourceError {
    /// The year lies outside the variable's supported year range.
    #[error("{variable} has no source image for {year}")]
    UnsupportedYear {
        /// Variable requested.
        variable: Variable,
        /// Year requested.
        year: i32,
    },
}

/// One catalogue recipe producing a single-band image for a year.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SourceRule {
    /// MODIS annual land cover, cropland class only.
    ModisCropland,
    /// `WorldCover` 2021 map, cropland class only.
    WorldCoverCropland,
    /// Dynamic World, per-pixel modal label for the year, cropland only.
    DynamicWorldCropland,
    /// GHSL built-up surface for the epoch.
    GhslBuiltSurface,
    /// VIIRS monthly radiance averaged over the year.
    ViirsAnnualMean,
}

impl SourceRule {
    /// Selects the rule for `variable` in `year`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::UnsupportedYear`] when `year` lies outside the
    /// variable's year range.
    pub fn select(variable: Variable, year: i32) -> Result<Self, SourceError> {
        if !variable.supports(year) {
            return Err(SourceError::UnsupportedYear { variable, year });
        }
        let rule = match variable {
            Variable::Cropland if MODIS_YEARS.contains(&year) => Self::ModisCropland,
            Variable::Cropland if year == WORLDCOVER_YEAR => Self::WorldCoverCropland,
            Variable::Cropland if year >= DYNAMIC_WORLD_FROM => Self::DynamicWorldCropland,
            Variable::Cropland => return Err(SourceError::UnsupportedYear { variable, year }),
            Variable::Builtup => Self::GhslBuiltSurface,
            Variable::Nightlight => Self::ViirsAnnualMean,
        };
        Ok(rule)
    }

    /// Catalogue asset the rule reads for `year`.
    #[must_use]
    pub fn asset_id(self, year: i32) -> String {
        match self {
            Self::ModisCropland => MODIS_LAND_COVER.to_owned(),
            Self::WorldCoverCropland => WORLDCOVER_2021.to_owned(),
            Self::DynamicWorldCropland => DYNAMIC_WORLD.to_owned(),
            Self::GhslBuiltSurface => format!("{GHSL_BUILT_SURFACE_PREFIX}/{year}"),
            Self::ViirsAnnualMean => VIIRS_MONTHLY.to_owned(),
        }
    }

    /// Builds the image expression for `year`.
    #[must_use]
    pub fn image(self, year: i32) -> Image {
        let asset = self.asset_id(year);
        match self {
            Self::ModisCropland => ImageCollection::load(&asset)
                .filter(Filter::calendar_range(
                    i64::from(year),
                    i64::from(year),
                    "year",
                ))
                .first()
                .select(MODIS_BAND)
                .equals(MODIS_CROPLAND_CLASS)
                .self_mask(),
            Self::WorldCoverCropland => Image::load(&asset)
                .select(WORLDCOVER_BAND)
                .equals(WORLDCOVER_CROPLAND_CLASS)
                .self_mask(),
            Self::DynamicWorldCropland => {
                let (start, end) = calendar_year(year);
                ImageCollection::load(&asset)
                    .filter_date(&start, &end)
                    .select(DYNAMIC_WORLD_BAND)
                    .reduce(Reducer::Mode)
                    .equals(DYNAMIC_WORLD_CROPLAND_CLASS)
                    .self_mask()
            }
            Self::GhslBuiltSurface => Image::load(&asset).select(GHSL_BAND),
            Self::ViirsAnnualMean => {
                let (start, end) = calendar_year(year);
                ImageCollection::load(&asset)
                    .filter_date(&start, &end)
                    .select(VIIRS_BAND)
                    .mean()
            }
        }
    }
}

/// Selects and builds the source image for `variable` in `year`.
///
/// # Errors
///
/// Returns [`SourceError::UnsupportedYear`] when `year` lies outside the
/// variable's year range.
pub fn source_image(variable: Variable, year: i32) -> Result<Image, SourceError> {
    SourceRule::select(variable, year).map(|rule| rule.image(year))
}

fn calendar_year(year: i32) -> (String, String) {
    (format!("{year}-01-01"), format!("{year}-12-31"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Value;
    use rstest::rstest;

    #[test]
    fn cropland_years_partition_into_three_disjoint_bands() {
        for year in Variable::Cropland.year_range().iter() {
            let rule = SourceRule::select(Variable::Cropland, year)
                .unwrap_or_else(|err| panic!("{year} should be supported: {err}"));
            let expected = if year <= 2020 {
                SourceRule::ModisCropland
            } else if year == 2021 {
                SourceRule::WorldCoverCropland
            } else {
                SourceRule::DynamicWorldCropland
            };
            assert_eq!(rule, expected, "year {year}");
        }
    }

    #[rstest]
    #[case(2020, SourceRule::ModisCropland)]
    #[case(2021, SourceRule::WorldCoverCropland)]
    #[case(2022, SourceRule::DynamicWorldCropland)]
    fn cropland_band_edges(#[case] year: i32, #[case] expected: SourceRule) {
        assert_eq!(SourceRule::select(Variable::Cropland, year), Ok(expected));
    }

    #[test]
    fn builtup_resolves_one_image_per_epoch() {
        for year in Variable::Builtup.year_range().iter() {
            let image = source_image(Variable::Builtup, year)
                .unwrap_or_else(|err| panic!("{year} should be supported: {err}"));
            let load = image
                .as_value()
                .argument("input")
                .unwrap_or_else(|| panic!("select input"));
            assert_eq!(load.function_name(), Some("Image.load"));
            assert_eq!(
                load.argument("id"),
                Some(&Value::string(format!("JRC/GHSL/P2023A/GHS_BUILT_S/{year}")))
            );
        }
    }

    #[rstest]
    #[case(Variable::Builtup, 2001)]
    #[case(Variable::Builtup, 2030)]
    #[case(Variable::Cropland, 2009)]
    #[case(Variable::Cropland, 2026)]
    #[case(Variable::Nightlight, 1999)]
    fn out_of_range_years_fail_fast(#[case] variable: Variable, #[case] year: i32) {
        assert_eq!(
            SourceRule::select(variable, year),
            Err(SourceError::UnsupportedYear { variable, year })
        );
    }

    #[test]
    fn cropland_images_are_masked_to_the_cropland_class() {
        for year in [2015, 2021, 2024] {
            let image = source_image(Variable::Cropland, year)
                .unwrap_or_else(|err| panic!("{year}: {err}"));
            assert_eq!(image.as_value().function_name(), Some("Image.selfMask"));
            assert!(image.as_value().invokes("Image.eq"), "{year}");
        }
    }

    #[test]
    fn modis_rule_filters_by_calendar_year() {
        let image = SourceRule::ModisCropland.image(2012);
        assert!(image.as_value().invokes("Filter.calendarRange"));
        assert!(image.as_value().invokes("Collection.first"));
    }

    #[test]
    fn dynamic_world_rule_takes_the_modal_label() {
        let image = SourceRule::DynamicWorldCropland.image(2023);
        assert!(image.as_value().invokes("ImageCollection.reduce"));
        assert!(image.as_value().invokes("Reducer.mode"));
        assert!(image.as_value().invokes("Filter.dateRangeContains"));
    }

    #[test]
    fn nightlight_rule_averages_the_year() {
        let image = source_image(Variable::Nightlight, 2018)
            .unwrap_or_else(|err| panic!("2018: {err}"));
        assert_eq!(image.as_value().function_name(), Some("reduce.mean"));
        assert!(!image.as_value().invokes("Image.selfMask"));
    }
}
