//! Exported variables, their year ranges, reducers, and sampling scales.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::expression::Reducer;

/// Years covered by the built-up surface catalogue.
pub const BUILTUP_YEARS: [i32; 6] = [2000, 2005, 2010, 2015, 2020, 2025];

const ANNUAL_FIRST_YEAR: i32 = 2010;
const ANNUAL_LAST_YEAR: i32 = 2025;
const CROPLAND_FINE_SCALE_FROM: i32 = 2021;
const CROPLAND_FINE_SCALE_M: u32 = 30;
const CROPLAND_COARSE_SCALE_M: u32 = 500;
const BUILTUP_SCALE_M: u32 = 100;
const NIGHTLIGHT_SCALE_M: u32 = 500;
/// Widest `first-last` span accepted when parsing a year list.
const MAX_SPAN_YEARS: i64 = 100;

/// Variable exported as one combined table.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Variable {
    /// Cropland extent (masked pixel count).
    Cropland,
    /// Built-up surface area.
    Builtup,
    /// Nighttime light radiance.
    Nightlight,
}

impl Variable {
    /// Every variable, in submission order.
    pub const ALL: [Self; 3] = [Self::Cropland, Self::Builtup, Self::Nightlight];

    /// Tag written to the `variable` column.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cropland => "cropland",
            Self::Builtup => "builtup",
            Self::Nightlight => "nightlight",
        }
    }

    /// Reducer applied within each boundary polygon.
    #[must_use]
    pub const fn reducer(self) -> Reducer {
        match self {
            Self::Cropland | Self::Builtup => Reducer::Sum,
            Self::Nightlight => Reducer::Mean,
        }
    }

    /// Sampling scale in metres per pixel for `year`.
    ///
    /// Cropland switches to the 10 m products from 2021 onwards and samples
    /// them at 30 m; earlier years use the 500 m annual product.
    #[must_use]
    pub const fn scale(self, year: i32) -> u32 {
        match self {
            Self::Cropland if year >= CROPLAND_FINE_SCALE_FROM => CROPLAND_FINE_SCALE_M,
            Self::Cropland => CROPLAND_COARSE_SCALE_M,
            Self::Builtup => BUILTUP_SCALE_M,
            Self::Nightlight => NIGHTLIGHT_SCALE_M,
        }
    }

    /// Full year range exported by default.
    #[must_use]
    pub fn year_range(self) -> YearRange {
        match self {
            Self::Cropland | Self::Nightlight => {
                YearRange::inclusive(ANNUAL_FIRST_YEAR, ANNUAL_LAST_YEAR)
            }
            Self::Builtup => YearRange::from(BUILTUP_YEARS.to_vec()),
        }
    }

    /// Returns `true` when `year` belongs to the default year range.
    #[must_use]
    pub fn supports(self, year: i32) -> bool {
        match self {
            Self::Cropland | Self::Nightlight => {
                (ANNUAL_FIRST_YEAR..=ANNUAL_LAST_YEAR).contains(&year)
            }
            Self::Builtup => BUILTUP_YEARS.contains(&year),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a variable name is not recognised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown variable '{0}' (expected cropland, builtup, or nightlight)")]
pub struct UnknownVariable(pub String);

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variable| variable.name().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownVariable(value.to_owned()))
    }
}

/// Ordered list of years processed for one variable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct YearRange(Vec<i32>);

impl YearRange {
    /// Every year from `first` to `last`, both included.
    #[must_use]
    pub fn inclusive(first: i32, last: i32) -> Self {
        Self((first..=last).collect())
    }

    /// Years in processing order.
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.0
    }

    /// Number of years.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the range holds no years.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the years in order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<i32>> for YearRange {
    fn from(value: Vec<i32>) -> Self {
        Self(value)
    }
}

/// Raised when a year list cannot be parsed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum YearRangeParseError {
    /// The list contained no years.
    #[error("year list must not be empty")]
    Empty,
    /// An entry was not an integer or `first-last` span.
    #[error("invalid year entry '{0}' (expected YYYY or YYYY-YYYY)")]
    Invalid(String),
    /// A `first-last` span covered 100 years or more.
    #[error("year span '{0}' covers 100 years or more")]
    SpanTooWide(String),
}

impl FromStr for YearRange {
    type Err = YearRangeParseError;

    /// Parses comma-separated years and inclusive spans, for example
    /// `2000,2010-2012`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut years = Vec::new();
        for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let invalid = || YearRangeParseError::Invalid(entry.to_owned());
            if let Some((first, last)) = entry.split_once('-') {
                let start: i32 = first.trim().parse().map_err(|_| invalid())?;
                let end: i32 = last.trim().parse().map_err(|_| invalid())?;
                if start > end {
                    return Err(invalid());
                }
                if i64::from(end) - i64::from(start) >= MAX_SPAN_YEARS {
                    return Err(YearRangeParseError::SpanTooWide(entry.to_owned()));
                }
                years.extend(start..=end);
            } else {
                years.push(entry.parse().map_err(|_| invalid())?);
            }
        }
        if years.is_empty() {
            return Err(YearRangeParseError::Empty);
        }
        Ok(Self(years))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2020, 500)]
    #[case(2021, 30)]
    #[case(2022, 30)]
    #[case(2010, 500)]
    #[case(2025, 30)]
    fn cropland_scale_switches_at_2021(#[case] year: i32, #[case] expected: u32) {
        assert_eq!(Variable::Cropland.scale(year), expected);
    }

    #[rstest]
    #[case(Variable::Builtup, 100)]
    #[case(Variable::Nightlight, 500)]
    fn fixed_scales_ignore_year(#[case] variable: Variable, #[case] expected: u32) {
        for year in variable.year_range().iter() {
            assert_eq!(variable.scale(year), expected, "{variable} {year}");
        }
    }

    #[rstest]
    #[case(Variable::Cropland, Reducer::Sum)]
    #[case(Variable::Builtup, Reducer::Sum)]
    #[case(Variable::Nightlight, Reducer::Mean)]
    fn reducers_are_fixed_per_variable(#[case] variable: Variable, #[case] expected: Reducer) {
        assert_eq!(variable.reducer(), expected);
    }

    #[test]
    fn default_year_ranges_match_catalogue_coverage() {
        assert_eq!(Variable::Cropland.year_range().len(), 16);
        assert_eq!(Variable::Nightlight.year_range().len(), 16);
        assert_eq!(
            Variable::Builtup.year_range().years(),
            &[2000, 2005, 2010, 2015, 2020, 2025]
        );
        assert_eq!(Variable::Cropland.year_range().years().first(), Some(&2010));
        assert_eq!(Variable::Cropland.year_range().years().last(), Some(&2025));
    }

    #[rstest]
    #[case("cropland", Variable::Cropland)]
    #[case(" BuiltUp ", Variable::Builtup)]
    #[case("nightlight", Variable::Nightlight)]
    fn variables_parse_case_insensitively(#[case] input: &str, #[case] expected: Variable) {
        assert_eq!(input.parse::<Variable>(), Ok(expected));
    }

    #[test]
    fn unknown_variable_is_rejected() {
        let err = "forest"
            .parse::<Variable>()
            .expect_err("forest is not exported");
        assert!(err.to_string().contains("forest"));
    }

    #[rstest]
    #[case("2021", vec![2021])]
    #[case("2000, 2025", vec![2000, 2025])]
    #[case("2010-2012,2020", vec![2010, 2011, 2012, 2020])]
    fn year_lists_parse(#[case] input: &str, #[case] expected: Vec<i32>) {
        let parsed: YearRange = input
            .parse()
            .unwrap_or_else(|err| panic!("{input} should parse: {err}"));
        assert_eq!(parsed.years(), expected.as_slice());
    }

    #[rstest]
    #[case("", YearRangeParseError::Empty)]
    #[case("twenty", YearRangeParseError::Invalid(String::from("twenty")))]
    #[case("2012-2010", YearRangeParseError::Invalid(String::from("2012-2010")))]
    #[case("0-2147483647", YearRangeParseError::SpanTooWide(String::from("0-2147483647")))]
    #[case(
        "2010,1900-2025",
        YearRangeParseError::SpanTooWide(String::from("1900-2025"))
    )]
    fn malformed_year_lists_are_rejected(
        #[case] input: &str,
        #[case] expected: YearRangeParseError,
    ) {
        assert_eq!(input.parse::<YearRange>(), Err(expected));
    }
}
