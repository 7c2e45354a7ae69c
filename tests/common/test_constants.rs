//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

/// Boundary asset used by scenarios that do not rely on the default.
pub const BOUNDARY_ASSET: &str = "projects/demo/assets/districts";

/// Number of polygons assumed in the boundary collection when checking row
/// counts.
pub const POLYGONS: usize = 36;
