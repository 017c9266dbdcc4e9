//! Geohash encoding and circle-covering prefix computation.
//!
//! The store indexes every record by a geohash alongside its coordinates,
//! and the query engine's initial scan reads only the geohash buckets that
//! can contain members. A circle is covered by the cell containing its
//! center plus the eight neighboring cells, at a precision chosen so a
//! single cell spans at least the circle's extent in both axes.

use std::collections::BTreeSet;

use super::error::{GeoError, Result};
use super::types::GeoPoint;

/// Geohash length stored with each record.
///
/// Ten characters resolve to well under a meter, finer than any practical
/// query radius.
pub const STORED_GEOHASH_PRECISION: usize = 10;

/// Meters per degree of latitude.
const METERS_PER_LATITUDE_DEGREE: f64 = 110_574.0;

/// Meters per degree of longitude at the equator; scaled by cos(latitude)
/// away from it.
const METERS_PER_LONGITUDE_DEGREE: f64 = 111_320.0;

/// Cell extent in degrees (longitude width, latitude height) for each
/// geohash precision. Cells halve alternately in each axis as precision
/// grows.
const CELL_DEGREES: [(f64, f64); 9] = [
    (45.0, 45.0),                 // 1
    (11.25, 5.625),               // 2
    (1.406_25, 1.406_25),         // 3
    (0.351_562_5, 0.175_781_25),  // 4
    (0.043_945_312_5, 0.043_945_312_5), // 5
    (0.010_986_328_125, 0.005_493_164_062_5), // 6
    (0.001_373_291_015_625, 0.001_373_291_015_625), // 7
    (0.000_343_322_753_906_25, 0.000_171_661_376_953_125), // 8
    (0.000_042_915_344_238_281_25, 0.000_042_915_344_238_281_25), // 9
];

/// Encodes a point to a geohash string of the given length.
///
/// # Errors
///
/// Returns [`GeoError::Geohash`] if encoding fails. With a validated
/// [`GeoPoint`] this does not happen in practice.
pub fn encode_geohash(point: GeoPoint, precision: usize) -> Result<String> {
    geohash::encode(
        geohash::Coord {
            x: point.longitude,
            y: point.latitude,
        },
        precision,
    )
    .map_err(|e| GeoError::Geohash(e.to_string()))
}

/// Picks the finest geohash precision whose cells span at least the
/// circle's extent in both axes, so the center cell plus its eight
/// neighbors cover the circle.
///
/// The longitude extent grows with latitude (a fixed-meter radius spans
/// more degrees away from the equator); near the poles no precision
/// qualifies and the caller falls back to a full scan.
fn covering_precision(center: GeoPoint, radius_meters: f64) -> Option<usize> {
    let lat_extent = radius_meters / METERS_PER_LATITUDE_DEGREE;

    let shrink = center.latitude.to_radians().cos();
    if shrink <= 0.0 {
        return None;
    }
    let lng_extent = radius_meters / (METERS_PER_LONGITUDE_DEGREE * shrink);

    CELL_DEGREES
        .iter()
        .rposition(|&(width, height)| width >= lng_extent && height >= lat_extent)
        .map(|idx| idx + 1)
}

/// Computes the set of geohash prefixes whose buckets cover a circle.
///
/// Returns the center cell and its eight neighbors at a radius-derived
/// precision. When the circle is too large for bucketing (or a neighbor
/// cannot be computed near a pole), the result degrades to the single
/// empty prefix, which matches every record.
///
/// # Example
///
/// ```
/// use geofence_core::geo::{covering_prefixes, GeoPoint};
///
/// let center = GeoPoint::new(37.7749, -122.4194).unwrap();
/// let prefixes = covering_prefixes(center, 1_000.0);
/// assert!(prefixes.len() <= 9);
/// assert!(!prefixes.contains(""));
/// ```
#[must_use]
pub fn covering_prefixes(center: GeoPoint, radius_meters: f64) -> BTreeSet<String> {
    let full_scan = || BTreeSet::from([String::new()]);

    let Some(precision) = covering_precision(center, radius_meters) else {
        return full_scan();
    };

    let Ok(cell) = encode_geohash(center, precision) else {
        return full_scan();
    };

    match geohash::neighbors(&cell) {
        Ok(neighbors) => {
            let mut prefixes = BTreeSet::from([
                neighbors.n,
                neighbors.ne,
                neighbors.e,
                neighbors.se,
                neighbors.s,
                neighbors.sw,
                neighbors.w,
                neighbors.nw,
            ]);
            prefixes.insert(cell);
            prefixes
        }
        // Neighbor lookup fails at the poles; fall back to a full scan
        // rather than missing members.
        Err(_) => full_scan(),
    }
}
