//! Antenna identification from capture file names.
//!
//! VLA capture files carry the antenna pad index in their name, e.g.,
//! `..._BD-4.0000.raw`. The index is mapped to the VLA antenna number.
use tracing::debug;

/// Marker preceding the antenna index in a file name.
pub const ANTENNA_MARKER: &str = "BD-";

/// Added to a mapped antenna number to produce the combined station id.
pub const COMBINED_ID_BASE: u32 = 12300;

/// Antenna index to antenna number.
const ANTENNAS: [(u32, u32); 13] = [
    (0, 1),
    (1, 3),
    (2, 5),
    (3, 9),
    (4, 10),
    (5, 11),
    (6, 12),
    (7, 13),
    (8, 14),
    (9, 18),
    (10, 19),
    (11, 23),
    (12, 27),
];

/// Look up the antenna number for an antenna index.
#[must_use]
pub fn lookup(index: u32) -> Option<u32> {
    ANTENNAS
        .iter()
        .find(|(idx, _)| *idx == index)
        .map(|(_, ant)| *ant)
}

/// Parse the antenna index found between [ANTENNA_MARKER] and the next `.`.
fn parse_index(filename: &str) -> Option<u32> {
    let (_, rest) = filename.split_once(ANTENNA_MARKER)?;
    let token = rest.split('.').next()?;
    token.parse::<u32>().ok()
}

/// Map `filename` to an antenna number, or `None` if the name does not contain a
/// known antenna index.
///
/// When `combined` is set the result is the combined station id, i.e., the antenna
/// number plus [COMBINED_ID_BASE].
#[must_use]
pub fn try_map_antenna(filename: &str, combined: bool) -> Option<u32> {
    let ant = lookup(parse_index(filename)?)?;
    if combined {
        Some(ant + COMBINED_ID_BASE)
    } else {
        Some(ant)
    }
}

/// Map `filename` to an antenna number. Unmapped names produce 0, which callers treat
/// as unknown.
///
/// # Example
/// ```
/// use guppi::antenna::map_antenna;
///
/// assert_eq!(map_antenna("16A-123_BD-4.0000.raw", true), 12310);
/// assert_eq!(map_antenna("capture.raw", true), 0);
/// ```
#[must_use]
pub fn map_antenna(filename: &str, combined: bool) -> u32 {
    try_map_antenna(filename, combined).unwrap_or_else(|| {
        debug!(filename, "cannot map antenna from file name; using 0");
        0
    })
}
