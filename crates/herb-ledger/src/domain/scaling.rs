//! # Fixed-Point Scaling
//!
//! The ledger stores only integers. Coordinates travel as degrees × 10^6 and
//! percentage measurements as percent × 10^2. Rounding is half-up
//! (`floor(x + 0.5)`), matching the convention of the existing front-end
//! clients so both produce identical wire values.

/// Decimal places kept for coordinates.
pub const COORDINATE_DECIMALS: u32 = 6;

/// Decimal places kept for percentage measurements.
pub const MOISTURE_DECIMALS: u32 = 2;

/// Multiplier applied to coordinates.
pub const COORDINATE_SCALE: f64 = 1_000_000.0;

/// Multiplier applied to percentage measurements.
pub const MOISTURE_SCALE: f64 = 100.0;

/// Latitude bound in degrees.
pub const MAX_LATITUDE: f64 = 90.0;

/// Longitude bound in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

/// Scale a coordinate in degrees to its ledger integer.
///
/// Callers validate the range first; inside ±180° the result always fits.
#[must_use]
pub fn scale_coordinate(degrees: f64) -> i64 {
    round_half_up(degrees * COORDINATE_SCALE) as i64
}

/// Convert a ledger coordinate back to degrees.
#[must_use]
pub fn unscale_coordinate(scaled: i64) -> f64 {
    scaled as f64 / COORDINATE_SCALE
}

/// Scale a non-negative percentage to its ledger integer.
///
/// Returns `None` when the scaled value does not fit in 64 bits.
#[must_use]
pub fn scale_moisture(percent: f64) -> Option<u64> {
    let scaled = round_half_up(percent * MOISTURE_SCALE);
    if scaled < 0.0 || scaled >= u64::MAX as f64 {
        return None;
    }
    Some(scaled as u64)
}

/// Convert a ledger percentage back to its decimal value.
#[must_use]
pub fn unscale_moisture(scaled: u64) -> f64 {
    scaled as f64 / MOISTURE_SCALE
}

fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}
