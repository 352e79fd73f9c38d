//! # Value Objects
//!
//! Immutable primitives shared by the ABI codec, the ports and the service.
//! Addresses and hashes render as `0x`-prefixed lowercase hex, which is also
//! their JSON-RPC wire form.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::errors::LedgerError;
use super::scaling::{
    scale_coordinate, scale_moisture, unscale_coordinate, unscale_moisture, MAX_LATITUDE,
    MAX_LONGITUDE,
};

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address the contract reports for missing records.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Wrap raw account bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// `None` unless `slice` is exactly 20 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Abbreviated form used in human-facing output (`0x1234...7890`).
    #[must_use]
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_prefixed_hex(s)
            .map_err(|_| LedgerError::InvalidInput(format!("invalid address: {s}")))?;
        Self::from_slice(&bytes)
            .ok_or_else(|| LedgerError::InvalidInput(format!("address must be 20 bytes: {s}")))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// HASH32 (32 bytes)
// =============================================================================

/// A 32-byte digest: root hashes, transaction hashes and log topics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Wrap a raw digest.
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// `None` unless `slice` is exactly 32 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(Self)
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Hash32 {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_prefixed_hex(s)
            .map_err(|_| LedgerError::InvalidInput(format!("invalid hash: {s}")))?;
        Self::from_slice(&bytes)
            .ok_or_else(|| LedgerError::InvalidInput(format!("hash must be 32 bytes: {s}")))
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Decode a hex string with an optional `0x` prefix.
pub(crate) fn decode_prefixed_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

// =============================================================================
// COORDINATES
// =============================================================================

/// A geographic position in decimal degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lon: f64,
}

/// A position as stored on the ledger: degrees × 1,000,000.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScaledCoordinates {
    /// Scaled latitude.
    pub lat: i64,
    /// Scaled longitude.
    pub lon: i64,
}

impl Coordinates {
    /// Create a position from decimal degrees.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Validate and convert to the ledger's fixed-point representation.
    pub fn scaled(&self) -> Result<ScaledCoordinates, LedgerError> {
        check_degrees("latitude", self.lat, MAX_LATITUDE)?;
        check_degrees("longitude", self.lon, MAX_LONGITUDE)?;
        Ok(ScaledCoordinates {
            lat: scale_coordinate(self.lat),
            lon: scale_coordinate(self.lon),
        })
    }
}

impl ScaledCoordinates {
    /// Convert back to decimal degrees.
    pub fn unscaled(&self) -> Coordinates {
        Coordinates {
            lat: unscale_coordinate(self.lat),
            lon: unscale_coordinate(self.lon),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}°, {:.6}°", self.lat, self.lon)
    }
}

pub(crate) fn check_degrees(axis: &str, value: f64, limit: f64) -> Result<(), LedgerError> {
    if !value.is_finite() {
        return Err(LedgerError::InvalidInput(format!("{axis} must be finite")));
    }
    if value.abs() > limit {
        return Err(LedgerError::InvalidInput(format!(
            "{axis} {value} outside ±{limit}"
        )));
    }
    Ok(())
}

// =============================================================================
// MOISTURE
// =============================================================================

/// A percentage-like measurement (moisture content), scaled by 100 on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Moisture(pub f64);

impl Moisture {
    /// Validate and convert to the ledger's fixed-point representation.
    pub fn scaled(&self) -> Result<u64, LedgerError> {
        if !self.0.is_finite() || self.0 < 0.0 {
            return Err(LedgerError::InvalidInput(format!(
                "measurement must be a finite non-negative number, got {}",
                self.0
            )));
        }
        scale_moisture(self.0).ok_or_else(|| {
            LedgerError::InvalidInput(format!("measurement {} too large to encode", self.0))
        })
    }

    /// Build from a scaled ledger value.
    pub fn from_scaled(scaled: u64) -> Self {
        Self(unscale_moisture(scaled))
    }

    /// The percentage value.
    pub fn percent(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Moisture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}
