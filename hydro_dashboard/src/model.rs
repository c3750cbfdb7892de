/// Core data types for the IMGW hydrological dashboard.
///
/// This module defines the shared domain model imported by all other modules:
/// station readings, severity bands, the classified report handed to the
/// renderers, and the crate-wide error type. It contains no I/O.

use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Water level (cm) at or above which a station is in the warning band.
pub const WARNING_LEVEL_CM: f64 = 450.0;

/// Water level (cm) at or above which a station is in the alarm band.
pub const ALARM_LEVEL_CM: f64 = 500.0;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One monitoring station's reading at snapshot time.
///
/// Corresponds to one element of the IMGW `hydro2` response array. The water
/// level is kept as the raw text the API sent (or `None` for `null`) so that
/// unparseable values survive a save/load cycle and are only judged at
/// classification time. Blank text is `None`: the snapshot file writes both
/// as an empty field, so `Some("")` could not come back from a load.
#[derive(Debug, Clone, PartialEq)]
pub struct StationReading {
    pub station_code: String,        // kod_stacji
    pub station_name: String,        // nazwa_stacji
    pub longitude: Option<f64>,      // lon, WGS84
    pub latitude: Option<f64>,       // lat, WGS84
    pub water_level: Option<String>, // stan, centimetres
    pub measured_at: Option<String>, // stan_data, e.g. "2024-10-19 12:40:00"
}

impl StationReading {
    /// Coordinates as `(lon, lat)` when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => Some((lon, lat)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification types
// ---------------------------------------------------------------------------

/// Severity bands, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SeverityBand {
    Normal,
    Warning,
    Alarm,
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityBand::Normal => write!(f, "normal"),
            SeverityBand::Warning => write!(f, "warning"),
            SeverityBand::Alarm => write!(f, "alarm"),
        }
    }
}

/// A reading whose level parsed successfully, paired with that level.
#[derive(Debug, Clone, PartialEq)]
pub struct BandedReading {
    pub reading: StationReading,
    pub level_cm: f64,
}

/// Readings partitioned into severity bands.
///
/// Each band preserves the input order. Readings without a usable level are
/// not in any band; they only contribute to `excluded` and `total`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedReport {
    pub alarm: Vec<BandedReading>,
    pub warning: Vec<BandedReading>,
    pub normal: Vec<BandedReading>,
    /// Readings dropped because their level was absent or non-numeric.
    pub excluded: usize,
    /// Raw number of readings in the snapshot.
    pub total: usize,
}

impl ClassifiedReport {
    pub fn band(&self, band: SeverityBand) -> &[BandedReading] {
        match band {
            SeverityBand::Alarm => &self.alarm,
            SeverityBand::Warning => &self.warning,
            SeverityBand::Normal => &self.normal,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while fetching, storing or rendering hydro data.
#[derive(Debug, thiserror::Error)]
pub enum HydroError {
    /// Non-2xx HTTP response from the IMGW API.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// The request never produced a response (DNS, connect, timeout).
    #[error("Transport error: {0}")]
    Transport(String),
    /// A response body or snapshot file could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
    /// No refresh has happened yet, so there is no snapshot file.
    #[error("No snapshot at {}", .0.display())]
    NoSnapshot(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The country boundary layer is missing or unusable.
    #[error("Boundary layer error: {0}")]
    Boundary(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
