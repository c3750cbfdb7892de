/// IMGW (Instytut Meteorologii i Gospodarki Wodnej) public data API client
///
/// Retrieves the current water level of every hydrological station in
/// Poland from the IMGW public data service in a single request.
///
/// API Documentation: https://danepubliczne.imgw.pl/apiinfo
/// Hydro endpoint:    https://danepubliczne.imgw.pl/api/data/hydro2

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::model::{HydroError, StationReading};

pub const IMGW_HYDRO_URL: &str = "https://danepubliczne.imgw.pl/api/data/hydro2";

/// Default per-request timeout for the IMGW API.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Data source seam
// ============================================================================

/// Anything that can produce a full set of station readings.
///
/// A single best-effort attempt per call: implementations do not retry and
/// report every failure as an `Err` the caller must check.
pub trait HydroSource: Send + Sync {
    fn fetch(&self) -> Result<Vec<StationReading>, HydroError>;
}

// ============================================================================
// IMGW API Response Structures
// ============================================================================

/// One element of the `hydro2` response array.
///
/// IMGW has served the same field as a number on one day and a quoted
/// string on another, so every field is taken as a raw JSON value and
/// normalised afterwards.
#[derive(Debug, Deserialize)]
struct ImgwHydroRecord {
    kod_stacji: Option<Value>,
    nazwa_stacji: Option<Value>,
    lon: Option<Value>,
    lat: Option<Value>,
    stan: Option<Value>,
    stan_data: Option<Value>,
}

// ============================================================================
// API Client
// ============================================================================

/// Blocking client for the IMGW hydro endpoint.
#[derive(Debug, Clone)]
pub struct ImgwClient {
    api_url: String,
    timeout: Duration,
}

impl ImgwClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            timeout,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl Default for ImgwClient {
    fn default() -> Self {
        Self::new(IMGW_HYDRO_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl HydroSource for ImgwClient {
    /// Fetch current readings for all stations.
    ///
    /// Must be called from a thread that is allowed to block; the HTTP
    /// handlers run it through `spawn_blocking`.
    fn fetch(&self) -> Result<Vec<StationReading>, HydroError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| HydroError::Transport(e.to_string()))?;

        let response = client
            .get(&self.api_url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| HydroError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(HydroError::Http(response.status().as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| HydroError::Transport(e.to_string()))?;

        parse_hydro_response(&body)
    }
}

// ============================================================================
// Response parsing
// ============================================================================

/// Parse a `hydro2` JSON body into station readings, one per array element.
///
/// Only the top-level shape is enforced (it must be an array of objects).
/// Missing fields become `None` or empty strings.
pub fn parse_hydro_response(body: &str) -> Result<Vec<StationReading>, HydroError> {
    let records: Vec<ImgwHydroRecord> =
        serde_json::from_str(body).map_err(|e| HydroError::Parse(e.to_string()))?;

    Ok(records.into_iter().map(into_reading).collect())
}

fn into_reading(record: ImgwHydroRecord) -> StationReading {
    StationReading {
        station_code: record.kod_stacji.as_ref().and_then(value_text).unwrap_or_default(),
        station_name: record.nazwa_stacji.as_ref().and_then(value_text).unwrap_or_default(),
        longitude: record.lon.as_ref().and_then(value_f64),
        latitude: record.lat.as_ref().and_then(value_f64),
        water_level: record.stan.as_ref().and_then(value_text),
        measured_at: record.stan_data.as_ref().and_then(value_text),
    }
}

/// Text form of a scalar JSON value; `null` and blank strings become `None`.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Numeric form of a JSON number or numeric string.
fn value_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

// ============================================================================
// Tests
// ============================================================================
