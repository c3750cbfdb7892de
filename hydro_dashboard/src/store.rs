/// Snapshot persistence.
///
/// The latest set of station readings lives in a single semicolon-delimited
/// text file (UTF-8 with BOM, so spreadsheet tools pick the right encoding).
/// Every save truncates and rewrites the whole file; there is no history.
///
/// The file is not locked. A reader running while a refresh is writing may
/// see an empty or partially written snapshot.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::model::{HydroError, StationReading};

const UTF8_BOM: &str = "\u{feff}";
const DELIMITER: char = ';';

/// Column names, matching the IMGW API field names.
pub const COLUMNS: [&str; 6] = [
    "kod_stacji",
    "nazwa_stacji",
    "lon",
    "lat",
    "stan",
    "stan_data",
];

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any refresh has ever written a snapshot.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// When the snapshot file was last written, if it exists.
    pub fn modified_at(&self) -> Option<DateTime<Local>> {
        let modified: SystemTime = fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(DateTime::<Local>::from(modified))
    }

    /// Replace the snapshot with `readings`.
    ///
    /// Truncate-then-write, not a rename-based swap.
    pub fn save(&self, readings: &[StationReading]) -> Result<(), HydroError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut out = BufWriter::new(File::create(&self.path)?);
        out.write_all(encode_snapshot(readings).as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Read the current snapshot.
    ///
    /// Returns `HydroError::NoSnapshot` if no refresh has happened yet.
    pub fn load(&self) -> Result<Vec<StationReading>, HydroError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HydroError::NoSnapshot(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        decode_snapshot(&text)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Render readings as the full snapshot file contents, BOM included.
pub fn encode_snapshot(readings: &[StationReading]) -> String {
    let mut out = String::from(UTF8_BOM);
    out.push_str(&COLUMNS.join(";"));
    out.push('\n');

    for r in readings {
        let fields = [
            escape_field(&r.station_code),
            escape_field(&r.station_name),
            r.longitude.map(|v| v.to_string()).unwrap_or_default(),
            r.latitude.map(|v| v.to_string()).unwrap_or_default(),
            r.water_level.as_deref().map(escape_field).unwrap_or_default(),
            r.measured_at.as_deref().map(escape_field).unwrap_or_default(),
        ];
        out.push_str(&fields.join(";"));
        out.push('\n');
    }

    out
}

fn escape_field(value: &str) -> String {
    let needs_quotes = value.contains(DELIMITER)
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Parse snapshot file contents. Columns are located by header name.
pub fn decode_snapshot(text: &str) -> Result<Vec<StationReading>, HydroError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let rows = split_records(text)?;

    let mut rows = rows.into_iter();
    let Some((_, header)) = rows.next() else {
        return Err(HydroError::Parse("snapshot has no header row".to_string()));
    };

    let column = |name: &str| -> Result<usize, HydroError> {
        header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| HydroError::Parse(format!("snapshot header missing column '{}'", name)))
    };
    let code_idx = column("kod_stacji")?;
    let name_idx = column("nazwa_stacji")?;
    let lon_idx = column("lon")?;
    let lat_idx = column("lat")?;
    let stan_idx = column("stan")?;
    // Older snapshots may predate the measurement-time column.
    let time_idx = column("stan_data").ok();

    let mut readings = Vec::new();
    for (line_no, fields) in rows {
        if fields.len() == 1 && fields[0].trim().is_empty() {
            continue;
        }
        if fields.len() != header.len() {
            return Err(HydroError::Parse(format!(
                "snapshot line {}: expected {} fields, found {}",
                line_no,
                header.len(),
                fields.len()
            )));
        }

        let non_empty = |idx: usize| -> Option<String> {
            let value = &fields[idx];
            if value.is_empty() { None } else { Some(value.clone()) }
        };
        let coordinate = |idx: usize| -> Result<Option<f64>, HydroError> {
            match non_empty(idx) {
                None => Ok(None),
                Some(v) => v.trim().parse::<f64>().map(Some).map_err(|_| {
                    HydroError::Parse(format!("snapshot line {}: bad coordinate '{}'", line_no, v))
                }),
            }
        };

        readings.push(StationReading {
            station_code: fields[code_idx].clone(),
            station_name: fields[name_idx].clone(),
            longitude: coordinate(lon_idx)?,
            latitude: coordinate(lat_idx)?,
            water_level: non_empty(stan_idx),
            measured_at: time_idx.and_then(non_empty),
        });
    }

    Ok(readings)
}

/// Split delimited text into records of fields, honouring double-quoted
/// fields (which may contain delimiters, doubled quotes and newlines).
/// Each record is paired with the 1-based line it starts on.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, HydroError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_start = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            DELIMITER => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push((record_start, std::mem::take(&mut fields)));
                line += 1;
                record_start = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(HydroError::Parse(format!(
            "snapshot line {}: unterminated quoted field",
            record_start
        )));
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((record_start, fields));
    }

    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
