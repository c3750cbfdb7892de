//! Water level threshold checking.
//!
//! Partitions a snapshot into alarm / warning / normal bands. Bands are
//! left-inclusive: a level of exactly 450 cm is a warning and exactly
//! 500 cm is an alarm. Readings whose level is absent or not a number are
//! excluded from every band rather than defaulted to normal.

use crate::model::{
    ALARM_LEVEL_CM, BandedReading, ClassifiedReport, SeverityBand, StationReading,
    WARNING_LEVEL_CM,
};

/// Parses a raw IMGW level value into centimetres.
///
/// Accepts surrounding whitespace and a decimal comma. Returns `None` for
/// empty, non-numeric and non-finite input.
pub fn parse_level(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Maps a level in centimetres onto its severity band.
pub fn classify_level(level_cm: f64) -> SeverityBand {
    if level_cm >= ALARM_LEVEL_CM {
        SeverityBand::Alarm
    } else if level_cm >= WARNING_LEVEL_CM {
        SeverityBand::Warning
    } else {
        SeverityBand::Normal
    }
}

/// Band for a single reading, or `None` if its level is unusable.
pub fn classify_reading(reading: &StationReading) -> Option<SeverityBand> {
    reading
        .water_level
        .as_deref()
        .and_then(parse_level)
        .map(classify_level)
}

/// Partitions `readings` into severity bands, preserving input order
/// within each band.
pub fn classify(readings: &[StationReading]) -> ClassifiedReport {
    let mut report = ClassifiedReport {
        total: readings.len(),
        ..ClassifiedReport::default()
    };

    for reading in readings {
        let Some(level_cm) = reading.water_level.as_deref().and_then(parse_level) else {
            report.excluded += 1;
            continue;
        };

        let banded = BandedReading {
            reading: reading.clone(),
            level_cm,
        };
        match classify_level(level_cm) {
            SeverityBand::Alarm => report.alarm.push(banded),
            SeverityBand::Warning => report.warning.push(banded),
            SeverityBand::Normal => report.normal.push(banded),
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(code: &str, lon: f64, lat: f64, level: Option<&str>) -> StationReading {
        StationReading {
            station_code: code.to_string(),
            station_name: format!("Station {}", code),
            longitude: Some(lon),
            latitude: Some(lat),
            water_level: level.map(String::from),
            measured_at: None,
        }
    }

    fn codes(band: &[BandedReading]) -> Vec<&str> {
        band.iter().map(|b| b.reading.station_code.as_str()).collect()
    }

    // --- Level parsing ------------------------------------------------------

    #[test]
    fn test_parse_level_accepts_integers_and_decimals() {
        assert_eq!(parse_level("510"), Some(510.0));
        assert_eq!(parse_level(" 449.5 "), Some(449.5));
        assert_eq!(parse_level("449,5"), Some(449.5));
    }

    #[test]
    fn test_parse_level_rejects_garbage() {
        assert_eq!(parse_level(""), None);
        assert_eq!(parse_level("   "), None);
        assert_eq!(parse_level("brak"), None);
        assert_eq!(parse_level("NaN"), None);
        assert_eq!(parse_level("inf"), None);
    }

    // --- Band boundaries ----------------------------------------------------

    #[test]
    fn test_level_exactly_at_warning_threshold_is_warning() {
        assert_eq!(classify_level(450.0), SeverityBand::Warning);
    }

    #[test]
    fn test_level_exactly_at_alarm_threshold_is_alarm() {
        assert_eq!(classify_level(500.0), SeverityBand::Alarm);
    }

    #[test]
    fn test_levels_just_below_thresholds() {
        assert_eq!(classify_level(449.99), SeverityBand::Normal);
        assert_eq!(classify_level(499.99), SeverityBand::Warning);
    }

    #[test]
    fn test_extreme_levels() {
        assert_eq!(classify_level(-20.0), SeverityBand::Normal);
        assert_eq!(classify_level(0.0), SeverityBand::Normal);
        assert_eq!(classify_level(1200.0), SeverityBand::Alarm);
    }

    // --- Partitioning -------------------------------------------------------

    #[test]
    fn test_classify_three_station_example() {
        let readings = vec![
            reading("A", 19.0, 50.0, Some("510")),
            reading("B", 20.0, 51.0, Some("460")),
            reading("C", 21.0, 52.0, Some("100")),
        ];
        let report = classify(&readings);

        assert_eq!(codes(&report.alarm), vec!["A"]);
        assert_eq!(codes(&report.warning), vec!["B"]);
        assert_eq!(codes(&report.normal), vec!["C"]);
        assert_eq!(report.total, 3);
        assert_eq!(report.excluded, 0);
    }

    #[test]
    fn test_null_level_is_excluded_from_every_band_but_counted_in_total() {
        let readings = vec![
            reading("A", 19.0, 50.0, Some("510")),
            reading("N", 19.5, 50.5, None),
        ];
        let report = classify(&readings);

        assert_eq!(report.alarm.len() + report.warning.len() + report.normal.len(), 1);
        assert!(
            !codes(&report.normal).contains(&"N"),
            "a null level must never be defaulted to normal"
        );
        assert_eq!(report.excluded, 1);
        assert_eq!(report.total, 2);
    }

    #[test]
    fn test_non_numeric_level_is_excluded() {
        let report = classify(&[reading("X", 19.0, 50.0, Some("---"))]);
        assert!(report.alarm.is_empty() && report.warning.is_empty() && report.normal.is_empty());
        assert_eq!(report.excluded, 1);
        assert_eq!(classify_reading(&reading("X", 19.0, 50.0, Some("---"))), None);
    }

    #[test]
    fn test_input_order_is_preserved_within_bands() {
        let readings = vec![
            reading("W2", 0.0, 0.0, Some("499")),
            reading("A1", 0.0, 0.0, Some("700")),
            reading("W1", 0.0, 0.0, Some("450")),
            reading("A2", 0.0, 0.0, Some("500")),
        ];
        let report = classify(&readings);

        assert_eq!(codes(&report.alarm), vec!["A1", "A2"]);
        assert_eq!(codes(&report.warning), vec!["W2", "W1"]);
    }

    #[test]
    fn test_banded_reading_carries_parsed_level() {
        let report = classify(&[reading("A", 19.0, 50.0, Some("512,5"))]);
        assert_eq!(report.alarm[0].level_cm, 512.5);
        assert_eq!(report.band(SeverityBand::Alarm).len(), 1);
    }

    #[test]
    fn test_empty_snapshot_yields_empty_report() {
        assert_eq!(classify(&[]), ClassifiedReport::default());
    }
}
