/// Live checks against the IMGW public hydro API
///
/// These tests make real network requests and are marked #[ignore] so CI
/// does not depend on IMGW availability.
///
/// Run with: cargo test --test imgw_integration -- --ignored

use hydro_dashboard::alert::classify;
use hydro_dashboard::ingest::{HydroSource, ImgwClient};

#[test]
#[ignore] // Don't run in CI - depends on external API
fn test_imgw_hydro2_returns_stations() {
    let readings = ImgwClient::default()
        .fetch()
        .expect("IMGW hydro2 request failed - check network connectivity");

    println!("✓ IMGW returned {} stations", readings.len());
    assert!(!readings.is_empty(), "IMGW should report at least one station");

    let with_coordinates = readings.iter().filter(|r| r.coordinates().is_some()).count();
    assert!(with_coordinates > 0, "some stations should carry coordinates");

    for reading in &readings {
        assert!(!reading.station_code.is_empty(), "station code should be present");
    }

    let report = classify(&readings);
    println!(
        "  alarm={}, warning={}, normal={}, excluded={}",
        report.alarm.len(),
        report.warning.len(),
        report.normal.len(),
        report.excluded
    );
    assert_eq!(
        report.alarm.len() + report.warning.len() + report.normal.len() + report.excluded,
        report.total
    );
}
