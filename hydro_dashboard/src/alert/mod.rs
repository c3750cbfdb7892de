/// Severity classification for station readings.
///
/// Submodules:
/// - `thresholds` — partitions readings into alarm / warning / normal bands.

pub mod thresholds;

pub use thresholds::{classify, classify_level, classify_reading, parse_level};
