/// Upstream data sources.
///
/// Submodules:
/// - `imgw` — IMGW public hydro API client and response parsing.

pub mod imgw;

pub use imgw::{HydroSource, ImgwClient};
