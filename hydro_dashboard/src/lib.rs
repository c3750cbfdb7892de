//! IMGW hydrological dashboard.
//!
//! Polls the IMGW public hydro API on demand, keeps the latest readings in a
//! flat snapshot file, and serves a report that sorts stations into alarm,
//! warning and normal bands by water level.
//!
//! Pipeline: `ingest` (fetch) → `store` (persist) → `alert` (classify) →
//! `report` (render), driven by the handlers in `server`.

pub mod alert;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod report;
pub mod server;
pub mod store;
