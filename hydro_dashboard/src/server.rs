//! HTTP surface: the index report and the manual refresh trigger.
//!
//! Routes:
//! - `GET /`        — classify the stored snapshot and render the report page.
//! - `GET /refresh` — fetch from IMGW and replace the snapshot; JSON result.
//! - `GET /health`  — liveness check.
//!
//! Each handler runs its whole pipeline synchronously on tokio's blocking
//! pool. Nothing polls in the background. The snapshot file is the only
//! shared mutable state and is not locked, so an index request racing a
//! refresh can read a half-written file and answer with an error page.

use std::fs;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::alert::classify;
use crate::config::Config;
use crate::ingest::HydroSource;
use crate::logging::{self, Component};
use crate::model::HydroError;
use crate::report::{render_empty_page, render_error_page, render_page, render_report};
use crate::store::SnapshotStore;

pub const REFRESH_SUCCESS_MESSAGE: &str = "Dane zostały zaktualizowane";
pub const REFRESH_ERROR_MESSAGE: &str = "Nie udało się pobrać nowych danych";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything a handler needs, built once at startup.
pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn HydroSource>,
    pub store: SnapshotStore,
}

impl AppState {
    pub fn new(config: Config, source: Arc<dyn HydroSource>) -> Self {
        let store = SnapshotStore::new(config.snapshot_path.clone());
        Self {
            config,
            source,
            store,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/refresh", get(refresh_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Refresh pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Success,
    Error,
}

/// Body of the `/refresh` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub status: RefreshStatus,
}

impl RefreshResponse {
    fn success() -> Self {
        Self {
            message: REFRESH_SUCCESS_MESSAGE.to_string(),
            status: RefreshStatus::Success,
        }
    }

    fn error() -> Self {
        Self {
            message: REFRESH_ERROR_MESSAGE.to_string(),
            status: RefreshStatus::Error,
        }
    }
}

/// Fetch fresh readings and, only if that succeeded, replace the snapshot.
///
/// A failed fetch leaves the existing snapshot untouched.
pub fn refresh_snapshot(source: &dyn HydroSource, store: &SnapshotStore) -> RefreshResponse {
    let readings = match source.fetch() {
        Ok(readings) => readings,
        Err(e) => {
            logging::log_fetch_failure("Refresh", &e);
            return RefreshResponse::error();
        }
    };

    if let Err(e) = store.save(&readings) {
        logging::error(
            Component::Store,
            &format!("Writing {} failed: {}", store.path().display(), e),
        );
        return RefreshResponse::error();
    }

    let with_level = readings
        .iter()
        .filter(|r| crate::alert::classify_reading(r).is_some())
        .count();
    logging::log_refresh_summary(readings.len(), with_level);

    RefreshResponse::success()
}

// ---------------------------------------------------------------------------
// Index pipeline
// ---------------------------------------------------------------------------

/// Build the index page from the stored snapshot.
///
/// Before the first refresh this is the empty-state page, not an error.
/// When an artifact path is configured the page is also written there.
pub fn render_index(state: &AppState, now: DateTime<Local>) -> Result<String, HydroError> {
    if !state.store.exists() {
        logging::info(
            Component::Store,
            &format!("No snapshot at {} yet; serving empty page", state.store.path().display()),
        );
        return Ok(render_empty_page(now));
    }

    let readings = match state.store.load() {
        Ok(readings) => readings,
        // Removed between the check and the read.
        Err(HydroError::NoSnapshot(_)) => return Ok(render_empty_page(now)),
        Err(e) => return Err(e),
    };

    let report = classify(&readings);
    logging::debug(
        Component::Report,
        &format!(
            "Classified {} readings: {} alarm, {} warning, {} normal, {} excluded",
            report.total,
            report.alarm.len(),
            report.warning.len(),
            report.normal.len(),
            report.excluded
        ),
    );

    let fragment = render_report(state.config.report_style, &report, &state.config.boundary_path)?;
    let page = render_page(&fragment, now, state.store.modified_at());

    if let Some(ref artifact) = state.config.artifact_path {
        if let Err(e) = fs::write(artifact, &page) {
            logging::warn(
                Component::Report,
                &format!("Could not write report artifact {}: {}", artifact.display(), e),
            );
        }
    }

    Ok(page)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index_handler(State(state): State<Arc<AppState>>) -> Response {
    let result = tokio::task::spawn_blocking(move || render_index(&state, Local::now())).await;

    match result {
        Ok(Ok(page)) => Html(page).into_response(),
        Ok(Err(e)) => {
            logging::error(Component::Http, &format!("GET / failed: {}", e));
            (StatusCode::INTERNAL_SERVER_ERROR, Html(render_error_page(&e))).into_response()
        }
        Err(e) => {
            logging::error(Component::Http, &format!("GET / task failed: {}", e));
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn refresh_handler(State(state): State<Arc<AppState>>) -> Response {
    let result =
        tokio::task::spawn_blocking(move || refresh_snapshot(state.source.as_ref(), &state.store)).await;

    let body = match result {
        Ok(body) => body,
        Err(e) => {
            logging::error(Component::Http, &format!("GET /refresh task failed: {}", e));
            RefreshResponse::error()
        }
    };

    let status = match body.status {
        RefreshStatus::Success => StatusCode::OK,
        RefreshStatus::Error => StatusCode::BAD_GATEWAY,
    };
    (status, Json(body)).into_response()
}

async fn health_handler() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StationReading;
    use crate::report::ReportStyle;
    use chrono::TimeZone;

    struct StaticSource(Vec<StationReading>);

    impl HydroSource for StaticSource {
        fn fetch(&self) -> Result<Vec<StationReading>, HydroError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl HydroSource for FailingSource {
        fn fetch(&self) -> Result<Vec<StationReading>, HydroError> {
            Err(HydroError::Http(503))
        }
    }

    fn reading(code: &str, level: Option<&str>) -> StationReading {
        StationReading {
            station_code: code.to_string(),
            station_name: format!("Stacja {}", code),
            longitude: Some(19.0),
            latitude: Some(50.0),
            water_level: level.map(String::from),
            measured_at: None,
        }
    }

    fn state_in(dir: &tempfile::TempDir, source: Arc<dyn HydroSource>) -> AppState {
        let config = Config {
            snapshot_path: dir.path().join("hydro_data.csv"),
            boundary_path: dir.path().join("poland.geojson"),
            ..Config::default()
        };
        AppState::new(config, source)
    }

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 10, 19, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_refresh_response_serializes_lowercase_status() {
        let json = serde_json::to_value(RefreshResponse::error()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], REFRESH_ERROR_MESSAGE);
    }

    #[test]
    fn test_refresh_success_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir, Arc::new(StaticSource(vec![reading("A", Some("510"))])));

        let response = refresh_snapshot(state.source.as_ref(), &state.store);

        assert_eq!(response.status, RefreshStatus::Success);
        assert_eq!(response.message, REFRESH_SUCCESS_MESSAGE);
        assert_eq!(state.store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_refresh_failure_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir, Arc::new(FailingSource));
        state.store.save(&[reading("OLD", Some("100"))]).unwrap();

        let response = refresh_snapshot(state.source.as_ref(), &state.store);

        assert_eq!(response.status, RefreshStatus::Error);
        let kept = state.store.load().unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].station_code, "OLD");
    }

    #[test]
    fn test_refresh_store_failure_is_reported_as_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the snapshot file should be makes File::create fail.
        let blocked = dir.path().join("blocked");
        std::fs::create_dir(&blocked).unwrap();
        let store = SnapshotStore::new(&blocked);

        let response = refresh_snapshot(&StaticSource(vec![reading("A", Some("1"))]), &store);
        assert_eq!(response.status, RefreshStatus::Error);
    }

    #[test]
    fn test_index_before_first_refresh_is_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir, Arc::new(FailingSource));

        let page = render_index(&state, fixed_now()).expect("empty state is not an error");
        assert!(page.contains("Brak danych"));
    }

    #[test]
    fn test_index_after_snapshot_removed_is_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir, Arc::new(FailingSource));
        state.store.save(&[reading("A", Some("510"))]).unwrap();
        std::fs::remove_file(state.store.path()).unwrap();

        let page = render_index(&state, fixed_now()).unwrap();
        assert!(page.contains("Brak danych"));
        assert!(!page.contains("<td>A</td>"));
    }

    #[test]
    fn test_index_renders_table_report() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir, Arc::new(FailingSource));
        state
            .store
            .save(&[reading("A", Some("510")), reading("B", Some("460")), reading("N", None)])
            .unwrap();

        let page = render_index(&state, fixed_now()).unwrap();
        assert!(page.contains("Ostatnia aktualizacja: 2024-10-19 13:00:00"));
        assert!(page.contains("<td>A</td>"));
        assert!(page.contains("<td>B</td>"));
        assert!(!page.contains("<td>N</td>"));
    }

    #[test]
    fn test_index_map_without_boundary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir, Arc::new(FailingSource));
        state.config.report_style = ReportStyle::Map;
        state.store.save(&[reading("A", Some("510"))]).unwrap();

        let result = render_index(&state, fixed_now());
        assert!(matches!(result, Err(HydroError::Boundary(_))), "got {:?}", result.map(|_| ()));
    }

    #[test]
    fn test_index_writes_artifact_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir, Arc::new(FailingSource));
        let artifact = dir.path().join("report.html");
        state.config.artifact_path = Some(artifact.clone());
        state.store.save(&[reading("A", Some("510"))]).unwrap();

        let page = render_index(&state, fixed_now()).unwrap();
        assert_eq!(std::fs::read_to_string(&artifact).unwrap(), page);
    }
}
