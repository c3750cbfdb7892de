//! Report rendering for the dashboard.
//!
//! Two interchangeable strategies turn a `ClassifiedReport` into an HTML
//! fragment, which is then embedded in the page shell defined here.
//!
//! Submodules:
//! - `table`    — band counts plus alarm / warning detail tables.
//! - `map`      — SVG map of alarm / warning stations over the country outline.
//! - `boundary` — GeoJSON loader for the map's country outline.

pub mod boundary;
pub mod map;
pub mod table;

use std::path::Path;

use chrono::{DateTime, Local};
use serde::Deserialize;

use crate::model::{ClassifiedReport, HydroError};

pub use boundary::BoundaryLayer;
pub use map::render_map;
pub use table::render_table;

const PAGE_TITLE: &str = "Hydrologiczne dane IMGW";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    #[default]
    Table,
    Map,
}

/// Render `report` with the selected strategy.
///
/// The map strategy reads the boundary layer from `boundary_path` on every
/// call and fails if it is missing.
pub fn render_report(
    style: ReportStyle,
    report: &ClassifiedReport,
    boundary_path: &Path,
) -> Result<String, HydroError> {
    match style {
        ReportStyle::Table => Ok(render_table(report)),
        ReportStyle::Map => {
            let layer = BoundaryLayer::load(boundary_path)?;
            Ok(render_map(report, &layer))
        }
    }
}

// ---------------------------------------------------------------------------
// Page shell
// ---------------------------------------------------------------------------

/// Wrap a report fragment in the full dashboard page.
///
/// `generated_at` is display-only. `snapshot_at` is the time of the last
/// refresh, when known.
pub fn render_page(
    fragment: &str,
    generated_at: DateTime<Local>,
    snapshot_at: Option<DateTime<Local>>,
) -> String {
    let snapshot_line = snapshot_at
        .map(|t| format!("<p>Dane z odświeżenia: {}</p>", t.format(TIMESTAMP_FORMAT)))
        .unwrap_or_default();

    page_shell(&format!(
        "<p>Ostatnia aktualizacja: {}</p>\n{}\n<main>\n{}\n</main>",
        generated_at.format(TIMESTAMP_FORMAT),
        snapshot_line,
        fragment
    ))
}

/// Page shown before the first refresh.
pub fn render_empty_page(generated_at: DateTime<Local>) -> String {
    page_shell(&format!(
        "<p>Ostatnia aktualizacja: {}</p>\n<p class=\"notice\">Brak danych. Kliknij \u{201e}Odśwież dane\u{201d}, aby pobrać aktualne pomiary.</p>",
        generated_at.format(TIMESTAMP_FORMAT)
    ))
}

/// Page shown when the report cannot be rendered.
pub fn render_error_page(error: &HydroError) -> String {
    page_shell(&format!(
        "<p class=\"error\">Nie udało się wygenerować raportu: {}</p>",
        html_escape(&error.to_string())
    ))
}

fn page_shell(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="pl">
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>{css}</style>
</head>
<body>
<h1>{title}</h1>
<button id="refresh-button" onclick="window.location.href='/refresh'">Odśwież dane</button>
{body}
</body>
</html>
"#,
        title = PAGE_TITLE,
        css = inline_css(),
        body = body,
    )
}

fn inline_css() -> &'static str {
    r#"
body { font-family: Arial, sans-serif; margin: 0; padding: 0 20px 40px; }
h1 { text-align: center; margin-top: 20px; }
p { text-align: center; }
#refresh-button {
    position: fixed; top: 20px; right: 20px; padding: 15px 30px;
    background-color: #3498db; color: white; font-size: 16px;
    border: none; border-radius: 5px; cursor: pointer;
    box-shadow: 0 4px 8px rgba(0,0,0,0.2);
}
#refresh-button:hover { background-color: #2980b9; }
main { max-width: 1000px; margin: 0 auto; }
.summary { display: flex; justify-content: center; gap: 20px; margin: 20px 0; }
.count { padding: 12px 24px; border-radius: 6px; color: white; text-align: center; }
.count .label { display: block; font-size: 14px; }
.count .value { display: block; font-size: 28px; font-weight: bold; }
.count.alarm { background-color: #e74c3c; }
.count.warning { background-color: #f39c12; }
.count.normal { background-color: #27ae60; }
h2.alarm { color: #c0392b; }
h2.warning { color: #d35400; }
table.band { width: 100%; border-collapse: collapse; margin-bottom: 24px; }
table.band th, table.band td { border: 1px solid #ddd; padding: 6px 10px; text-align: left; }
table.band th { background-color: #f4f4f4; }
.error { color: #c0392b; }
svg.map { display: block; margin: 0 auto; max-width: 100%; height: auto; }
"#
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Shortest text that reads back as the same level, so a value never lands
/// across a band edge on screen (499.96 stays 499.96, 510.0 prints as 510).
pub(crate) fn format_level(level_cm: f64) -> String {
    level_cm.to_string()
}

/// "lat, lon" with four decimals, or a dash when unknown.
pub(crate) fn format_coordinates(coordinates: Option<(f64, f64)>) -> String {
    match coordinates {
        Some((lon, lat)) => format!("{:.4}, {:.4}", lat, lon),
        None => "\u{2014}".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 10, 19, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_report_style_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            style: ReportStyle,
        }
        let w: Wrapper = toml::from_str("style = \"map\"").unwrap();
        assert_eq!(w.style, ReportStyle::Map);
        assert_eq!(ReportStyle::default(), ReportStyle::Table);
    }

    #[test]
    fn test_page_has_refresh_control_and_timestamp() {
        let page = render_page("<p>fragment</p>", fixed_now(), None);
        assert!(page.contains("onclick=\"window.location.href='/refresh'\""));
        assert!(page.contains("Ostatnia aktualizacja: 2024-10-19 13:00:00"));
        assert!(page.contains("<p>fragment</p>"));
        assert!(!page.contains("Dane z odświeżenia"));
    }

    #[test]
    fn test_page_shows_snapshot_time_when_known() {
        let page = render_page("", fixed_now(), Some(fixed_now()));
        assert!(page.contains("Dane z odświeżenia: 2024-10-19 13:00:00"));
    }

    #[test]
    fn test_empty_page_invites_refresh() {
        let page = render_empty_page(fixed_now());
        assert!(page.contains("Brak danych"));
        assert!(page.contains("id=\"refresh-button\""));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = render_error_page(&HydroError::Parse("<bad>".to_string()));
        assert!(page.contains("Parse error: &lt;bad&gt;"));
    }

    #[test]
    fn test_map_style_without_boundary_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = render_report(
            ReportStyle::Map,
            &ClassifiedReport::default(),
            &dir.path().join("missing.geojson"),
        );
        assert!(matches!(result, Err(HydroError::Boundary(_))));
    }

    #[test]
    fn test_table_style_ignores_boundary_path() {
        let result = render_report(
            ReportStyle::Table,
            &ClassifiedReport::default(),
            Path::new("/nonexistent/poland.geojson"),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_level(510.0), "510");
        assert_eq!(format_level(449.5), "449.5");
        assert_eq!(format_level(499.96), "499.96");
        assert_eq!(format_coordinates(Some((19.0, 50.0))), "50.0000, 19.0000");
        assert_eq!(format_coordinates(None), "\u{2014}");
        assert_eq!(html_escape("a&b"), "a&amp;b");
    }
}
