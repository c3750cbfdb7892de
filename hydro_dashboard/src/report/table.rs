//! HTML table report: band counts plus alarm and warning detail tables.

use std::fmt::Write;

use crate::model::{ClassifiedReport, SeverityBand};
use crate::report::{format_coordinates, format_level, html_escape};

/// Render the table report as an HTML fragment.
///
/// Deterministic for a given report; the page shell adds the timestamp.
pub fn render_table(report: &ClassifiedReport) -> String {
    format!(
        r#"<section class="summary">
    {alarm}
    {warning}
    {normal}
</section>
<p class="totals">Stacji w pomiarze: {total}, bez poprawnego stanu: {excluded}</p>
{alarm_table}
{warning_table}"#,
        alarm = render_count(report, SeverityBand::Alarm, "Stan alarmowy"),
        warning = render_count(report, SeverityBand::Warning, "Stan ostrzegawczy"),
        normal = render_count(report, SeverityBand::Normal, "Stan normalny"),
        total = report.total,
        excluded = report.excluded,
        alarm_table = render_band_table(report, SeverityBand::Alarm, "Stacje w stanie alarmowym"),
        warning_table = render_band_table(report, SeverityBand::Warning, "Stacje w stanie ostrzegawczym"),
    )
}

fn render_count(report: &ClassifiedReport, band: SeverityBand, label: &str) -> String {
    let class = band.to_string();
    let count = report.band(band).len();
    format!(
        r#"<div class="count {class}" data-band="{class}"><span class="label">{label}</span><span class="value">{count}</span></div>"#
    )
}

/// Heading and table carry the band's display name as their CSS class.
fn render_band_table(report: &ClassifiedReport, band: SeverityBand, heading: &str) -> String {
    let class = band.to_string();
    let rows = report.band(band);
    let mut html = String::new();
    let _ = writeln!(html, r#"<h2 class="{class}">{heading}</h2>"#);

    if rows.is_empty() {
        let _ = writeln!(html, r#"<p class="empty">Brak stacji.</p>"#);
        return html;
    }

    let _ = writeln!(html, r#"<table class="band {class}">"#);
    let _ = writeln!(
        html,
        "<thead><tr><th>Kod stacji</th><th>Nazwa stacji</th><th>Współrzędne</th><th>Stan [cm]</th></tr></thead>"
    );
    let _ = writeln!(html, "<tbody>");
    for row in rows {
        let r = &row.reading;
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&r.station_code),
            html_escape(&r.station_name),
            format_coordinates(r.coordinates()),
            format_level(row.level_cm),
        );
    }
    let _ = writeln!(html, "</tbody>");
    let _ = writeln!(html, "</table>");
    html
}
