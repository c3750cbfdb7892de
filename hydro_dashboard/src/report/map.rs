//! Map report: alarm and warning stations plotted over the country outline.
//!
//! Produces a self-contained SVG. Coordinates use an equirectangular
//! projection scaled by the cosine of the layer's middle latitude, fitted
//! to the boundary layer's bounding box. Normal-band stations and stations
//! without coordinates are not drawn.

use std::fmt::Write;

use crate::model::{BandedReading, ClassifiedReport};
use crate::report::boundary::{BoundaryLayer, BoundingBox};
use crate::report::{format_level, html_escape};

const CANVAS_WIDTH: f64 = 800.0;
const CANVAS_HEIGHT: f64 = 800.0;
const MARGIN: f64 = 40.0;
const TITLE_HEIGHT: f64 = 40.0;
const MARKER_RADIUS: f64 = 5.0;

const LAND_FILL: &str = "#d3d3d3";
const LAND_STROKE: &str = "#9a9a9a";
const WARNING_COLOR: &str = "orange";
const ALARM_COLOR: &str = "red";

const TITLE: &str = "Stacje z poziomem ostrzegawczym i alarmowym na mapie Polski";
const WARNING_LABEL: &str = "Poziom ostrzegawczy";
const ALARM_LABEL: &str = "Poziom alarmowy";

/// Maps lon/lat onto canvas pixels.
#[derive(Debug, Clone, Copy)]
struct Projection {
    bbox: BoundingBox,
    lon_factor: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    fn fit(bbox: BoundingBox) -> Self {
        let mid_lat = (bbox.min_lat + bbox.max_lat) / 2.0;
        let lon_factor = mid_lat.to_radians().cos().abs().max(0.01);

        // A degenerate (single point or line) layer still needs a finite scale.
        let span_x = (bbox.width() * lon_factor).max(1e-6);
        let span_y = bbox.height().max(1e-6);

        let avail_w = CANVAS_WIDTH - 2.0 * MARGIN;
        let avail_h = CANVAS_HEIGHT - 2.0 * MARGIN - TITLE_HEIGHT;
        let scale = (avail_w / span_x).min(avail_h / span_y);

        Self {
            bbox,
            lon_factor,
            scale,
            offset_x: MARGIN + (avail_w - span_x * scale) / 2.0,
            offset_y: MARGIN + TITLE_HEIGHT + (avail_h - span_y * scale) / 2.0,
        }
    }

    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = self.offset_x + (lon - self.bbox.min_lon) * self.lon_factor * self.scale;
        let y = self.offset_y + (self.bbox.max_lat - lat) * self.scale;
        (x, y)
    }
}

/// Render the map report as an inline SVG fragment.
pub fn render_map(report: &ClassifiedReport, layer: &BoundaryLayer) -> String {
    let projection = Projection::fit(layer.bounding_box());
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        "<svg xmlns='http://www.w3.org/2000/svg' class='map' width='{:.0}' height='{:.0}' viewBox='0 0 {:.0} {:.0}' role='img'>",
        CANVAS_WIDTH, CANVAS_HEIGHT, CANVAS_WIDTH, CANVAS_HEIGHT
    );
    let _ = writeln!(
        svg,
        "  <text x='{:.0}' y='{:.0}' text-anchor='middle' font-family='Arial, sans-serif' font-size='18'>{}</text>",
        CANVAS_WIDTH / 2.0,
        MARGIN,
        html_escape(TITLE)
    );

    let _ = writeln!(svg, "  <g class='boundary'>");
    for ring in &layer.rings {
        let points = ring
            .iter()
            .map(|&(lon, lat)| {
                let (x, y) = projection.project(lon, lat);
                format!("{:.1},{:.1}", x, y)
            })
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(
            svg,
            "    <polygon points='{}' fill='{}' stroke='{}' stroke-width='0.8'/>",
            points, LAND_FILL, LAND_STROKE
        );
    }
    let _ = writeln!(svg, "  </g>");

    // Alarm markers go last so they sit on top of nearby warnings.
    render_markers(&mut svg, &projection, "warning", WARNING_COLOR, &report.warning);
    render_markers(&mut svg, &projection, "alarm", ALARM_COLOR, &report.alarm);

    render_legend(&mut svg, report);

    let _ = writeln!(svg, "</svg>");
    svg
}

fn render_markers(
    svg: &mut String,
    projection: &Projection,
    class: &str,
    color: &str,
    rows: &[BandedReading],
) {
    let _ = writeln!(svg, "  <g class='markers {}'>", class);
    for row in rows {
        let Some((lon, lat)) = row.reading.coordinates() else {
            continue;
        };
        let (x, y) = projection.project(lon, lat);
        let _ = writeln!(
            svg,
            "    <circle cx='{:.1}' cy='{:.1}' r='{:.0}' fill='{}'><title>{} ({}): {} cm</title></circle>",
            x,
            y,
            MARKER_RADIUS,
            color,
            html_escape(&row.reading.station_name),
            html_escape(&row.reading.station_code),
            format_level(row.level_cm)
        );
    }
    let _ = writeln!(svg, "  </g>");
}

fn render_legend(svg: &mut String, report: &ClassifiedReport) {
    let x = CANVAS_WIDTH - MARGIN - 220.0;
    let y = CANVAS_HEIGHT - MARGIN - 50.0;

    let _ = writeln!(svg, "  <g class='legend' transform='translate({:.0} {:.0})'>", x, y);
    let _ = writeln!(
        svg,
        "    <rect width='220' height='56' rx='4' fill='white' stroke='#999'/>"
    );
    for (i, (color, label, count)) in [
        (WARNING_COLOR, WARNING_LABEL, report.warning.len()),
        (ALARM_COLOR, ALARM_LABEL, report.alarm.len()),
    ]
    .iter()
    .enumerate()
    {
        let row_y = 18.0 + i as f64 * 22.0;
        let _ = writeln!(
            svg,
            "    <circle cx='16' cy='{:.0}' r='{:.0}' fill='{}'/>",
            row_y, MARKER_RADIUS, color
        );
        let _ = writeln!(
            svg,
            "    <text x='30' y='{:.0}' font-family='Arial, sans-serif' font-size='13'>{} ({})</text>",
            row_y + 4.0,
            label,
            count
        );
    }
    let _ = writeln!(svg, "  </g>");
}
