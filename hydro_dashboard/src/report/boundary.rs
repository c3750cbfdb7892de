//! Country boundary layer for the map report.
//!
//! Reads polygon outlines from a GeoJSON file. Accepts a FeatureCollection,
//! a single Feature, or a bare Polygon / MultiPolygon geometry. Only the
//! ring coordinates are kept; properties are ignored.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::model::HydroError;

/// Longitude/latitude extent of a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// Closed rings of `(lon, lat)` points, outer and inner alike.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLayer {
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl BoundaryLayer {
    /// Load a layer from a GeoJSON file on disk.
    pub fn load(path: &Path) -> Result<Self, HydroError> {
        let text = fs::read_to_string(path).map_err(|e| {
            HydroError::Boundary(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_geojson(&text)
    }

    pub fn from_geojson(text: &str) -> Result<Self, HydroError> {
        let json: Value = serde_json::from_str(text)
            .map_err(|e| HydroError::Boundary(format!("invalid GeoJSON: {}", e)))?;

        let mut rings = Vec::new();
        collect_rings(&json, &mut rings)?;

        if rings.is_empty() {
            return Err(HydroError::Boundary(
                "GeoJSON contains no polygon geometry".to_string(),
            ));
        }
        Ok(Self { rings })
    }

    /// Extent of all rings. A layer always holds at least one ring.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for &(lon, lat) in self.rings.iter().flatten() {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        bbox
    }
}

fn collect_rings(json: &Value, rings: &mut Vec<Vec<(f64, f64)>>) -> Result<(), HydroError> {
    match json.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = json
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| HydroError::Boundary("FeatureCollection without features".into()))?;
            for feature in features {
                collect_rings(feature, rings)?;
            }
        }
        Some("Feature") => {
            // Features with null geometry are legal GeoJSON; skip them.
            if let Some(geometry) = json.get("geometry").filter(|g| !g.is_null()) {
                collect_rings(geometry, rings)?;
            }
        }
        Some("GeometryCollection") => {
            if let Some(geometries) = json.get("geometries").and_then(Value::as_array) {
                for geometry in geometries {
                    collect_rings(geometry, rings)?;
                }
            }
        }
        Some("Polygon") => {
            let polygon = coordinates(json)?;
            push_polygon(polygon, rings)?;
        }
        Some("MultiPolygon") => {
            let polygons = coordinates(json)?
                .as_array()
                .ok_or_else(|| HydroError::Boundary("MultiPolygon coordinates not an array".into()))?;
            for polygon in polygons {
                push_polygon(polygon, rings)?;
            }
        }
        // Points and lines carry no area to draw.
        Some(_) => {}
        None => return Err(HydroError::Boundary("GeoJSON object without a type".into())),
    }
    Ok(())
}

fn coordinates(geometry: &Value) -> Result<&Value, HydroError> {
    geometry
        .get("coordinates")
        .ok_or_else(|| HydroError::Boundary("geometry without coordinates".into()))
}

fn push_polygon(polygon: &Value, rings: &mut Vec<Vec<(f64, f64)>>) -> Result<(), HydroError> {
    let ring_values = polygon
        .as_array()
        .ok_or_else(|| HydroError::Boundary("polygon coordinates not an array".into()))?;

    for ring_value in ring_values {
        let positions = ring_value
            .as_array()
            .ok_or_else(|| HydroError::Boundary("ring not an array".into()))?;
        let mut ring = Vec::with_capacity(positions.len());
        for position in positions {
            let lon = position.get(0).and_then(Value::as_f64);
            let lat = position.get(1).and_then(Value::as_f64);
            match (lon, lat) {
                (Some(lon), Some(lat)) => ring.push((lon, lat)),
                _ => return Err(HydroError::Boundary(format!("bad position {}", position))),
            }
        }
        if !ring.is_empty() {
            rings.push(ring);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_FEATURE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "Polska"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[14.0, 49.0], [24.0, 49.0], [24.0, 55.0], [14.0, 55.0], [14.0, 49.0]]]
            }
        }]
    }"#;

    #[test]
    fn test_feature_collection_polygon() {
        let layer = BoundaryLayer::from_geojson(SQUARE_FEATURE).expect("should parse");
        assert_eq!(layer.rings.len(), 1);
        assert_eq!(layer.rings[0].len(), 5);

        let bbox = layer.bounding_box();
        assert_eq!(bbox.min_lon, 14.0);
        assert_eq!(bbox.max_lon, 24.0);
        assert_eq!(bbox.min_lat, 49.0);
        assert_eq!(bbox.max_lat, 55.0);
        assert_eq!(bbox.width(), 10.0);
        assert_eq!(bbox.height(), 6.0);
    }

    #[test]
    fn test_bare_multipolygon() {
        let json = r#"{
            "type": "MultiPolygon",
            "coordinates": [
                [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                [[[5, 5], [6, 5], [6, 6], [5, 5]], [[5.2, 5.2], [5.4, 5.2], [5.4, 5.4], [5.2, 5.2]]]
            ]
        }"#;
        let layer = BoundaryLayer::from_geojson(json).expect("should parse");
        assert_eq!(layer.rings.len(), 3, "outer and inner rings are all kept");
        assert_eq!(layer.bounding_box().max_lat, 6.0);
    }

    #[test]
    fn test_null_geometry_features_are_skipped() {
        let json = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "geometry": null, "properties": {}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [0, 1], [0, 0]]]}}
        ]}"#;
        let layer = BoundaryLayer::from_geojson(json).expect("should parse");
        assert_eq!(layer.rings.len(), 1);
    }

    #[test]
    fn test_layer_without_polygons_is_rejected() {
        let json = r#"{"type": "Feature", "geometry": {"type": "Point", "coordinates": [19, 50]}}"#;
        assert!(matches!(
            BoundaryLayer::from_geojson(json),
            Err(HydroError::Boundary(_))
        ));
    }

    #[test]
    fn test_invalid_json_is_boundary_error() {
        assert!(matches!(
            BoundaryLayer::from_geojson("not json"),
            Err(HydroError::Boundary(_))
        ));
    }

    #[test]
    fn test_missing_file_is_boundary_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = BoundaryLayer::load(&dir.path().join("poland.geojson"));
        assert!(matches!(result, Err(HydroError::Boundary(_))), "got {:?}", result);
    }
}
