//! Source readers for the import pipeline
//!
//! Only GeoJSON sources are supported: a `FeatureCollection`, a single
//! `Feature`, or a bare `Geometry`.

use crate::error::{NgViewError, Result};
use geojson::{Feature, GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// File extensions accepted as vector sources
pub const VECTOR_EXTENSIONS: &[&str] = &["geojson", "json"];

/// Check that `path` is a source the loader can read
pub fn check_source(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(NgViewError::NotFound(path.to_path_buf()));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !VECTOR_EXTENSIONS.contains(&ext.as_str()) {
        return Err(NgViewError::UnsupportedFormat(format!(
            "{} (expected one of: {})",
            path.display(),
            VECTOR_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

/// Read every feature of a GeoJSON source
pub fn read_features(path: &Path) -> Result<Vec<Feature>> {
    check_source(path)?;
    let text = fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;
    Ok(match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    })
}

/// True for a missing geometry or one without any coordinates
pub fn is_empty_geometry(geometry: Option<&Geometry>) -> bool {
    match geometry {
        None => true,
        Some(geometry) => is_empty_value(&geometry.value),
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Point(position) => position.is_empty(),
        Value::MultiPoint(points) => points.is_empty(),
        Value::LineString(line) => line.is_empty(),
        Value::MultiLineString(lines) => lines.iter().all(|l| l.is_empty()),
        Value::Polygon(rings) => rings.iter().all(|r| r.is_empty()),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .all(|rings| rings.iter().all(|r| r.is_empty())),
        Value::GeometryCollection(members) => members.iter().all(|g| is_empty_value(&g.value)),
    }
}

/// GeoJSON type name of a geometry
pub fn geometry_type_name(geometry: Option<&Geometry>) -> &'static str {
    match geometry.map(|g| &g.value) {
        None => "None",
        Some(Value::Point(_)) => "Point",
        Some(Value::MultiPoint(_)) => "MultiPoint",
        Some(Value::LineString(_)) => "LineString",
        Some(Value::MultiLineString(_)) => "MultiLineString",
        Some(Value::Polygon(_)) => "Polygon",
        Some(Value::MultiPolygon(_)) => "MultiPolygon",
        Some(Value::GeometryCollection(_)) => "GeometryCollection",
    }
}

/// Geometry type shared by all features, "Mixed" otherwise
pub fn common_geometry_type<'a>(features: impl IntoIterator<Item = &'a Feature>) -> String {
    let mut common: Option<&'static str> = None;
    for feature in features {
        let name = geometry_type_name(feature.geometry.as_ref());
        match common {
            None => common = Some(name),
            Some(existing) if existing != name => return "Mixed".to_string(),
            Some(_) => {}
        }
    }
    common.unwrap_or("None").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_source(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_collection_feature_and_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let collection = write_source(
            dir.path(),
            "pts.geojson",
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,2.0]},"properties":{"id":1}},
                {"type":"Feature","geometry":null,"properties":{"id":2}}
            ]}"#,
        );
        let single = write_source(
            dir.path(),
            "one.json",
            r#"{"type":"Feature","geometry":{"type":"Point","coordinates":[0.0,0.0]},"properties":null}"#,
        );
        let bare = write_source(
            dir.path(),
            "line.geojson",
            r#"{"type":"LineString","coordinates":[[0.0,0.0],[1.0,1.0]]}"#,
        );

        let features = read_features(&collection).unwrap();
        assert_eq!(features.len(), 2);
        assert!(!is_empty_geometry(features[0].geometry.as_ref()));
        assert!(is_empty_geometry(features[1].geometry.as_ref()));
        assert_eq!(common_geometry_type(&features), "Mixed");

        assert_eq!(read_features(&single).unwrap().len(), 1);
        let line = read_features(&bare).unwrap();
        assert_eq!(common_geometry_type(&line), "LineString");
    }

    #[test]
    fn empty_coordinates_count_as_empty() {
        let empty_polygon = Geometry::new(Value::Polygon(vec![vec![]]));
        let empty_collection = Geometry::new(Value::GeometryCollection(vec![]));
        let point = Geometry::new(Value::Point(vec![3.0, 4.0]));
        assert!(is_empty_geometry(Some(&empty_polygon)));
        assert!(is_empty_geometry(Some(&empty_collection)));
        assert!(!is_empty_geometry(Some(&point)));
    }

    #[test]
    fn rejects_missing_and_unsupported_sources() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_features(&dir.path().join("nope.geojson")),
            Err(NgViewError::NotFound(_))
        ));
        let shp = write_source(dir.path(), "roads.shp", "binary");
        assert!(matches!(
            read_features(&shp),
            Err(NgViewError::UnsupportedFormat(_))
        ));
        let broken = write_source(dir.path(), "broken.geojson", "{not json");
        assert!(read_features(&broken).is_err());
    }
}
