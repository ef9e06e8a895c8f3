//! GeoJSON vector I/O. Every file carries its frame as a foreign `crs`
//! member (`urn:ogc:def:crs:EPSG::<code>`), defaulted to WGS84 on read.

use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use log::debug;
use serde_json::json;

use crate::Error;
use crate::crs::Crs;
use crate::model::PointRecord;
use crate::raster::PolygonLayer;
use crate::routing::EdgeFrequency;

fn crs_member(crs: Crs) -> JsonObject {
    let mut foreign = JsonObject::new();
    foreign.insert(
        "crs".to_string(),
        json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", crs.epsg()) },
        }),
    );
    foreign
}

fn parse_crs(collection: &FeatureCollection) -> Crs {
    collection
        .foreign_members
        .as_ref()
        .and_then(|fm| fm.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(JsonValue::as_str)
        .and_then(|name| name.rsplit(':').next())
        .and_then(|code| code.parse::<u32>().ok())
        .and_then(Crs::from_epsg)
        .unwrap_or(Crs::Wgs84)
}

fn read_collection(path: &Path) -> Result<FeatureCollection, Error> {
    let text = fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;
    Ok(FeatureCollection::try_from(geojson)?)
}

fn write_collection(
    path: &Path,
    features: Vec<Feature>,
    crs: Crs,
) -> Result<(), Error> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member(crs)),
    };
    fs::write(path, GeoJson::from(collection).to_string())?;
    Ok(())
}

fn name_property(feature: &Feature) -> Option<String> {
    feature
        .properties
        .as_ref()
        .and_then(|props| props.get("name"))
        .and_then(JsonValue::as_str)
        .map(str::to_owned)
}

/// Read a point file. Features without point geometry are skipped.
pub fn read_point_set(path: &Path) -> Result<(Vec<PointRecord>, Crs), Error> {
    let collection = read_collection(path)?;
    let crs = parse_crs(&collection);

    let mut records = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let geometry = geo::Geometry::try_from(geometry.value.clone())?;
        if let geo::Geometry::Point(point) = geometry {
            records.push(PointRecord::new(name_property(feature), point));
        }
    }

    debug!("Read {} points from {}", records.len(), path.display());
    Ok((records, crs))
}

pub fn write_point_set(path: &Path, records: &[PointRecord], crs: Crs) -> Result<(), Error> {
    let features = records
        .iter()
        .map(|record| {
            let mut properties = JsonObject::new();
            if let Some(name) = &record.name {
                properties.insert("name".to_string(), json!(name));
            }
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::GeometryValue::from(
                    &record.geometry,
                ))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    write_collection(path, features, crs)
}

/// Read a polygon file into a layer named after the file stem.
/// MultiPolygon features are flattened into their parts.
pub fn read_polygon_layer(path: &Path) -> Result<PolygonLayer, Error> {
    let collection = read_collection(path)?;
    let crs = parse_crs(&collection);

    let mut polygons = Vec::new();
    for feature in &collection.features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        match geo::Geometry::try_from(geometry.value.clone())? {
            geo::Geometry::Polygon(polygon) => polygons.push(polygon),
            geo::Geometry::MultiPolygon(multi) => polygons.extend(multi.0),
            _ => {}
        }
    }

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    debug!("Read {} polygons from {}", polygons.len(), path.display());
    Ok(PolygonLayer {
        name,
        polygons,
        crs,
    })
}

pub fn write_polygon_layer(
    path: &Path,
    labeled: &[(String, geo::Polygon<f64>)],
    crs: Crs,
) -> Result<(), Error> {
    let features = labeled
        .iter()
        .map(|(name, polygon)| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), json!(name));
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::GeometryValue::from(polygon))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    write_collection(path, features, crs)
}

/// Write the route-frequency edge table: one LineString feature per edge
/// with endpoint ids, length and accumulated count.
pub fn write_edge_layer(path: &Path, edges: &[EdgeFrequency], crs: Crs) -> Result<(), Error> {
    let features = edges
        .iter()
        .map(|edge| {
            let mut properties = JsonObject::new();
            properties.insert("from".to_string(), json!(edge.from));
            properties.insert("to".to_string(), json!(edge.to));
            properties.insert("length".to_string(), json!(edge.length));
            properties.insert("route_freq".to_string(), json!(edge.route_freq));
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::GeometryValue::from(&edge.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    write_collection(path, features, crs)
}
