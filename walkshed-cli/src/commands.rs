//! One function per pipeline stage, wired to the run configuration.

use std::path::{Path, PathBuf};

use geo::{BoundingRect, Point, Rect};
use tracing::info;
use walkshed_core::crs::{Crs, estimate_utm, project};
use walkshed_core::io;
use walkshed_core::loading::overpass::walk_network_query;
use walkshed_core::model::PointRecord;
use walkshed_core::prelude::*;
use walkshed_core::routing::edge_frequency_table;

use crate::config::Config;

/// WGS84 bounding box of the study-area polygon file.
fn study_bbox(config: &Config) -> Result<Rect<f64>, Error> {
    let layer = io::read_polygon_layer(&config.study_area)?;

    layer
        .polygons
        .iter()
        .map(|p| project(p, layer.crs, Crs::Wgs84))
        .filter_map(|p| p.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                geo::coord! {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                geo::coord! {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })
        .ok_or_else(|| {
            Error::InvalidData(format!(
                "study area {} contains no polygons",
                config.study_area.display()
            ))
        })
}

fn build_street_graph(config: &Config, bbox: &Rect<f64>) -> Result<StreetGraph, Error> {
    let client = OverpassClient::new(&config.overpass_url)?;
    let response = client.query(&walk_network_query(bbox))?;
    street_graph_from_overpass(&response)
}

/// Category POI files in the output directory, in taxonomy order.
fn poi_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "geojson")
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with("poi_"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Category label from a POI filename: the slug after the `poi_NN_`
/// prefix, or the full stem when the prefix is absent.
fn category_of(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.splitn(3, '_')
        .nth(2)
        .map(str::to_owned)
        .unwrap_or(stem)
}

pub fn pois(config: &Config) -> Result<(), Error> {
    let bbox = study_bbox(config)?;
    let client = OverpassClient::new(&config.overpass_url)?;
    let written = retrieve_pois(&client, &bbox, &default_taxonomy(), &config.pois_dir)?;
    info!("Retrieved {written} POI categories into {}", config.pois_dir.display());
    Ok(())
}

pub fn isochrones(config: &Config) -> Result<(), Error> {
    let bbox = study_bbox(config)?;
    let graph = build_street_graph(config, &bbox)?;
    let cutoff = f64::from(config.cutoff());
    std::fs::create_dir_all(&config.isochrones_dir)?;

    for path in poi_files(&config.pois_dir)? {
        let (records, crs) = io::read_point_set(&path)?;
        let records: Vec<PointRecord> = records
            .into_iter()
            .map(|r| PointRecord::new(r.name, project(&r.geometry, crs, graph.crs())))
            .collect();

        let category = category_of(&path);
        let hulls = poi_isochrones(&graph, &records, cutoff);
        if hulls.is_empty() {
            tracing::warn!("No isochrones produced for {category}");
            continue;
        }

        let out = config
            .isochrones_dir
            .join(format!("isochrones_{category}.geojson"));
        io::write_polygon_layer(&out, &hulls, graph.crs())?;
        info!("Wrote {} isochrones for {category}", hulls.len());
    }

    Ok(())
}

pub fn rasterize(config: &Config) -> Result<(), Error> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&config.isochrones_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "geojson"))
        .collect();
    paths.sort();

    let layers = paths
        .iter()
        .map(|path| io::read_polygon_layer(path))
        .collect::<Result<Vec<_>, _>>()?;

    let raster = stack_coverage(&layers, config.resolution)?;
    write_geotiff(&raster, &config.coverage_raster)?;
    Ok(())
}

pub fn routes(config: &Config) -> Result<(), Error> {
    let bbox = study_bbox(config)?;
    let center: Point<f64> = bbox.center().into();
    let target = estimate_utm(center.x(), center.y());

    let graph = build_street_graph(config, &bbox)?.to_crs(target);
    info!(
        "Street graph projected to {target}: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    let (buildings, crs) = io::read_point_set(&config.buildings)?;
    let buildings = project_records(buildings, crs, target);

    let mut categories = Vec::new();
    for path in poi_files(&config.pois_dir)? {
        let (records, crs) = io::read_point_set(&path)?;
        categories.push(CategoryPois {
            category: category_of(&path),
            pois: project_records(records, crs, target),
        });
    }

    let frequencies = accumulate_route_frequencies(&graph, &buildings, &categories);
    let table = edge_frequency_table(&graph, &frequencies);
    io::write_edge_layer(&config.routes_output, &table, target)?;
    info!(
        "Wrote {} edges ({} routes) to {}",
        table.len(),
        frequencies.routes(),
        config.routes_output.display()
    );
    Ok(())
}

fn project_records(records: Vec<PointRecord>, from: Crs, to: Crs) -> Vec<PointRecord> {
    records
        .into_iter()
        .map(|r| PointRecord::new(r.name, project(&r.geometry, from, to)))
        .collect()
}
