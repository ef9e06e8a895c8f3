//! Single-band GeoTIFF output for the coverage raster.

use std::fs::File;
use std::path::Path;

use log::info;
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::Gray32;
use tiff::tags::Tag;

use super::Raster;
use crate::Error;

// GeoTIFF tag ids
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

// GeoKey ids
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

/// Write the raster as an uncompressed single-band u32 GeoTIFF with
/// ModelPixelScale/ModelTiepoint georeferencing and a GeoKey directory
/// carrying the EPSG code.
pub fn write_geotiff(raster: &Raster, path: &Path) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(file)?;

    let (rows, cols) = raster.shape();
    let mut image = encoder.new_image::<Gray32>(cols as u32, rows as u32)?;

    let gt = raster.transform();
    let scale = [gt.cell, gt.cell, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;

    // Tiepoint: raster (0,0,0) maps to the grid origin
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;

    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geo_keys(raster)[..])?;

    // GDAL reads the nodata value from this ASCII tag
    let nodata = raster.nodata().to_string();
    image
        .encoder()
        .write_tag(Tag::Unknown(GDAL_NODATA), nodata.as_str())?;

    let data = raster
        .data()
        .as_slice()
        .ok_or_else(|| Error::Raster("raster data is not contiguous".to_string()))?;
    image.write_data(data)?;

    info!(
        "Coverage raster saved: {} ({cols}x{rows}, {}, nodata {})",
        path.display(),
        raster.crs(),
        raster.nodata()
    );

    Ok(())
}

/// Minimal GeoKey directory: model type, raster type (pixel-is-area) and
/// the EPSG code of the frame.
fn geo_keys(raster: &Raster) -> Vec<u16> {
    let epsg = raster.crs().epsg() as u16;
    let (model_type, crs_key) = if raster.crs().is_geographic() {
        (2, GEOGRAPHIC_TYPE) // ModelTypeGeographic
    } else {
        (1, PROJECTED_CS_TYPE) // ModelTypeProjected
    };

    vec![
        1, 1, 0, 3, // Version 1.1.0, 3 keys
        GT_MODEL_TYPE, 0, 1, model_type,
        GT_RASTER_TYPE, 0, 1, 1, // RasterPixelIsArea
        crs_key, 0, 1, epsg,
    ]
}
