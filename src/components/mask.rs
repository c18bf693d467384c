use std::{fs, path::Path};

use geo::{BoundingRect, Intersects, Point, Polygon};
use log::{debug, info};
use ndarray::{s, Array2, Axis, Zip};

use crate::{
    components::{
        backends::{
            gdal_backend::GdalFile, read_geometry_collection, write_band, RasterFile, WriteOptions,
        },
        bounds::PixelBounds,
        raster::Raster,
    },
    crs_geo::CrsGeometry,
    errors::{GreenbandsError, Result},
    selection::BandSelection,
};

/// Crop `raster` to the bounding window of `polygon` and fill pixels outside it.
///
/// `polygon` must be in the raster crs. Pixels whose centre does not
/// intersect the polygon take `fill_value`, or else the raster no-data,
/// or else 0. The output no-data is the fill used.
pub fn crop(raster: &Raster, polygon: &Polygon, fill_value: Option<f64>) -> Result<Raster> {
    let rect = polygon
        .bounding_rect()
        .ok_or(GreenbandsError::NoIntersection)?;
    let window = PixelBounds::covering(&rect, raster.transform(), raster.size())?;
    let (col_off, row_off) = window.offset();
    let (width, height) = window.shape();
    debug!("cropping {:?} to window {window:?}", raster.array_shape());

    let transform = raster.transform();
    let inside = Array2::from_shape_fn((height, width), |(row, col)| {
        let center = transform.pixel_center(col_off + col, row_off + row);
        polygon.intersects(&Point::from(center))
    });

    let mut data = raster
        .data()
        .slice(s![.., row_off..row_off + height, col_off..col_off + width])
        .to_owned();

    if let Some(fill) = fill_value {
        let no_data = raster.no_data();
        let ambiguous = data.axis_iter(Axis(0)).any(|band| {
            Zip::from(band).and(&inside).fold(false, |found, value, inside| {
                found || (*inside && *value == fill && Some(*value) != no_data)
            })
        });
        if ambiguous {
            return Err(GreenbandsError::AmbiguousFillValue(fill));
        }
    }

    let fill = fill_value.or(raster.no_data()).unwrap_or(0.);
    data.axis_iter_mut(Axis(0)).for_each(|band| {
        Zip::from(band).and(&inside).for_each(|value, inside| {
            if !inside {
                *value = fill
            }
        })
    });

    let cropped = Raster::new(
        data,
        transform.shifted(col_off, row_off),
        raster.crs(),
        Some(fill),
    );
    Ok(cropped)
}

/// Like [`crop`] with the geometry projected into the raster crs first.
pub fn crop_by_shape(
    raster: &Raster,
    shape: &CrsGeometry<Polygon>,
    fill_value: Option<f64>,
) -> Result<Raster> {
    let polygon = shape.projected_geometry(raster.crs())?;
    crop(raster, &polygon, fill_value)
}

/// Crop every band of the raster file at `input` with `shape` and write it
/// to `output`, creating missing parent directories.
///
/// The output keeps the pixel type of the input and is tagged with the fill
/// value as no-data. The returned raster is the cropped data before any cast.
pub fn mask_file<P: AsRef<Path>, O: AsRef<Path>>(
    input: P,
    shape: &CrsGeometry<Polygon>,
    output: O,
    fill_value: Option<f64>,
) -> Result<Raster> {
    let output = output.as_ref();
    info!("masking {:?} to {output:?}", input.as_ref());
    let file = GdalFile::open(input)?;
    let raster = file.read(&BandSelection::all())?;
    let cropped = crop_by_shape(&raster, shape, fill_value)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    let options = WriteOptions::default()
        .with_pixel_type(file.pixel_type(0)?)
        .with_no_data(cropped.no_data());
    write_band(output, &cropped, &options)?;
    Ok(cropped)
}

/// [`mask_file`] with the first polygon of the vector file at `geometry`.
pub fn apply_mask<P: AsRef<Path>, G: AsRef<Path>, O: AsRef<Path>>(
    input: P,
    geometry: G,
    output: O,
    fill_value: Option<f64>,
) -> Result<Raster> {
    let shapes = read_geometry_collection(&geometry)?;
    let shape = shapes
        .first()
        .ok_or_else(|| GreenbandsError::NoFeatures(geometry.as_ref().to_path_buf()))?;
    mask_file(input, shape, output, fill_value)
}
