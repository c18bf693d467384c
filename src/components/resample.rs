use log::debug;
use ndarray::{Array2, Array3};
use rayon::prelude::*;

use crate::{
    components::{raster::Raster, transforms::GeoTransform},
    errors::{GreenbandsError, Result},
};

/// Nearest neighbour resampling of every band of `band` to `target_resolution`.
///
/// The origin is kept and the new pixel size is exactly `target_resolution`
/// on both axes. Destination pixel centres are mapped to the source pixel
/// they fall in, clamped to the source extent.
pub fn resample(band: Raster, target_resolution: f64) -> Result<Raster> {
    if !(target_resolution > 0.) || !target_resolution.is_finite() {
        return Err(GreenbandsError::InvalidResolution(target_resolution));
    }
    let (res_x, res_y) = band.transform().resolution();
    if !(res_x > 0.) || !(res_y > 0.) {
        return Err(GreenbandsError::InvalidResolution(res_x.min(res_y)));
    }
    if res_x == target_resolution && res_y == target_resolution {
        return Ok(band);
    }

    let (width, height) = band.size();
    let new_width = (width as f64 * res_x / target_resolution).round() as usize;
    let new_height = (height as f64 * res_y / target_resolution).round() as usize;
    debug!(
        "resampling {width}x{height} at {res_x}/{res_y} to {new_width}x{new_height} at {target_resolution}"
    );

    let source_index = |index: usize, resolution: f64, len: usize| {
        let source = ((index as f64 + 0.5) * target_resolution / resolution).floor() as usize;
        source.min(len.saturating_sub(1))
    };
    let cols: Vec<usize> = (0..new_width)
        .map(|col| source_index(col, res_x, width))
        .collect();

    let bands = band.band_count();
    let mut buffer = vec![0.; bands * new_height * new_width];
    if new_width > 0 && new_height > 0 && width > 0 && height > 0 {
        let source = band.data();
        buffer
            .par_chunks_mut(new_width)
            .enumerate()
            .for_each(|(row_idx, row)| {
                let (band_idx, row_idx) = (row_idx / new_height, row_idx % new_height);
                let source_row = source_index(row_idx, res_y, height);
                row.iter_mut()
                    .zip(&cols)
                    .for_each(|(value, col)| *value = source[[band_idx, source_row, *col]]);
            });
    }

    let data = Array3::from_shape_vec((bands, new_height, new_width), buffer)?;
    let transform = band.transform().with_resolution(target_resolution);
    Ok(Raster::new(data, transform, band.crs(), band.no_data()))
}

/// Resample to `resolution / factor`, e.g. a factor of 2 turns 20m into 10m.
pub fn upsample(band: Raster, factor: f64) -> Result<Raster> {
    if !(factor > 0.) {
        return Err(GreenbandsError::InvalidResolution(factor));
    }
    let target_resolution = band.resolution() / factor;
    resample(band, target_resolution)
}

/// Nearest neighbour sampling of `band` onto the grid of `transform` and `size`.
///
/// Each destination pixel takes the source pixel its centre falls in.
/// Centres outside the source take its no-data, or NaN without one.
pub fn resample_to_grid(
    band: &Raster,
    transform: &GeoTransform,
    size: (usize, usize),
) -> Result<Raster> {
    let (res_x, res_y) = band.transform().resolution();
    if !(res_x > 0.) || !(res_y > 0.) {
        return Err(GreenbandsError::InvalidResolution(res_x.min(res_y)));
    }
    if band.transform() == transform && band.size() == size {
        return Ok(band.clone());
    }

    let (width, height) = size;
    let (source_width, source_height) = band.size();
    let inverse = band.transform().inverse()?;
    let fill = band.no_data().unwrap_or(f64::NAN);
    debug!(
        "sampling {source_width}x{source_height} onto {width}x{height} grid at {:?}",
        transform.origin()
    );

    let source_index = |value: f64, len: usize| {
        let index = value.floor();
        (index >= 0. && index < len as f64).then_some(index as usize)
    };
    let source_pixels = Array2::from_shape_fn((height, width), |(row, col)| {
        let pixel = inverse.apply(transform.pixel_center(col, row));
        source_index(pixel.x, source_width).zip(source_index(pixel.y, source_height))
    });

    let bands = band.band_count();
    let mut buffer = vec![fill; bands * height * width];
    if width > 0 && height > 0 {
        let source = band.data();
        buffer
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row_idx, row)| {
                let (band_idx, row_idx) = (row_idx / height, row_idx % height);
                row.iter_mut()
                    .zip(source_pixels.row(row_idx))
                    .for_each(|(value, pixel)| {
                        if let Some((col, source_row)) = pixel {
                            *value = source[[band_idx, *source_row, *col]];
                        }
                    });
            });
    }

    let data = Array3::from_shape_vec((bands, height, width), buffer)?;
    Ok(Raster::new(data, *transform, band.crs(), band.no_data()))
}

/// Sample `band` onto the grid of `reference`, origin and size included.
pub fn align_to(band: Raster, reference: &Raster) -> Result<Raster> {
    resample_to_grid(&band, reference.transform(), reference.size())
}

/// Sample every band onto the grid of the first band with the finest resolution.
///
/// Bands cropped separately at different resolutions end up on one grid
/// even when their windows start at different origins.
pub fn align_all(bands: Vec<Raster>) -> Result<Vec<Raster>> {
    let Some((transform, size)) = bands
        .iter()
        .reduce(|finest, band| {
            if band.resolution() < finest.resolution() {
                band
            } else {
                finest
            }
        })
        .map(|band| (*band.transform(), band.size()))
    else {
        return Ok(bands);
    };
    bands
        .into_iter()
        .map(|band| resample_to_grid(&band, &transform, size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use ndarray::{array, Array2};
    use rstest::{fixture, rstest};

    #[fixture]
    fn band_20m() -> Raster {
        Raster::from_band(
            array![[1., 2.], [3., 4.]],
            GeoTransform::north_up((300000., 4000000.), 20.),
            "EPSG:32630",
            Some(0.),
        )
    }

    #[rstest]
    fn same_resolution_is_unchanged(band_20m: Raster) {
        let resampled = resample(band_20m.clone(), 20.).unwrap();
        assert_eq!(resampled.data(), band_20m.data());
        assert_eq!(resampled.transform(), band_20m.transform());
    }

    #[rstest]
    fn upsampling_repeats_pixels(band_20m: Raster) {
        let resampled = resample(band_20m, 10.).unwrap();
        assert_eq!(resampled.size(), (4, 4));
        assert_eq!(
            resampled.band(0),
            array![
                [1., 1., 2., 2.],
                [1., 1., 2., 2.],
                [3., 3., 4., 4.],
                [3., 3., 4., 4.]
            ]
        );
        assert_eq!(resampled.transform().resolution(), (10., 10.));
        assert_eq!(resampled.transform().e(), -10.);
        assert_eq!(
            resampled.transform().origin(),
            Coord { x: 300000., y: 4000000. }
        );
        assert_eq!(resampled.no_data(), Some(0.));
        assert_eq!(resampled.crs(), "EPSG:32630");
    }

    #[rstest]
    #[case(10.)]
    #[case(60.)]
    fn resampling_twice_is_idempotent(band_20m: Raster, #[case] target: f64) {
        let once = resample(band_20m, target).unwrap();
        let twice = resample(once.clone(), target).unwrap();
        assert_eq!(twice.data(), once.data());
        assert_eq!(twice.transform(), once.transform());
    }

    #[rstest]
    fn downsampling_picks_covering_pixel() {
        let band = Raster::from_band(
            Array2::from_shape_fn((4, 4), |(row, col)| (row * 4 + col) as f64),
            GeoTransform::north_up((0., 40.), 10.),
            "EPSG:32630",
            None,
        );
        let resampled = resample(band, 20.).unwrap();
        assert_eq!(resampled.band(0), array![[5., 7.], [13., 15.]]);
    }

    #[rstest]
    fn every_band_is_resampled() {
        let data = Array3::from_shape_fn((3, 2, 2), |(band, _, _)| band as f64);
        let raster = Raster::new(data, GeoTransform::north_up((0., 40.), 20.), "EPSG:32630", None);
        let resampled = upsample(raster, 2.).unwrap();
        assert_eq!(resampled.array_shape(), [3, 4, 4]);
        assert!(resampled.band(2).iter().all(|value| *value == 2.));
    }

    #[rstest]
    #[case(0.)]
    #[case(-10.)]
    #[case(f64::NAN)]
    fn non_positive_target_fails(band_20m: Raster, #[case] target: f64) {
        assert!(matches!(
            resample(band_20m, target),
            Err(GreenbandsError::InvalidResolution(_))
        ));
    }

    #[rstest]
    fn zero_pixel_size_fails() {
        let band = Raster::from_band(
            array![[1.]],
            GeoTransform::new(0., 0., 0., 0., 0., 0.),
            "EPSG:32630",
            None,
        );
        assert!(matches!(
            resample(band, 10.),
            Err(GreenbandsError::InvalidResolution(_))
        ));
    }

    #[rstest]
    fn align_to_takes_reference_grid(band_20m: Raster) {
        let reference = Raster::from_band(
            Array2::zeros((4, 4)),
            GeoTransform::north_up((300000., 4000000.), 10.),
            "EPSG:32630",
            None,
        );
        let aligned = align_to(band_20m.clone(), &reference).unwrap();
        assert_eq!(aligned.band(0), resample(band_20m, 10.).unwrap().band(0));
        assert_eq!(aligned.transform(), reference.transform());
    }

    #[rstest]
    fn grid_outside_source_takes_no_data(band_20m: Raster) {
        let transform = GeoTransform::north_up((300030., 4000000.), 10.);
        let aligned = resample_to_grid(&band_20m, &transform, (2, 2)).unwrap();
        assert_eq!(aligned.band(0), array![[2., 0.], [2., 0.]]);
        assert_eq!(aligned.transform(), &transform);
    }

    #[rstest]
    fn windows_with_shifted_origins_share_a_grid() {
        // 10m window starting one pixel into a 20m one
        let band_10m = Raster::from_band(
            Array2::ones((3, 3)),
            GeoTransform::north_up((500010., 3999990.), 10.),
            "EPSG:32630",
            None,
        );
        let band_20m = Raster::from_band(
            array![[1., 2.], [3., 4.]],
            GeoTransform::north_up((500000., 4000000.), 20.),
            "EPSG:32630",
            None,
        );
        let aligned = align_all(vec![band_20m, band_10m.clone()]).unwrap();
        assert!(aligned
            .iter()
            .all(|band| band.size() == (3, 3) && band.transform() == band_10m.transform()));
        assert_eq!(
            aligned[0].band(0),
            array![[1., 2., 2.], [3., 4., 4.], [3., 4., 4.]]
        );
    }

    #[rstest]
    fn align_all_uses_finest_resolution(band_20m: Raster) {
        let band_10m = Raster::from_band(
            Array2::ones((4, 4)),
            GeoTransform::north_up((300000., 4000000.), 10.),
            "EPSG:32630",
            None,
        );
        let aligned = align_all(vec![band_20m, band_10m]).unwrap();
        assert!(aligned.iter().all(|band| band.size() == (4, 4)));
        assert!(aligned.iter().all(|band| band.resolution() == 10.));
    }
}
