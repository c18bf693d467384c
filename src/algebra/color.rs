use ndarray::{stack, Array3, Axis};

use crate::{
    algebra::check_shapes,
    components::raster::Raster,
    errors::{GreenbandsError, Result},
};

/// Red, green and blue stacked and scaled so the brightest sample of the
/// three is 255. Values are truncated and invalid samples become 0.
pub fn true_color(red: &Raster, green: &Raster, blue: &Raster) -> Result<Raster> {
    check_shapes(&[red, green, blue])?;
    let mut rgb = stack(Axis(0), &[red.band(0), green.band(0), blue.band(0)])?;
    let max = rgb
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if max > 0. {
        rgb.par_mapv_inplace(|value| {
            if value.is_finite() {
                (value * 255. / max).trunc()
            } else {
                0.
            }
        });
    } else {
        rgb.fill(0.);
    }
    Ok(red.with_data(rgb, Some(0.)))
}

/// Interleaved `[rows, cols, 3]` bytes of a three band composite.
pub fn to_rgb8(composite: &Raster) -> Result<Array3<u8>> {
    if composite.band_count() != 3 {
        return Err(GreenbandsError::MissingBand(format!(
            "{} of 3 color bands",
            composite.band_count()
        )));
    }
    Ok(composite
        .data()
        .permuted_axes([1, 2, 0])
        .mapv(|value| value.clamp(0., 255.) as u8))
}
