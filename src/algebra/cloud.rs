use log::debug;
use ndarray::Zip;

use crate::{
    algebra::{
        check_shapes,
        options::{CloudCoverOptions, CloudMaskOptions},
    },
    components::{
        nodata::mask_zero_as_invalid,
        raster::Raster,
        resample::resample,
    },
    errors::Result,
};

/// Cloud flags and the share of valid pixels that are cloud.
#[derive(Debug, Clone)]
pub struct CloudCover {
    /// 1 for cloud, 0 otherwise.
    pub is_cloud: Raster,
    /// In percent of every pixel of the scene, no-data included.
    pub percentage: f64,
}

/// Braaten-Cohen-Yang cloud detection on green, red and SWIR reflectances.
///
/// A pixel is cloud when `(b_ratio > 1 || (b_ratio > 0 && ngdr > 0)) && swir > tau`
/// with `b_ratio = (green - 0.175) / 0.215` and `ngdr` the normalized
/// green/red difference. Inputs are zero masked and then scaled to surface
/// reflectance. Masked pixels are never cloud but still count towards the
/// scene size.
pub fn cloud_cover_percentage(
    green: &Raster,
    red: &Raster,
    swir: &Raster,
    options: &CloudCoverOptions,
) -> Result<CloudCover> {
    check_shapes(&[green, red, swir])?;
    let [green, red, swir] = [green, red, swir].map(mask_zero_as_invalid);
    let scale = options.reflectance_scale;
    let tau = options.tau;

    let is_cloud = Zip::from(green.band(0))
        .and(red.band(0))
        .and(swir.band(0))
        .par_map_collect(|green, red, swir| {
            let (green, red, swir) = (green / scale, red / scale, swir / scale);
            let b_ratio = (green - 0.175) / (0.39 - 0.175);
            let ngdr = (green - red) / (green + red);
            let cloud = (b_ratio > 1. || (b_ratio > 0. && ngdr > 0.)) && swir > tau;
            f64::from(u8::from(cloud))
        });

    let clouds = is_cloud.sum();
    let pixels = green.len();
    let percentage = clouds * 100. / pixels as f64;
    debug!("{clouds} cloud pixels over {pixels} pixels");
    Ok(CloudCover {
        is_cloud: green.with_band(is_cloud, None),
        percentage,
    })
}

/// 0/1 mask of the scene classification pixels in a cloud class,
/// resampled to the analysis resolution.
pub fn cloud_mask(scl: &Raster, options: &CloudMaskOptions) -> Result<Raster> {
    let classes = &options.classes;
    let mask = scl.band(0).mapv(|value| {
        let cloud = classes.iter().any(|class| f64::from(*class) == value);
        f64::from(u8::from(cloud))
    });
    resample(scl.with_band(mask, None), options.analysis_resolution)
}
