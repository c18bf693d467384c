use crate::{
    algebra::{binary, check_shapes, options::*, quaternary, ternary, IndexResult},
    components::{raster::Raster, resample::align_to},
    errors::Result,
};

fn normalized_difference(a: f64, b: f64) -> f64 {
    (a - b) / (a + b)
}

/// Normalized Difference Vegetation Index.
pub fn ndvi(red: &Raster, nir: &Raster) -> Result<IndexResult> {
    binary(red, nir, |red, nir| normalized_difference(nir, red))
}

/// Normalized Difference Water Index.
pub fn ndwi(green: &Raster, nir: &Raster) -> Result<IndexResult> {
    binary(green, nir, normalized_difference)
}

/// Normalized Difference Snow Index as a snow flag.
///
/// Pixels with a ratio strictly above the threshold are 1, the rest 0.
/// Pixels without a ratio (a zero or no-data input, or a zero sum) are NaN,
/// not 0.
pub fn ndsi(green: &Raster, swir: &Raster, options: &NdsiOptions) -> Result<IndexResult> {
    let threshold = options.threshold;
    binary(green, swir, |green, swir| {
        let ratio = normalized_difference(green, swir);
        if ratio.is_nan() {
            f64::NAN
        } else {
            f64::from(u8::from(ratio > threshold))
        }
    })
}

/// Modified Normalized Difference Water Index.
pub fn mndwi(green: &Raster, swir: &Raster) -> Result<IndexResult> {
    binary(green, swir, normalized_difference)
}

/// Enhanced Vegetation Index.
pub fn evi(blue: &Raster, red: &Raster, nir: &Raster) -> Result<IndexResult> {
    ternary(blue, red, nir, |blue, red, nir| {
        2.5 * (nir - red) / (nir + 6. * red - 7.5 * blue + 1.)
    })
}

/// Two band Enhanced Vegetation Index.
pub fn evi2(red: &Raster, nir: &Raster) -> Result<IndexResult> {
    binary(red, nir, |red, nir| 2.4 * (nir - red) / (nir + red + 1.))
}

/// Optimized Soil Adjusted Vegetation Index.
pub fn osavi(red: &Raster, nir: &Raster, options: &OsaviOptions) -> Result<IndexResult> {
    let y = options.y;
    binary(red, nir, |red, nir| (1. + y) * (nir - red) / (nir + red + y))
}

/// Normalized Difference Red Edge.
pub fn ndre(b5: &Raster, b9: &Raster) -> Result<IndexResult> {
    binary(b5, b9, |b5, b9| normalized_difference(b9, b5))
}

/// Browning Reflectance Index.
///
/// `red_edge` is sampled onto the grid of `green` first, so a 20m red edge
/// band can be combined with 10m green and near infrared.
pub fn bri(green: &Raster, red_edge: &Raster, nir: &Raster) -> Result<IndexResult> {
    check_shapes(&[green, nir])?;
    let red_edge = align_to(red_edge.clone(), green)?;
    ternary(green, &red_edge, nir, |green, red_edge, nir| {
        (1. / green - 1. / red_edge) / nir
    })
}

/// Normalized Difference Yellowness Index.
pub fn ndyi(blue: &Raster, green: &Raster) -> Result<IndexResult> {
    binary(blue, green, |blue, green| normalized_difference(green, blue))
}

/// Redness Index.
pub fn ri(green: &Raster, red: &Raster) -> Result<IndexResult> {
    binary(green, red, |green, red| normalized_difference(red, green))
}

/// Carotenoid Reflectance Index 1.
pub fn cri1(blue: &Raster, green: &Raster) -> Result<IndexResult> {
    binary(blue, green, |blue, green| (1. / blue) / (1. / green))
}

/// Bare Soil Index.
pub fn bsi(blue: &Raster, red: &Raster, nir: &Raster, swir: &Raster) -> Result<IndexResult> {
    quaternary(blue, red, nir, swir, |blue, red, nir, swir| {
        normalized_difference(swir + red, nir + blue)
    })
}

/// Normalized Difference Moisture Index.
pub fn moisture(b8a: &Raster, swir: &Raster) -> Result<IndexResult> {
    binary(b8a, swir, normalized_difference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algebra::tests::{band, pixel},
        components::transforms::GeoTransform,
        errors::GreenbandsError,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use rstest::{fixture, rstest};

    struct Bands {
        b1: Raster,
        b2: Raster,
        b3: Raster,
    }

    #[fixture]
    fn bands() -> Bands {
        Bands {
            b1: pixel(1.),
            b2: pixel(2.),
            b3: pixel(3.),
        }
    }

    #[rstest]
    fn normalized_differences(bands: Bands) {
        let Bands { b1, b3, .. } = &bands;
        assert_abs_diff_eq!(ndvi(b1, b3).unwrap().mean, 0.5);
        assert_abs_diff_eq!(ndwi(b3, b1).unwrap().mean, 0.5);
        assert_abs_diff_eq!(ndyi(b1, b3).unwrap().mean, 0.5);
        assert_abs_diff_eq!(ri(b1, b3).unwrap().mean, 0.5);
        assert_abs_diff_eq!(mndwi(b3, b1).unwrap().mean, 0.5);
        assert_abs_diff_eq!(moisture(b3, b1).unwrap().mean, 0.5);
        assert_abs_diff_eq!(ndre(b1, b3).unwrap().mean, 0.5);
    }

    #[rstest]
    fn vegetation_indices(bands: Bands) {
        let Bands { b1, b2, b3 } = &bands;
        assert_abs_diff_eq!(evi(b1, b2, b3).unwrap().mean, 2.5 / 8.5, epsilon = 1e-9);
        assert_abs_diff_eq!(evi2(b1, b2).unwrap().mean, 0.6, epsilon = 1e-9);
        let osavi = osavi(b1, b2, &OsaviOptions::default()).unwrap();
        assert_abs_diff_eq!(osavi.mean, 0.367, epsilon = 1e-3);
        assert_abs_diff_eq!(bri(b1, b2, b3).unwrap().mean, 0.167, epsilon = 1e-3);
        assert_abs_diff_eq!(bsi(b1, b2, b3, b3).unwrap().mean, 0.1111, epsilon = 1e-4);
        assert_abs_diff_eq!(cri1(b1, b1).unwrap().mean, 1.);
    }

    #[rstest]
    #[case(0.3)]
    #[case(1234.)]
    fn self_difference_vanishes(#[case] value: f64) {
        let band = pixel(value);
        assert_eq!(ndvi(&band, &band).unwrap().mean, 0.);
        assert_eq!(ri(&band, &band).unwrap().mean, 0.);
    }

    #[rstest]
    fn ndvi_known_pixel() {
        let result = ndvi(&pixel(0.1), &pixel(0.5)).unwrap();
        assert_abs_diff_eq!(result.raster.band(0)[[0, 0]], 0.4 / 0.6, epsilon = 1e-12);
    }

    #[rstest]
    #[case(1., 3., 0.)]
    #[case(3., 1., 1.)]
    #[case(1.4, 0.6, 0.)]
    #[case(1.5, 0.5, 1.)]
    fn ndsi_thresholds_ratio(#[case] green: f64, #[case] swir: f64, #[case] expected: f64) {
        let result = ndsi(&pixel(green), &pixel(swir), &NdsiOptions::default()).unwrap();
        assert_eq!(result.raster.band(0)[[0, 0]], expected);
    }

    #[rstest]
    fn ndsi_keeps_masked_pixels_as_nan() {
        let green = band(array![[0., 3.]]);
        let swir = band(array![[1., 1.]]);
        let result = ndsi(&green, &swir, &NdsiOptions::default()).unwrap();
        assert!(result.raster.band(0)[[0, 0]].is_nan());
        assert_eq!(result.raster.band(0)[[0, 1]], 1.);
    }

    #[rstest]
    fn zero_inputs_propagate_as_nan() {
        let red = band(array![[0., 0.2], [0.3, 0.4]]);
        let nir = band(array![[0.5, 0.6], [0., 0.8]]);
        let result = ndvi(&red, &nir).unwrap();
        let output = result.raster.band(0);
        assert!(output[[0, 0]].is_nan());
        assert!(output[[1, 0]].is_nan());
        assert_abs_diff_eq!(output[[0, 1]], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(result.mean, (0.5 + 1. / 3.) / 2., epsilon = 1e-12);
        assert!(result.raster.no_data().is_some_and(f64::is_nan));
    }

    #[rstest]
    fn zero_denominator_is_nan_not_error() {
        let result = ndvi(&pixel(-1.), &pixel(1.)).unwrap();
        assert!(result.raster.band(0)[[0, 0]].is_nan());
        assert!(result.mean.is_nan());
    }

    #[rstest]
    fn moisture_of_ones_and_twos() {
        let b8a = band(Array2::ones((2, 2)));
        let swir = band(Array2::from_elem((2, 2), 2.));
        let result = moisture(&b8a, &swir).unwrap();
        assert!(result.raster.band(0).iter().all(|value| (value + 1. / 3.).abs() < 1e-12));
    }

    #[rstest]
    fn bri_upsamples_red_edge() {
        let green = band(Array2::from_elem((4, 4), 1.));
        let nir = band(Array2::from_elem((4, 4), 2.));
        let red_edge = Raster::from_band(
            Array2::from_elem((2, 2), 2.),
            GeoTransform::north_up((399960., 4200000.), 20.),
            "EPSG:32630",
            None,
        );
        let result = bri(&green, &red_edge, &nir).unwrap();
        assert_eq!(result.raster.size(), (4, 4));
        assert_abs_diff_eq!(result.mean, 0.25);
    }

    #[rstest]
    fn bri_rejects_misaligned_nir() {
        let green = band(Array2::ones((4, 4)));
        let nir = band(Array2::ones((3, 3)));
        assert!(matches!(
            bri(&green, &green, &nir),
            Err(GreenbandsError::ShapeMismatch { .. })
        ));
    }
}
