use crate::components::raster::Raster;

/// Zero and the declared no-data value become NaN.
///
/// The result always declares NaN as no-data, so masking twice is a no-op.
pub fn mask_zero_as_invalid(band: &Raster) -> Raster {
    let no_data = band.no_data();
    let mut data = band.data().to_owned();
    data.par_mapv_inplace(|value| {
        if value == 0. || no_data.is_some_and(|no_data| value == no_data) {
            f64::NAN
        } else {
            value
        }
    });
    band.with_data(data, Some(f64::NAN))
}

/// `+inf` and `-inf` become NaN.
pub fn mask_nonfinite(band: &Raster) -> Raster {
    let mut data = band.data().to_owned();
    data.par_mapv_inplace(|value| if value.is_infinite() { f64::NAN } else { value });
    band.with_data(data, band.no_data())
}

/// Mean over finite samples of all bands, NaN when there are none.
pub fn valid_mean(band: &Raster) -> f64 {
    let (sum, count) = band
        .data()
        .iter()
        .filter(|value| value.is_finite())
        .fold((0., 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Number of finite samples over all bands.
pub fn valid_count(band: &Raster) -> usize {
    band.data().iter().filter(|value| value.is_finite()).count()
}
