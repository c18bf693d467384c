//! Per pixel formulas over co-registered single band rasters.
//!
//! Inputs are zero masked before any arithmetic and outputs have their
//! infinities turned into NaN, so a zero denominator never errors.

pub mod cloud;
pub mod color;
pub mod indices;
pub mod options;

use std::{fmt::Display, str::FromStr};

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::{
    components::{
        backends::{PixelType, WriteOptions},
        nodata::{mask_nonfinite, mask_zero_as_invalid, valid_mean},
        raster::Raster,
    },
    errors::{GreenbandsError, Result},
};

pub use cloud::{cloud_cover_percentage, cloud_mask, CloudCover};
pub use color::{to_rgb8, true_color};
pub use indices::*;
pub use options::{CloudCoverOptions, CloudMaskOptions, IndexOptions, NdsiOptions, OsaviOptions};

/// Derived single band raster and the mean of its valid pixels.
#[derive(Debug, Clone)]
pub struct IndexResult {
    pub raster: Raster,
    pub mean: f64,
}

impl IndexResult {
    pub fn new(raster: Raster) -> Self {
        let mean = valid_mean(&raster);
        Self { raster, mean }
    }
}

/// Output of any formula in [`IndexKind`].
#[derive(Debug, Clone)]
pub enum Derived {
    Index(IndexResult),
    CloudCover(CloudCover),
    CloudMask(Raster),
    TrueColor(Raster),
}

impl Derived {
    pub fn raster(&self) -> &Raster {
        match self {
            Derived::Index(result) => &result.raster,
            Derived::CloudCover(cover) => &cover.is_cloud,
            Derived::CloudMask(raster) | Derived::TrueColor(raster) => raster,
        }
    }

    /// Figure reported for the product, none for composites.
    pub fn value(&self) -> Option<f64> {
        match self {
            Derived::Index(result) => Some(result.mean),
            Derived::CloudCover(cover) => Some(cover.percentage),
            Derived::CloudMask(raster) => Some(valid_mean(raster)),
            Derived::TrueColor(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexKind {
    CloudCoverPercentage,
    CloudMask,
    TrueColor,
    Moisture,
    Ndvi,
    Ndsi,
    Ndwi,
    Evi2,
    Osavi,
    Ndre,
    Mndwi,
    Bri,
    Evi,
    /// Also known as NDBG.
    Ndyi,
    Ri,
    Cri1,
    Bsi,
}

impl IndexKind {
    pub const ALL: [IndexKind; 17] = [
        IndexKind::CloudCoverPercentage,
        IndexKind::CloudMask,
        IndexKind::TrueColor,
        IndexKind::Moisture,
        IndexKind::Ndvi,
        IndexKind::Ndsi,
        IndexKind::Ndwi,
        IndexKind::Evi2,
        IndexKind::Osavi,
        IndexKind::Ndre,
        IndexKind::Mndwi,
        IndexKind::Bri,
        IndexKind::Evi,
        IndexKind::Ndyi,
        IndexKind::Ri,
        IndexKind::Cri1,
        IndexKind::Bsi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            IndexKind::CloudCoverPercentage => "cloud-cover-percentage",
            IndexKind::CloudMask => "cloud-mask",
            IndexKind::TrueColor => "true-color",
            IndexKind::Moisture => "moisture",
            IndexKind::Ndvi => "ndvi",
            IndexKind::Ndsi => "ndsi",
            IndexKind::Ndwi => "ndwi",
            IndexKind::Evi2 => "evi2",
            IndexKind::Osavi => "osavi",
            IndexKind::Ndre => "ndre",
            IndexKind::Mndwi => "mndwi",
            IndexKind::Bri => "bri",
            IndexKind::Evi => "evi",
            IndexKind::Ndyi => "ndyi",
            IndexKind::Ri => "ri",
            IndexKind::Cri1 => "cri1",
            IndexKind::Bsi => "bsi",
        }
    }

    /// Sentinel-2 band keys of the inputs, in argument order.
    pub fn bands(&self) -> &'static [&'static str] {
        match self {
            IndexKind::CloudCoverPercentage => &["B03_20m", "B04_20m", "B11_20m"],
            IndexKind::CloudMask => &["SCL_20m"],
            IndexKind::TrueColor => &["B04_10m", "B03_10m", "B02_10m"],
            IndexKind::Moisture => &["B8A_20m", "B11_20m"],
            IndexKind::Ndvi | IndexKind::Evi2 | IndexKind::Osavi => &["B04_10m", "B08_10m"],
            IndexKind::Ndsi | IndexKind::Mndwi => &["B03_20m", "B11_20m"],
            IndexKind::Ndwi => &["B03_10m", "B08_10m"],
            IndexKind::Ndre => &["B05_60m", "B09_60m"],
            IndexKind::Bri => &["B03_10m", "B05_20m", "B08_10m"],
            IndexKind::Evi => &["B02_10m", "B04_10m", "B08_10m"],
            IndexKind::Ndyi | IndexKind::Cri1 => &["B02_10m", "B03_10m"],
            IndexKind::Ri => &["B03_10m", "B04_10m"],
            IndexKind::Bsi => &["B02_10m", "B04_20m", "B08_10m", "B11_20m"],
        }
    }

    /// Output format of the written product.
    pub fn write_options(&self) -> WriteOptions {
        match self {
            IndexKind::CloudMask => WriteOptions::default()
                .with_pixel_type(PixelType::Byte)
                .with_no_data(None),
            IndexKind::TrueColor => WriteOptions::default()
                .with_pixel_type(PixelType::Byte)
                .with_no_data(Some(0.)),
            IndexKind::CloudCoverPercentage => WriteOptions::default().with_no_data(None),
            _ => WriteOptions::default(),
        }
    }
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IndexKind {
    type Err = GreenbandsError;

    fn from_str(s: &str) -> Result<Self> {
        IndexKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GreenbandsError::UnknownIndex(s.to_string()))
    }
}

/// Run the formula of `kind` on `bands`, ordered as [`IndexKind::bands`].
pub fn compute(kind: IndexKind, bands: &[&Raster], options: &IndexOptions) -> Result<Derived> {
    use IndexKind::*;
    let derived = match (kind, bands) {
        (CloudCoverPercentage, [green, red, swir, ..]) => {
            Derived::CloudCover(cloud_cover_percentage(green, red, swir, &options.cloud_cover)?)
        }
        (CloudMask, [scl, ..]) => Derived::CloudMask(cloud_mask(scl, &options.cloud_mask)?),
        (TrueColor, [red, green, blue, ..]) => Derived::TrueColor(true_color(red, green, blue)?),
        (Moisture, [b8a, swir, ..]) => Derived::Index(moisture(b8a, swir)?),
        (Ndvi, [red, nir, ..]) => Derived::Index(ndvi(red, nir)?),
        (Ndsi, [green, swir, ..]) => Derived::Index(ndsi(green, swir, &options.ndsi)?),
        (Ndwi, [green, nir, ..]) => Derived::Index(ndwi(green, nir)?),
        (Evi2, [red, nir, ..]) => Derived::Index(evi2(red, nir)?),
        (Osavi, [red, nir, ..]) => Derived::Index(osavi(red, nir, &options.osavi)?),
        (Ndre, [b5, b9, ..]) => Derived::Index(ndre(b5, b9)?),
        (Mndwi, [green, swir, ..]) => Derived::Index(mndwi(green, swir)?),
        (Bri, [green, red_edge, nir, ..]) => Derived::Index(bri(green, red_edge, nir)?),
        (Evi, [blue, red, nir, ..]) => Derived::Index(evi(blue, red, nir)?),
        (Ndyi, [blue, green, ..]) => Derived::Index(ndyi(blue, green)?),
        (Ri, [green, red, ..]) => Derived::Index(ri(green, red)?),
        (Cri1, [blue, green, ..]) => Derived::Index(cri1(blue, green)?),
        (Bsi, [blue, red, nir, swir, ..]) => Derived::Index(bsi(blue, red, nir, swir)?),
        (kind, bands) => {
            let missing = kind.bands().get(bands.len()).copied().unwrap_or(kind.name());
            return Err(GreenbandsError::MissingBand(missing.to_string()));
        }
    };
    Ok(derived)
}

/// All bands must share the grid size of the first.
pub(crate) fn check_shapes(bands: &[&Raster]) -> Result<()> {
    if let Some((first, rest)) = bands.split_first() {
        if let Some(band) = rest.iter().find(|band| band.size() != first.size()) {
            return Err(GreenbandsError::ShapeMismatch {
                expected: first.size(),
                found: band.size(),
            });
        }
    }
    Ok(())
}

fn finish(reference: &Raster, data: Array2<f64>) -> IndexResult {
    IndexResult::new(mask_nonfinite(&reference.with_band(data, Some(f64::NAN))))
}

pub(crate) fn binary<F>(a: &Raster, b: &Raster, formula: F) -> Result<IndexResult>
where
    F: Fn(f64, f64) -> f64 + Sync + Send,
{
    check_shapes(&[a, b])?;
    let (a, b) = (mask_zero_as_invalid(a), mask_zero_as_invalid(b));
    let data = Zip::from(a.band(0))
        .and(b.band(0))
        .par_map_collect(|a, b| formula(*a, *b));
    Ok(finish(&a, data))
}

pub(crate) fn ternary<F>(a: &Raster, b: &Raster, c: &Raster, formula: F) -> Result<IndexResult>
where
    F: Fn(f64, f64, f64) -> f64 + Sync + Send,
{
    check_shapes(&[a, b, c])?;
    let (a, b, c) = (
        mask_zero_as_invalid(a),
        mask_zero_as_invalid(b),
        mask_zero_as_invalid(c),
    );
    let data = Zip::from(a.band(0))
        .and(b.band(0))
        .and(c.band(0))
        .par_map_collect(|a, b, c| formula(*a, *b, *c));
    Ok(finish(&a, data))
}

pub(crate) fn quaternary<F>(
    a: &Raster,
    b: &Raster,
    c: &Raster,
    d: &Raster,
    formula: F,
) -> Result<IndexResult>
where
    F: Fn(f64, f64, f64, f64) -> f64 + Sync + Send,
{
    check_shapes(&[a, b, c, d])?;
    let [a, b, c, d] = [a, b, c, d].map(mask_zero_as_invalid);
    let data = Zip::from(a.band(0))
        .and(b.band(0))
        .and(c.band(0))
        .and(d.band(0))
        .par_map_collect(|a, b, c, d| formula(*a, *b, *c, *d));
    Ok(finish(&a, data))
}
