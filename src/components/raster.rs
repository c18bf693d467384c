use std::{fmt::Debug, sync::Arc};

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut3, Axis};

use crate::components::{bounds::GeoBounds, transforms::GeoTransform};

/// Georeferenced stack of bands that share size, resolution and crs.
///
/// Samples are held as `f64` in a `(C, H, W)` array so that no-data can be
/// carried as NaN through arithmetic regardless of the source pixel type.
#[derive(Clone)]
pub struct Raster {
    data: Array3<f64>,
    transform: GeoTransform,
    crs: Arc<str>,
    no_data: Option<f64>,
}

impl Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("shape", &self.array_shape())
            .field("transform", &self.transform)
            .field("crs", &self.crs)
            .field("no_data", &self.no_data)
            .finish()
    }
}

impl Raster {
    pub fn new(
        data: Array3<f64>,
        transform: GeoTransform,
        crs: impl Into<Arc<str>>,
        no_data: Option<f64>,
    ) -> Self {
        Self {
            data,
            transform,
            crs: crs.into(),
            no_data,
        }
    }

    /// Single band raster.
    pub fn from_band(
        band: Array2<f64>,
        transform: GeoTransform,
        crs: impl Into<Arc<str>>,
        no_data: Option<f64>,
    ) -> Self {
        Self::new(band.insert_axis(Axis(0)), transform, crs, no_data)
    }

    /// New raster on the same grid and crs holding `data`.
    pub fn with_data(&self, data: Array3<f64>, no_data: Option<f64>) -> Self {
        Self {
            data,
            transform: self.transform,
            crs: Arc::clone(&self.crs),
            no_data,
        }
    }

    /// New single band raster on the same grid and crs.
    pub fn with_band(&self, band: Array2<f64>, no_data: Option<f64>) -> Self {
        self.with_data(band.insert_axis(Axis(0)), no_data)
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// (width, height)
    pub fn size(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// Array shape (C, H, W)
    pub fn array_shape(&self) -> [usize; 3] {
        [self.band_count(), self.height(), self.width()]
    }

    /// Number of samples over all bands.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn band(&self, index: usize) -> ArrayView2<f64> {
        self.data.index_axis(Axis(0), index)
    }

    pub fn data(&self) -> ArrayView3<f64> {
        self.data.view()
    }

    pub fn data_mut(&mut self) -> ArrayViewMut3<f64> {
        self.data.view_mut()
    }

    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    pub fn set_no_data(&mut self, no_data: Option<f64>) {
        self.no_data = no_data
    }

    /// Pixel size along x.
    pub fn resolution(&self) -> f64 {
        self.transform.resolution().0
    }

    pub fn geo_bounds(&self) -> GeoBounds {
        GeoBounds::new(&self.transform, self.size(), self.crs())
    }
}
