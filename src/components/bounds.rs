use geo::{AffineOps, Coord, Rect};
use log::debug;
use shrinkwraprs::Shrinkwrap;

use crate::{
    components::transforms::GeoTransform,
    crs_geo::CrsGeometry,
    errors::{GreenbandsError, Result},
    intersection::Intersection,
};

/// Extent of a raster in 'geospace' with the raster crs.
#[derive(Shrinkwrap, Clone, Debug)]
pub struct GeoBounds(CrsGeometry<Rect>);

impl GeoBounds {
    pub fn new(transform: &GeoTransform, size: (usize, usize), crs: &str) -> Self {
        let pixel_rect = Rect::new((0., 0.), (size.0 as f64, size.1 as f64));
        let rect = pixel_rect.affine_transform(transform.as_affine());
        Self(CrsGeometry::new(crs, rect))
    }
}

impl From<CrsGeometry<Rect>> for GeoBounds {
    fn from(value: CrsGeometry<Rect>) -> Self {
        Self(value)
    }
}

/// Pixel window of a raster.
///
/// Deffined by:
///     - `offset`: Coords of top left pixel of the window,
///         with origin at top left pixel of raster.
///     - `shape`: (W, H) a.ka. columns and rows.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct PixelBounds(Rect<usize>);

impl PixelBounds {
    pub fn new(offset: (usize, usize), shape: (usize, usize)) -> Self {
        let offset = Coord::from(offset);
        let max = offset + Coord::from(shape);
        Self(Rect::new(offset, max))
    }

    /// Smallest window of a raster of `size` covering `rect`.
    ///
    /// Corners are mapped with the inverse transform, the min corner is
    /// floored and the max corner ceiled before clipping to the raster.
    pub fn covering(rect: &Rect, transform: &GeoTransform, size: (usize, usize)) -> Result<Self> {
        let inverse = transform.inverse()?;
        let mapped = rect.affine_transform(&inverse);
        let (min, max) = (mapped.min(), mapped.max());
        let pixel_rect = Rect::new((min.x.floor(), min.y.floor()), (max.x.ceil(), max.y.ceil()));
        let raster_rect = Rect::new((0., 0.), (size.0 as f64, size.1 as f64));
        let window = raster_rect.intersection(&pixel_rect)?;
        debug!("{rect:?} covers pixel window {window:?}");

        let offset = (window.min().x as usize, window.min().y as usize);
        let shape = (window.width() as usize, window.height() as usize);
        if shape.0 == 0 || shape.1 == 0 {
            return Err(GreenbandsError::NoIntersection);
        }
        Ok(Self::new(offset, shape))
    }

    /// Coords of the top left pixel of the window.
    pub fn offset(&self) -> (usize, usize) {
        self.0.min().x_y()
    }

    /// (width, height)
    pub fn shape(&self) -> (usize, usize) {
        (self.0.width(), self.0.height())
    }

    /// Pixel area of the window.
    pub fn size(&self) -> usize {
        self.0.width() * self.0.height()
    }
}
