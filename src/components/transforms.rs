use geo::{AffineTransform, Coord};
use shrinkwraprs::Shrinkwrap;

use crate::errors::{GreenbandsError, Result};

/// Affine mapping from pixel `(col, row)` to crs coordinates.
///
/// Coefficients follow the `(a, b, c, d, e, f)` convention:
///     - `x = a * col + b * row + c`
///     - `y = d * col + e * row + f`
///
/// `(c, f)` is the top left corner of the raster and `(a, e)` the pixel size,
/// with `e` negative for north-up rasters.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self(AffineTransform::new(a, b, c, d, e, f))
    }

    /// North-up transform without rotation.
    pub fn north_up(origin: (f64, f64), resolution: f64) -> Self {
        Self::new(resolution, 0., origin.0, 0., -resolution, origin.1)
    }

    /// From gdal ordering `[c, a, b, f, d, e]`.
    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.xoff(),
            self.a(),
            self.b(),
            self.yoff(),
            self.d(),
            self.e(),
        ]
    }

    pub fn as_affine(&self) -> &AffineTransform {
        &self.0
    }

    pub fn origin(&self) -> Coord {
        Coord {
            x: self.xoff(),
            y: self.yoff(),
        }
    }

    /// Absolute pixel size as (x, y).
    pub fn resolution(&self) -> (f64, f64) {
        (self.a().abs(), self.e().abs())
    }

    /// Same origin and rotation, pixel size set to `resolution`
    /// keeping the sign of each axis.
    pub fn with_resolution(&self, resolution: f64) -> Self {
        Self::new(
            resolution.copysign(self.a()),
            self.b(),
            self.xoff(),
            self.d(),
            resolution.copysign(self.e()),
            self.yoff(),
        )
    }

    /// Same pixel size with the origin moved to the corner of pixel `(col, row)`.
    pub fn shifted(&self, col: usize, row: usize) -> Self {
        let origin = self.pixel_corner(col, row);
        Self::new(
            self.a(),
            self.b(),
            origin.x,
            self.d(),
            self.e(),
            origin.y,
        )
    }

    /// Top left corner of pixel `(col, row)`.
    pub fn pixel_corner(&self, col: usize, row: usize) -> Coord {
        self.apply(Coord {
            x: col as f64,
            y: row as f64,
        })
    }

    pub fn pixel_center(&self, col: usize, row: usize) -> Coord {
        self.apply(Coord {
            x: col as f64 + 0.5,
            y: row as f64 + 0.5,
        })
    }

    /// Transform from crs coordinates to fractional pixel coordinates.
    pub fn inverse(&self) -> Result<AffineTransform> {
        self.0
            .inverse()
            .ok_or(GreenbandsError::InvalidResolution(self.a()))
    }
}

impl From<AffineTransform> for GeoTransform {
    fn from(value: AffineTransform) -> Self {
        Self(value)
    }
}
