use std::sync::Arc;

use geo::{BoundingRect, Rect};
use log::debug;
use proj::{Proj, Transform};
use shrinkwraprs::Shrinkwrap;

use crate::errors::{GreenbandsError, Result};

/// Geometry tagged with the crs its coordinates are expressed in.
#[derive(Shrinkwrap, Debug, Clone, PartialEq)]
pub struct CrsGeometry<G> {
    crs: Arc<str>,
    #[shrinkwrap(main_field)]
    geometry: G,
}

impl<G> CrsGeometry<G> {
    pub fn new(crs: &str, geometry: G) -> Self {
        Self {
            crs: Arc::from(crs),
            geometry,
        }
    }

    pub fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn into_geometry(self) -> G {
        self.geometry
    }
}

impl<G: Transform<f64, Output = G> + Clone> CrsGeometry<G> {
    pub fn with_crs(mut self, crs: &str) -> Result<Self> {
        if self.crs().ne(crs) {
            let proj = known_crs_proj(self.crs(), crs)?;
            self.crs = Arc::from(crs);
            self.geometry.transform(&proj)?;
        }
        Ok(self)
    }

    /// Clones if crs is same.
    pub fn projected_geometry(&self, crs: &str) -> Result<G> {
        project(&self.geometry, self.crs(), crs)
    }
}

impl<G> CrsGeometry<G>
where
    G: BoundingRect<f64>,
    G::Output: Into<Option<Rect>>,
{
    pub fn bounding_rect(&self) -> Option<CrsGeometry<Rect>> {
        let geometry: Option<Rect> = self.geometry.bounding_rect().into();
        Some(CrsGeometry {
            crs: Arc::clone(&self.crs),
            geometry: geometry?,
        })
    }
}

/// Transform every vertex of `geometry` from `source_crs` to `dest_crs`.
///
/// Axis order is always x then y (longitude, latitude for geographic crs).
pub fn project<G: Transform<f64, Output = G> + Clone>(
    geometry: &G,
    source_crs: &str,
    dest_crs: &str,
) -> Result<G> {
    if source_crs.eq(dest_crs) {
        return Ok(geometry.clone());
    }
    let proj = known_crs_proj(source_crs, dest_crs)?;
    Ok(geometry.transformed(&proj)?)
}

fn known_crs_proj(source_crs: &str, dest_crs: &str) -> Result<Proj> {
    debug!("projecting from {source_crs} to {dest_crs}");
    Proj::new_known_crs(source_crs, dest_crs, None).map_err(|source| {
        GreenbandsError::UnknownCrs {
            source_crs: source_crs.to_string(),
            dest_crs: dest_crs.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::{polygon, Coord, Polygon};
    use rstest::{fixture, rstest};

    #[fixture]
    fn square() -> Polygon {
        polygon![
            (x: -3.1, y: 40.1),
            (x: -3.0, y: 40.1),
            (x: -3.0, y: 40.2),
            (x: -3.1, y: 40.2),
        ]
    }

    #[rstest]
    fn same_crs_is_identity(square: Polygon) {
        let projected = project(&square, "EPSG:4326", "EPSG:4326").unwrap();
        assert_eq!(projected, square);
    }

    #[rstest]
    fn same_crs_geometry_keeps_coordinates(square: Polygon) {
        let geometry = CrsGeometry::new("EPSG:4326", square.clone());
        let projected = geometry.with_crs("EPSG:4326").unwrap();
        assert_eq!(projected.crs(), "EPSG:4326");
        assert_eq!(projected.geometry(), &square);
    }

    #[rstest]
    fn central_meridian_maps_to_false_easting() {
        let point = geo::Point::new(-3., 0.);
        let projected = project(&point, "EPSG:4326", "EPSG:32630").unwrap();
        assert_abs_diff_eq!(projected.x(), 500000., epsilon = 1e-3);
        assert_abs_diff_eq!(projected.y(), 0., epsilon = 1e-3);
    }

    #[rstest]
    fn projected_polygon_keeps_vertex_count(square: Polygon) {
        let geometry = CrsGeometry::new("EPSG:4326", square.clone());
        let projected = geometry.with_crs("EPSG:32630").unwrap();
        assert_eq!(projected.crs(), "EPSG:32630");
        assert_eq!(
            projected.exterior().0.len(),
            square.exterior().0.len()
        );
        let Coord { x, .. } = projected.exterior().0[0];
        assert!(x < 500000.);
    }

    #[rstest]
    #[case("EPSG:4326", "EPSG:999999")]
    #[case("not-a-crs", "EPSG:32630")]
    fn unresolvable_crs_fails(square: Polygon, #[case] source: &str, #[case] dest: &str) {
        assert!(matches!(
            project(&square, source, dest),
            Err(GreenbandsError::UnknownCrs { .. })
        ));
    }

    #[rstest]
    fn bounding_rect_keeps_crs(square: Polygon) {
        let rect = CrsGeometry::new("EPSG:4326", square).bounding_rect().unwrap();
        assert_eq!(rect.crs(), "EPSG:4326");
        assert_abs_diff_eq!(rect.min().x, -3.1);
        assert_abs_diff_eq!(rect.max().y, 40.2);
    }
}
