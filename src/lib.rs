//! Sentinel-2 band alignment, spectral indices and geometry masking.

pub mod algebra;
pub mod components;
pub mod crs_geo;
pub mod errors;
pub mod intersection;
pub mod selection;
pub mod sensors;
pub mod workflow;

pub use algebra::{compute, Derived, IndexKind, IndexOptions, IndexResult};
pub use components::{GeoTransform, Raster};
pub use crs_geo::{project, CrsGeometry};
pub use errors::{GreenbandsError, Result};
pub use selection::BandSelection;
pub use workflow::{process_product, ProductReport, WorkflowOptions};
