use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, GreenbandsError>;

#[derive(thiserror::Error, Debug)]
pub enum GreenbandsError {
    #[error("Resolution {0} is not a valid pixel size")]
    InvalidResolution(f64),
    #[error("Band shapes do not match: expected {expected:?} found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Can not transform from {source_crs} to {dest_crs}")]
    UnknownCrs {
        source_crs: String,
        dest_crs: String,
        source: proj::ProjCreateError,
    },
    #[error("Fill value {0} is present in source raster")]
    AmbiguousFillValue(f64),
    #[error(transparent)]
    IoFailure(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error("There is no intersection between geometries")]
    NoIntersection,
    #[error("No polygon features in {0}")]
    NoFeatures(PathBuf),
    #[error("Band {0} is missing")]
    MissingBand(String),
    #[error("Unknown index {0}")]
    UnknownIndex(String),
    #[error("{0} is not a band key")]
    InvalidBandKey(String),
}
