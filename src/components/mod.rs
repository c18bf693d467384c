pub mod backends;
pub mod bounds;
pub mod mask;
pub mod nodata;
pub mod raster;
pub mod resample;
pub mod transforms;

pub use backends::{
    read_band, read_geometry_collection, read_raster, write_band, PixelType, WriteOptions,
};
pub use bounds::{GeoBounds, PixelBounds};
pub use mask::{apply_mask, crop, crop_by_shape, mask_file};
pub use nodata::{mask_nonfinite, mask_zero_as_invalid, valid_count, valid_mean};
pub use raster::Raster;
pub use resample::{align_all, align_to, resample, resample_to_grid, upsample};
pub use transforms::GeoTransform;
