use std::{fmt::Debug, path::Path};

use geo::Polygon;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::{
    components::{raster::Raster, transforms::GeoTransform},
    crs_geo::CrsGeometry,
    errors::Result,
    selection::BandSelection,
};

/// Pixel format of written files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelType {
    Byte,
    UInt16,
    Int16,
    Float32,
    Float64,
}

impl PixelType {
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Byte | Self::UInt16 | Self::Int16)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub driver: String,
    pub pixel_type: PixelType,
    /// Tagged no-data, falls back to the raster's own when `None`.
    pub no_data: Option<f64>,
    /// `COMPRESS` creation option, skipped when `None`.
    pub compress: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            driver: "GTiff".to_string(),
            pixel_type: PixelType::Float32,
            no_data: Some(f64::NAN),
            compress: Some("DEFLATE".to_string()),
        }
    }
}

impl WriteOptions {
    pub fn with_pixel_type(mut self, pixel_type: PixelType) -> Self {
        self.pixel_type = pixel_type;
        self
    }

    pub fn with_no_data(mut self, no_data: Option<f64>) -> Self {
        self.no_data = no_data;
        self
    }
}

/// Readable raster file.
pub trait RasterFile: Sized + Debug {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;
    /// (width, height)
    fn size(&self) -> (usize, usize);
    fn crs(&self) -> Result<String>;
    fn transform(&self) -> Result<GeoTransform>;
    fn num_bands(&self) -> usize;
    fn no_data(&self, index: usize) -> Result<Option<f64>>;
    /// Pixel format of the band at zero based `index`.
    fn pixel_type(&self, index: usize) -> Result<PixelType>;
    /// Read the whole band at zero based `index` into `buffer` (row major).
    fn read_into_slice(&self, index: usize, buffer: &mut [f64]) -> Result<()>;

    /// Read the selected bands into a single raster.
    ///
    /// No-data is taken from the first selected band.
    fn read(&self, selection: &BandSelection) -> Result<Raster> {
        let (width, height) = self.size();
        let indexes = selection.indexes_from(self.num_bands());
        let mut buffer = vec![0.; indexes.len() * width * height];
        if width > 0 && height > 0 {
            buffer
                .chunks_exact_mut(width * height)
                .zip(&indexes)
                .try_for_each(|(band_buffer, index)| self.read_into_slice(*index, band_buffer))?;
        }
        let no_data = match indexes.first() {
            Some(index) => self.no_data(*index)?,
            None => None,
        };
        let data = Array3::from_shape_vec((indexes.len(), height, width), buffer)?;
        Ok(Raster::new(data, self.transform()?, self.crs()?, no_data))
    }
}

pub trait RasterWriter {
    fn write<P: AsRef<Path>>(path: P, raster: &Raster, options: &WriteOptions) -> Result<()>;
}

/// Vector file holding polygon features.
pub trait GeometryFile {
    /// Every polygon of the first layer, multipolygons flattened.
    fn read_polygons<P: AsRef<Path>>(path: P) -> Result<Vec<CrsGeometry<Polygon>>>;
}

/// Implementations for gdal
pub mod gdal_backend {
    use super::*;
    use gdal::{
        cpl::CslStringList,
        raster::{Buffer, GdalDataType, GdalType},
        spatial_ref::SpatialRef,
        vector::LayerAccess,
        Dataset as GdalDataset, DriverManager,
    };
    use itertools::process_results;
    use log::{debug, info};
    use num::traits::AsPrimitive;
    use std::path::PathBuf;

    use crate::errors::GreenbandsError;

    /// Crs of layers without a spatial reference.
    pub const DEFAULT_GEOMETRY_CRS: &str = "EPSG:4326";

    /// `AUTH:CODE` when gdal knows the authority, otherwise WKT.
    pub fn crs_identifier(spatial_ref: &SpatialRef) -> Result<String> {
        match (spatial_ref.auth_name(), spatial_ref.auth_code()) {
            (Some(name), Ok(code)) => Ok(format!("{name}:{code}")),
            _ => Ok(spatial_ref.to_wkt()?),
        }
    }

    impl From<GdalDataType> for PixelType {
        /// Types without a counterpart widen to `Float64`.
        fn from(value: GdalDataType) -> Self {
            match value {
                GdalDataType::UInt8 => PixelType::Byte,
                GdalDataType::UInt16 => PixelType::UInt16,
                GdalDataType::Int16 => PixelType::Int16,
                GdalDataType::Float32 => PixelType::Float32,
                _ => PixelType::Float64,
            }
        }
    }

    #[derive(Debug)]
    pub struct GdalFile {
        path: PathBuf,
        dataset: GdalDataset,
    }

    impl GdalFile {
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl RasterFile for GdalFile {
        fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            info!("opening {:?}", path.as_ref());
            Ok(GdalFile {
                path: path.as_ref().to_path_buf(),
                dataset: GdalDataset::open(path.as_ref())?,
            })
        }
        fn size(&self) -> (usize, usize) {
            self.dataset.raster_size()
        }
        fn crs(&self) -> Result<String> {
            match self.dataset.spatial_ref() {
                Ok(spatial_ref) => crs_identifier(&spatial_ref),
                Err(_) => Ok(self.dataset.projection()),
            }
        }
        fn transform(&self) -> Result<GeoTransform> {
            Ok(GeoTransform::from_gdal(self.dataset.geo_transform()?))
        }
        fn num_bands(&self) -> usize {
            self.dataset.raster_count()
        }
        fn no_data(&self, index: usize) -> Result<Option<f64>> {
            Ok(self.dataset.rasterband(index + 1)?.no_data_value())
        }
        fn pixel_type(&self, index: usize) -> Result<PixelType> {
            Ok(self.dataset.rasterband(index + 1)?.band_type().into())
        }
        fn read_into_slice(&self, index: usize, buffer: &mut [f64]) -> Result<()> {
            let size = self.size();
            debug!("reading band {} of {:?}", index + 1, self.path);
            let rasterband = self.dataset.rasterband(index + 1)?;
            rasterband.read_into_slice::<f64>((0, 0), size, size, buffer, None)?;
            Ok(())
        }
    }

    pub struct GdalWriter;

    impl GdalWriter {
        fn write_as<T>(path: &Path, raster: &Raster, options: &WriteOptions) -> Result<()>
        where
            T: GdalType + Copy + 'static,
            f64: AsPrimitive<T>,
        {
            let (width, height) = raster.size();
            let driver = DriverManager::get_driver_by_name(&options.driver)?;
            let mut creation_options = CslStringList::new();
            if let Some(compress) = &options.compress {
                creation_options.set_name_value("COMPRESS", compress)?;
            }
            let mut dataset = driver.create_with_band_type_with_options::<T, _>(
                path,
                width,
                height,
                raster.band_count(),
                &creation_options,
            )?;
            dataset.set_geo_transform(&raster.transform().to_gdal())?;
            dataset.set_spatial_ref(&SpatialRef::from_definition(raster.crs())?)?;

            let no_data = options
                .no_data
                .or(raster.no_data())
                .filter(|no_data| !(options.pixel_type.is_integer() && no_data.is_nan()));
            for (index, band) in raster.data().outer_iter().enumerate() {
                let mut rasterband = dataset.rasterband(index + 1)?;
                if no_data.is_some() {
                    rasterband.set_no_data_value(no_data)?;
                }
                let values: Vec<T> = band.iter().map(|value| value.as_()).collect();
                let mut buffer = Buffer::new((width, height), values);
                rasterband.write((0, 0), (width, height), &mut buffer)?;
            }
            Ok(())
        }
    }

    impl RasterWriter for GdalWriter {
        fn write<P: AsRef<Path>>(path: P, raster: &Raster, options: &WriteOptions) -> Result<()> {
            let path = path.as_ref();
            info!(
                "writing {:?} as {:?} to {path:?}",
                raster.array_shape(),
                options.pixel_type
            );
            match options.pixel_type {
                PixelType::Byte => Self::write_as::<u8>(path, raster, options),
                PixelType::UInt16 => Self::write_as::<u16>(path, raster, options),
                PixelType::Int16 => Self::write_as::<i16>(path, raster, options),
                PixelType::Float32 => Self::write_as::<f32>(path, raster, options),
                PixelType::Float64 => Self::write_as::<f64>(path, raster, options),
            }
        }
    }

    pub struct GdalGeometryFile;

    impl GeometryFile for GdalGeometryFile {
        fn read_polygons<P: AsRef<Path>>(path: P) -> Result<Vec<CrsGeometry<Polygon>>> {
            let path = path.as_ref();
            info!("reading geometries from {path:?}");
            let dataset = GdalDataset::open(path)?;
            let mut layer = dataset.layer(0)?;
            let crs = match layer.spatial_ref() {
                Some(spatial_ref) => crs_identifier(&spatial_ref)?,
                None => DEFAULT_GEOMETRY_CRS.to_string(),
            };
            let geometries = layer
                .features()
                .filter_map(|feature| feature.geometry().map(|geometry| geometry.to_geo()))
                .collect::<Vec<_>>();
            let polygons = process_results(geometries, |geometries| {
                geometries
                    .flat_map(|geometry| match geometry {
                        geo::Geometry::Polygon(polygon) => vec![polygon],
                        geo::Geometry::MultiPolygon(multi_polygon) => multi_polygon.0,
                        _ => vec![],
                    })
                    .map(|polygon| CrsGeometry::new(&crs, polygon))
                    .collect::<Vec<_>>()
            })?;
            if polygons.is_empty() {
                return Err(GreenbandsError::NoFeatures(path.to_path_buf()));
            }
            debug!("read {} polygons in {crs}", polygons.len());
            Ok(polygons)
        }
    }
}

/// First band of the file at `path`.
pub fn read_band<P: AsRef<Path>>(path: P) -> Result<Raster> {
    read_raster(path, &BandSelection::first())
}

pub fn read_raster<P: AsRef<Path>>(path: P, selection: &BandSelection) -> Result<Raster> {
    gdal_backend::GdalFile::open(path)?.read(selection)
}

pub fn write_band<P: AsRef<Path>>(path: P, raster: &Raster, options: &WriteOptions) -> Result<()> {
    <gdal_backend::GdalWriter as RasterWriter>::write(path, raster, options)
}

pub fn read_geometry_collection<P: AsRef<Path>>(path: P) -> Result<Vec<CrsGeometry<Polygon>>> {
    gdal_backend::GdalGeometryFile::read_polygons(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn raster() -> Raster {
        let data = array![[[1., 2., 3.], [4., 5., 6.]], [[10., 20., 30.], [40., 50., 60.]]];
        Raster::new(
            data,
            GeoTransform::north_up((399960., 4200000.), 10.),
            "EPSG:32630",
            Some(0.),
        )
    }

    #[rstest]
    #[test_log::test]
    fn written_raster_reads_back(raster: Raster) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stack.tif");
        let options = WriteOptions::default().with_no_data(None);
        write_band(&path, &raster, &options).unwrap();

        let read = read_raster(&path, &BandSelection::all()).unwrap();
        assert_eq!(read.array_shape(), [2, 2, 3]);
        assert_eq!(read.data(), raster.data());
        assert_eq!(read.transform(), raster.transform());
        assert_eq!(read.crs(), "EPSG:32630");
        assert_eq!(read.no_data(), Some(0.));

        let second = read_raster(&path, &BandSelection::from([1])).unwrap();
        assert_eq!(second.band(0), raster.band(1));
    }

    #[rstest]
    #[test_log::test]
    fn integer_output_truncates_and_skips_nan_no_data(raster: Raster) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("byte.tif");
        let fractional = raster.with_data(raster.data().mapv(|value| value + 0.7), None);
        let options = WriteOptions::default().with_pixel_type(PixelType::Byte);
        write_band(&path, &fractional, &options).unwrap();

        let read = read_band(&path).unwrap();
        assert_eq!(read.band(0), raster.band(0));
        assert_eq!(read.no_data(), None);
    }

    #[rstest]
    #[case(PixelType::Byte)]
    #[case(PixelType::UInt16)]
    #[case(PixelType::Int16)]
    #[case(PixelType::Float64)]
    fn pixel_type_is_read_back(raster: Raster, #[case] pixel_type: PixelType) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("typed.tif");
        let options = WriteOptions::default().with_pixel_type(pixel_type);
        write_band(&path, &raster, &options).unwrap();

        let file = gdal_backend::GdalFile::open(&path).unwrap();
        assert_eq!(file.pixel_type(0).unwrap(), pixel_type);
        assert_eq!(file.pixel_type(1).unwrap(), pixel_type);
    }

    #[rstest]
    #[test_log::test]
    fn geometry_without_crs_defaults_to_wgs84() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aoi.geojson");
        let geojson = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                        [[[2.0, 2.0], [3.0, 2.0], [3.0, 3.0], [2.0, 2.0]]]
                    ]
                }
            }]
        }"#;
        std::fs::write(&path, geojson).unwrap();

        let shapes = read_geometry_collection(&path).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().all(|shape| shape.crs() == "EPSG:4326"));
    }

    #[rstest]
    fn write_options_default_to_float_geotiff() {
        let options = WriteOptions::default();
        assert_eq!(options.driver, "GTiff");
        assert_eq!(options.pixel_type, PixelType::Float32);
        assert!(options.no_data.is_some_and(f64::is_nan));
        assert_eq!(options.compress.as_deref(), Some("DEFLATE"));
    }

    #[rstest]
    fn missing_file_fails() {
        assert!(read_band("does/not/exist.tif").is_err());
    }
}
