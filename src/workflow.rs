//! End to end processing of one Sentinel-2 product over an area of interest.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    algebra::{compute, Derived, IndexKind, IndexOptions},
    components::{
        backends::{read_geometry_collection, write_band},
        mask::mask_file,
        raster::Raster,
        resample::align_all,
    },
    errors::{GreenbandsError, Result},
    sensors::{sentinel2::BandKey, Sensor, Sentinel2},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowOptions {
    /// Products computed when the scene is clear enough.
    pub indices: Vec<IndexKind>,
    /// Products with a higher cloud cover percentage are skipped.
    pub max_cloud_cover: f64,
    /// Value of pixels outside the area of interest.
    pub fill_value: Option<f64>,
    pub index_options: IndexOptions,
    pub output_dir: PathBuf,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            indices: IndexKind::ALL
                .into_iter()
                .filter(|kind| *kind != IndexKind::CloudCoverPercentage)
                .collect(),
            max_cloud_cover: 0.5,
            fill_value: None,
            index_options: IndexOptions::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// One written product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexReport {
    /// Mean, percentage or none for composites.
    pub value: Option<f64>,
    pub output: PathBuf,
    /// Masked input images by band key.
    pub bands: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReport {
    pub product: String,
    pub geometry: String,
    pub cloud_cover: f64,
    /// Cloud cover above the threshold, no index computed.
    pub skipped: bool,
    pub indices: BTreeMap<IndexKind, IndexReport>,
    /// Error message of every index that could not be computed.
    pub failures: BTreeMap<IndexKind, String>,
}

/// Masked band image kept in memory next to its written file.
struct MaskedImage {
    path: PathBuf,
    raster: Raster,
}

struct MaskedProduct {
    images: BTreeMap<BandKey, MaskedImage>,
    output_dir: PathBuf,
}

impl MaskedProduct {
    fn inputs(&self, kind: IndexKind) -> Result<Vec<(&str, &MaskedImage)>> {
        kind.bands()
            .iter()
            .map(|key| {
                let band_key: BandKey = key.parse()?;
                self.images
                    .get(&band_key)
                    .map(|image| (*key, image))
                    .ok_or_else(|| GreenbandsError::MissingBand(key.to_string()))
            })
            .collect()
    }

    /// Formula output and the masked inputs it was computed from.
    fn derive(
        &self,
        kind: IndexKind,
        options: &IndexOptions,
    ) -> Result<(Derived, BTreeMap<String, PathBuf>)> {
        let inputs = self.inputs(kind)?;
        let bands = inputs
            .iter()
            .map(|(key, image)| (key.to_string(), image.path.clone()))
            .collect();
        let aligned = align_all(inputs.iter().map(|(_, image)| image.raster.clone()).collect())?;
        let aligned: Vec<&Raster> = aligned.iter().collect();
        Ok((compute(kind, &aligned, options)?, bands))
    }

    fn write(&self, kind: IndexKind, derived: &Derived) -> Result<PathBuf> {
        let output = self.output_dir.join(format!("{kind}.tif"));
        write_band(&output, derived.raster(), &kind.write_options())?;
        Ok(output)
    }
}

/// Crop every band image of `product` to the first polygon of `geometry`,
/// gate on cloud cover and compute the requested indices.
///
/// Outputs land in `<output_dir>/<product>/<geometry file name>/`. Indices
/// that fail are reported and do not stop the others.
pub fn process_product<P: AsRef<Path>, G: AsRef<Path>>(
    product: P,
    geometry: G,
    options: &WorkflowOptions,
) -> Result<ProductReport> {
    let (product, geometry) = (product.as_ref(), geometry.as_ref());
    let product_name = file_stem(product);
    let geometry_name = file_name(geometry);
    let output_dir = options.output_dir.join(&product_name).join(&geometry_name);
    fs::create_dir_all(&output_dir)?;

    let masked = mask_images(product, geometry, &output_dir, options.fill_value)?;

    let cloud_kind = IndexKind::CloudCoverPercentage;
    let (cloud_cover, cloud_bands) = masked.derive(cloud_kind, &options.index_options)?;
    let cloud_percentage = cloud_cover.value().unwrap_or(f64::NAN);
    let cloud_output = masked.write(cloud_kind, &cloud_cover)?;

    let mut report = ProductReport {
        product: product_name,
        geometry: geometry_name,
        cloud_cover: cloud_percentage,
        skipped: false,
        indices: BTreeMap::from([(
            cloud_kind,
            IndexReport {
                value: Some(cloud_percentage),
                output: cloud_output,
                bands: cloud_bands,
            },
        )]),
        failures: BTreeMap::new(),
    };

    if cloud_percentage > options.max_cloud_cover {
        info!(
            "{} cloud cover percentage ({cloud_percentage}) above threshold, skipping",
            report.product
        );
        report.skipped = true;
        return Ok(report);
    }

    let derived: Vec<_> = options
        .indices
        .par_iter()
        .filter(|kind| **kind != cloud_kind)
        .map(|kind| (*kind, masked.derive(*kind, &options.index_options)))
        .collect();

    for (kind, result) in derived {
        let written = result.and_then(|(derived, bands)| {
            let output = masked.write(kind, &derived)?;
            Ok(IndexReport {
                value: derived.value(),
                output,
                bands,
            })
        });
        match written {
            Ok(index_report) => {
                report.indices.insert(kind, index_report);
            }
            Err(error) => {
                warn!("{} {kind} failed: {error}", report.product);
                report.failures.insert(kind, error.to_string());
            }
        }
    }
    Ok(report)
}

fn mask_images(
    product: &Path,
    geometry: &Path,
    output_dir: &Path,
    fill_value: Option<f64>,
) -> Result<MaskedProduct> {
    let shapes = read_geometry_collection(geometry)?;
    let shape = shapes
        .first()
        .ok_or_else(|| GreenbandsError::NoFeatures(geometry.to_path_buf()))?;

    let mut images = BTreeMap::new();
    for (key, path) in Sentinel2::product_images(product)?.iter() {
        let masked_path = output_dir.join(format!("{}.tif", file_stem(path)));
        let raster = mask_file(path, shape, &masked_path, fill_value)?;
        images.insert(
            key.clone(),
            MaskedImage {
                path: masked_path,
                raster,
            },
        );
    }
    info!("masked {} images of {product:?}", images.len());
    Ok(MaskedProduct {
        images,
        output_dir: output_dir.to_path_buf(),
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
