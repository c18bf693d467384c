use std::{
    collections::BTreeMap,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{GreenbandsError, Result};

use super::{ProductImages, Sensor};

const BANDS: [&str; 17] = [
    "B01", "B02", "B03", "B04", "B05", "B06", "B07", "B08", "B8A", "B09", "B10", "B11", "B12",
    "SCL", "TCI", "AOT", "WVP",
];
const RESOLUTIONS: [u16; 3] = [10, 20, 60];
const IMAGE_EXTENSIONS: [&str; 3] = ["jp2", "tif", "tiff"];

#[derive(Debug)]
pub struct Sentinel2;

impl Sensor for Sentinel2 {
    type BandKey = BandKey;

    /// Keys are the last seven characters of the file stem,
    /// e.g. `T30SVG_20210101T105441_B03_10m.jp2` is `B03_10m`.
    fn band_key(path: &Path) -> Option<BandKey> {
        let stem = path.file_stem()?.to_str()?;
        let key = stem.get(stem.len().checked_sub(7)?..)?;
        key.parse().ok()
    }

    /// Walks `GRANULE/*/IMG_DATA/**` of a `.SAFE` product directory.
    ///
    /// The first image found for a key wins, in path order.
    fn product_images<P: AsRef<Path>>(product: P) -> Result<ProductImages<BandKey>> {
        let granules = product.as_ref().join("GRANULE");
        let mut images = BTreeMap::new();
        for granule in sorted_entries(&granules)? {
            let img_data = granule.join("IMG_DATA");
            if img_data.is_dir() {
                collect_images(&img_data, &mut images)?;
            }
        }
        debug!("found {} band images in {:?}", images.len(), product.as_ref());
        Ok(ProductImages::new(images))
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn collect_images(dir: &Path, images: &mut BTreeMap<BandKey, PathBuf>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if path.is_dir() {
            collect_images(&path, images)?;
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| IMAGE_EXTENSIONS.contains(&extension));
        if !is_image {
            continue;
        }
        match Sentinel2::band_key(&path) {
            Some(key) => {
                images.entry(key).or_insert(path);
            }
            None => warn!("ignoring {path:?}, not a band image"),
        }
    }
    Ok(())
}

/// Band image of a Sentinel-2 L2A product such as `B03_10m` or `SCL_20m`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BandKey {
    band: String,
    resolution: u16,
}

impl BandKey {
    pub fn band(&self) -> &str {
        &self.band
    }

    /// Pixel size in meters.
    pub fn resolution(&self) -> u16 {
        self.resolution
    }
}

impl FromStr for BandKey {
    type Err = GreenbandsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || GreenbandsError::InvalidBandKey(s.to_string());
        let (band, resolution) = s.split_once('_').ok_or_else(invalid)?;
        let resolution = resolution
            .strip_suffix('m')
            .and_then(|resolution| resolution.parse::<u16>().ok())
            .filter(|resolution| RESOLUTIONS.contains(resolution))
            .ok_or_else(invalid)?;
        if !BANDS.contains(&band) {
            return Err(invalid());
        }
        Ok(Self {
            band: band.to_string(),
            resolution,
        })
    }
}

impl TryFrom<String> for BandKey {
    type Error = GreenbandsError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BandKey> for String {
    fn from(value: BandKey) -> Self {
        value.to_string()
    }
}

impl Display for BandKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}m", self.band, self.resolution)
    }
}
