use std::{collections::BTreeMap, fmt::Debug, hash::Hash, path::Path, path::PathBuf};

use shrinkwraprs::Shrinkwrap;

use crate::errors::Result;

pub mod sentinel2;
pub use sentinel2::Sentinel2;

pub trait Sensor: Debug {
    /// Identifies one band image of a product, e.g. band and resolution.
    type BandKey: Debug + Clone + Ord + Hash;

    /// Band key of an image file, `None` for files that are not band images.
    fn band_key(path: &Path) -> Option<Self::BandKey>;

    /// Band images of the product rooted at `product`.
    fn product_images<P: AsRef<Path>>(product: P) -> Result<ProductImages<Self::BandKey>>;
}

/// Image files of a product by band key.
#[derive(Shrinkwrap, Debug, Clone, PartialEq)]
pub struct ProductImages<K: Ord>(BTreeMap<K, PathBuf>);

impl<K: Ord> ProductImages<K> {
    pub fn new(images: BTreeMap<K, PathBuf>) -> Self {
        Self(images)
    }
}

impl<K: Ord> FromIterator<(K, PathBuf)> for ProductImages<K> {
    fn from_iter<T: IntoIterator<Item = (K, PathBuf)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
