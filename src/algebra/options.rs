use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudCoverOptions {
    /// Minimum SWIR reflectance of a cloud pixel.
    pub tau: f64,
    /// Digital numbers per unit of surface reflectance.
    pub reflectance_scale: f64,
}

impl Default for CloudCoverOptions {
    fn default() -> Self {
        Self {
            tau: 0.2,
            reflectance_scale: 10000.,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsaviOptions {
    /// Soil adjustment coefficient.
    pub y: f64,
}

impl Default for OsaviOptions {
    fn default() -> Self {
        Self { y: 0.16 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NdsiOptions {
    /// Ratios strictly above are snow.
    pub threshold: f64,
}

impl Default for NdsiOptions {
    fn default() -> Self {
        Self { threshold: 0.42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudMaskOptions {
    pub analysis_resolution: f64,
    /// Scene classification values flagged as cloud.
    pub classes: Vec<u8>,
}

impl Default for CloudMaskOptions {
    fn default() -> Self {
        Self {
            analysis_resolution: 10.,
            // cloud shadows, medium and high probability clouds, thin cirrus, snow
            classes: vec![3, 8, 9, 10, 11],
        }
    }
}

/// Tunables of every formula that takes any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    pub cloud_cover: CloudCoverOptions,
    pub osavi: OsaviOptions,
    pub ndsi: NdsiOptions,
    pub cloud_mask: CloudMaskOptions,
}
