//! Configuration for the image fetcher

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Crate configuration
///
/// Everything has a sensible default so embedding applications can use
/// [`FetchConfig::default`] and never touch a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Local resource resolution settings
    pub resource: ResourceConfig,
    /// Initial value of the decoded-bitmap caching flag for the
    /// local-file strategy (runtime-settable on the controller)
    pub cache_decoded_images: bool,
}

/// Settings for the local-file strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Directories searched by the name-based resource lookup, in order
    pub search_paths: Vec<PathBuf>,
    /// Candidate file extensions tried during the name-based lookup
    pub extensions: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            resource: ResourceConfig::default(),
            cache_decoded_images: false,
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

impl FetchConfig {
    /// Load configuration from the file named by `IMAGE_FETCHER_CONFIG`
    /// (default `image-fetcher.toml`), falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        let config_file = std::env::var("IMAGE_FETCHER_CONFIG")
            .unwrap_or_else(|_| "image-fetcher.toml".to_string());

        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }
}
