//! Local-file acquisition strategy
//!
//! Resolves identifiers that denote filesystem or bundled resources.
//! Two modes, chosen by the controller's decoded-bitmap caching flag:
//!
//! - caching enabled: resolve by logical resource name through a
//!   [`DecodedImageRegistry`] (lookup by name, insert on miss), so repeated
//!   loads of the same named resource decode once;
//! - caching disabled: attempt a direct read of the denoted path first and
//!   fall back to a name-based search of the configured resource
//!   directories when that fails.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::config::ResourceConfig;
use crate::errors::{FetchResult, ResourceError};
use crate::models::{Image, ImageIdentifier};

/// Name-keyed cache of decoded bitmaps for the local-file strategy
///
/// One registry per controller. Entries live until [`clear`] is called;
/// eviction is the embedding application's concern, matching the
/// image-by-name caches this mirrors.
///
/// [`clear`]: DecodedImageRegistry::clear
#[derive(Default)]
pub struct DecodedImageRegistry {
    entries: Mutex<HashMap<String, Image>>,
}

impl DecodedImageRegistry {
    /// Look up a decoded image by logical resource name
    pub fn get(&self, name: &str) -> Option<Image> {
        self.entries.lock().unwrap().get(name).cloned()
    }

    /// Store a decoded image under a logical resource name
    pub fn insert(&self, name: String, image: Image) {
        self.entries.lock().unwrap().insert(name, image);
    }

    /// Drop all registered images
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Number of registered images
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the registry holds no images
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve a local identifier to a decoded image
///
/// `registry` is `Some` when decoded-bitmap caching is enabled. The caller
/// delivers the outcome through its generation-validated completion path;
/// this function itself knows nothing about generations.
pub async fn resolve_local(
    identifier: &ImageIdentifier,
    config: &ResourceConfig,
    registry: Option<&DecodedImageRegistry>,
) -> FetchResult<Image> {
    if let Some(registry) = registry {
        let name = identifier
            .resource_name()
            .ok_or_else(|| ResourceError::not_found(identifier.as_str()))?;

        if let Some(image) = registry.get(&name) {
            debug!(name = %name, "decoded-image registry hit");
            return Ok(image);
        }

        let image = match read_direct(identifier).await {
            Ok(image) => image,
            Err(_) => search_by_name(&name, identifier, config).await?,
        };
        registry.insert(name, image.clone());
        return Ok(image);
    }

    match read_direct(identifier).await {
        Ok(image) => Ok(image),
        Err(direct_err) => {
            let Some(name) = identifier.resource_name() else {
                return Err(direct_err);
            };
            debug!(
                identifier = %identifier,
                "direct read failed, falling back to resource search"
            );
            search_by_name(&name, identifier, config).await
        }
    }
}

/// Read and decode the exact path the identifier denotes
async fn read_direct(identifier: &ImageIdentifier) -> FetchResult<Image> {
    let path = identifier
        .file_path()
        .ok_or_else(|| ResourceError::not_found(identifier.as_str()))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ResourceError::not_found(identifier.as_str()))?;

    decode(&bytes, identifier)
}

/// Search the identifier's own directory and the configured search paths
/// for a file named after the logical resource, trying each candidate
/// extension in order
async fn search_by_name(
    name: &str,
    identifier: &ImageIdentifier,
    config: &ResourceConfig,
) -> FetchResult<Image> {
    let mut directories: Vec<PathBuf> = Vec::new();
    if let Some(parent) = identifier
        .file_path()
        .and_then(|path| path.parent().map(|p| p.to_path_buf()))
    {
        directories.push(parent);
    }
    directories.extend(config.search_paths.iter().cloned());

    for directory in &directories {
        for extension in &config.extensions {
            let candidate = directory.join(format!("{}.{}", name, extension));
            if let Ok(bytes) = tokio::fs::read(&candidate).await {
                debug!(candidate = %candidate.display(), "resource search matched");
                return decode(&bytes, identifier);
            }
        }
    }

    Err(ResourceError::no_match(name).into())
}

fn decode(bytes: &[u8], identifier: &ImageIdentifier) -> FetchResult<Image> {
    Image::from_bytes(bytes).map_err(|err| {
        warn!(identifier = %identifier, error = %err, "image decode failed");
        ResourceError::decode(identifier.as_str(), err.to_string()).into()
    })
}
