//! Core data types shared across the crate
//!
//! The controller's state machine is expressed in terms of three small
//! value types: [`ImageIdentifier`] (the resource key an element is bound
//! to), [`Image`] (a cheaply clonable decoded bitmap handle) and
//! [`DownloadHandle`] (the opaque cancellation handle minted by a
//! downloader collaborator).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::DynamicImage;
use url::Url;
use uuid::Uuid;

/// Resource key associated with a display element
///
/// An identifier is either a URL (`https://…`, `file://…`) or a bare
/// filesystem path. It is immutable once constructed and compared by value;
/// the controller treats any change of identifier as an invalidation of
/// in-flight work. Empty and whitespace-only strings are rejected at
/// construction so that "no identifier" is always represented as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageIdentifier(String);

impl ImageIdentifier {
    /// Create an identifier from a URL or path string
    ///
    /// Returns `None` for empty or whitespace-only input.
    pub fn new<S: Into<String>>(raw: S) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The identifier as the string it was constructed from
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identifier denotes a local filesystem resource
    ///
    /// `file://` URLs and strings that do not parse as an absolute URL
    /// (bare paths) are local; anything with another scheme is remote.
    pub fn is_local(&self) -> bool {
        match Url::parse(&self.0) {
            Ok(url) => url.scheme() == "file",
            Err(_) => true,
        }
    }

    /// The filesystem path this identifier denotes, if it is local
    pub fn file_path(&self) -> Option<PathBuf> {
        match Url::parse(&self.0) {
            Ok(url) if url.scheme() == "file" => url.to_file_path().ok(),
            Ok(_) => None,
            Err(_) => Some(PathBuf::from(&self.0)),
        }
    }

    /// Logical resource name: the file stem of the denoted path
    ///
    /// Used as the key for the decoded-image registry and for the
    /// name-based resource search.
    pub fn resource_name(&self) -> Option<String> {
        self.file_path()?
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.to_string())
    }
}

impl fmt::Display for ImageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared handle to a decoded bitmap
///
/// Cloning is cheap (reference counted). Equality is handle identity, not
/// pixel comparison: two separately decoded copies of the same file are
/// distinct, which is exactly the contract the controller needs for its
/// "no-op if unchanged" default-image check.
#[derive(Clone)]
pub struct Image {
    pixels: Arc<DynamicImage>,
}

impl Image {
    /// Wrap an already decoded bitmap
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Decode an image from raw encoded bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        image::load_from_memory(bytes).map(Self::new)
    }

    /// Pixel width
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Pixel height
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrow the underlying decoded bitmap
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.pixels
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl Eq for Image {}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Opaque handle representing one in-flight download
///
/// Minted by downloader implementations when a download starts and used by
/// the controller solely to request cancellation later.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadHandle(Uuid);

impl DownloadHandle {
    /// Mint a fresh, unique handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DownloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
