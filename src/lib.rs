//! Asynchronous image acquisition for display elements
//!
//! This crate implements the fetch side of an image-bearing UI element:
//! given a resource identifier (URL or filesystem path), it resolves an
//! image from a local path, a cache collaborator, or a downloader
//! collaborator — exactly once per identifier generation — while
//! tolerating identifier changes and teardown mid-flight.
//!
//! The two halves are the [`ImageFetchController`], which owns the
//! state machine and its lock discipline, and the source resolver, which
//! runs each acquisition on a spawned task and validates every completion
//! against a generation marker before applying it. Cache and downloader
//! backends are not part of this crate; they plug in through the
//! [`ImageCache`] and [`ImageDownloader`] contracts and are referenced
//! weakly, so their lifetime stays with the embedding application.
//!
//! ```no_run
//! use image_fetcher::{FetchConfig, ImageFetchController, ImageIdentifier};
//!
//! let controller = ImageFetchController::new(FetchConfig::default());
//! controller.set_identifier(ImageIdentifier::new("https://example.com/logo.png"), false);
//! controller.display_will_start();
//! ```

pub mod config;
pub mod controller;
pub mod errors;
pub mod models;
pub mod sources;

mod resolver;

pub use config::{FetchConfig, ResourceConfig};
pub use controller::ImageFetchController;
pub use errors::{DownloadError, FetchError, FetchResult, ResourceError};
pub use models::{DownloadHandle, Image, ImageIdentifier};
pub use sources::local::DecodedImageRegistry;
pub use sources::traits::{DownloadTask, FetchObserver, ImageCache, ImageDownloader, ProgressFn};
