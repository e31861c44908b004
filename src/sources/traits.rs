//! Collaborator contracts consumed by the fetch controller
//!
//! The controller never owns its collaborators: it holds weak references
//! to externally managed cache, downloader and observer instances and
//! tolerates any of them disappearing mid-flight. These traits are the
//! complete surface the controller relies on; concrete backends live in
//! the embedding application.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::errors::FetchResult;
use crate::models::{DownloadHandle, Image, ImageIdentifier};

/// Progress callback invoked with the fraction downloaded so far (0.0..=1.0)
///
/// May be called from any thread. Implementations of [`ImageDownloader`]
/// are free to never call it.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Cache of previously downloaded bitmaps, keyed by identifier
///
/// The lookup completes at most once with either an image or a miss. No
/// cancellation method is required or assumed: the controller invalidates
/// outstanding lookups on its own side by retiring the generation they
/// were issued under.
#[async_trait]
pub trait ImageCache: Send + Sync {
    /// Look up a cached bitmap for `identifier`, `None` on a miss
    async fn cached_image(&self, identifier: &ImageIdentifier) -> Option<Image>;
}

/// One download started by an [`ImageDownloader`]
///
/// `handle` identifies the download for later cancellation; `completion`
/// resolves exactly once with the downloaded image or an error. A
/// completion may still resolve (and is delivered to the controller) after
/// `cancel_download` was called for its handle — the controller filters it
/// by generation rather than assuming suppression.
pub struct DownloadTask {
    /// Opaque handle for [`ImageDownloader::cancel_download`]
    pub handle: DownloadHandle,
    /// Resolves with the terminal outcome of the download
    pub completion: BoxFuture<'static, FetchResult<Image>>,
}

/// Downloader for remote identifiers
///
/// `start_download` must return quickly: the actual transfer happens
/// behind the returned completion future. Implementations must be safe to
/// call from any thread.
pub trait ImageDownloader: Send + Sync {
    /// Begin downloading `identifier`, reporting progress through
    /// `progress` when provided
    fn start_download(
        &self,
        identifier: &ImageIdentifier,
        progress: Option<ProgressFn>,
    ) -> DownloadTask;

    /// Request best-effort cancellation of a previously started download
    fn cancel_download(&self, handle: &DownloadHandle);
}

/// Optional listener for load completion events
///
/// Every method has a no-op default body, so implementors opt into exactly
/// the notifications they care about. Calls are delivered outside the
/// controller lock; an observer may re-enter the controller synchronously.
pub trait FetchObserver: Send + Sync {
    /// A resolved image was stored as the element's current image
    fn image_loaded(&self, _image: &Image) {}

    /// Decoding for the delivered image has finished
    fn decoding_finished(&self) {}
}
