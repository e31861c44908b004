//! Fetch controller: the identifier-to-image state machine
//!
//! An [`ImageFetchController`] is attached to one display element. It owns
//! the element's acquisition state behind a single mutex and coordinates
//! the cache and downloader collaborators without ever holding that mutex
//! across a call into external code: every method computes its external
//! side effects (downloader cancellation, observer notification, task
//! spawning) under the lock and performs them after release. Stale
//! asynchronous completions are filtered by a per-attempt generation
//! marker rather than by assuming collaborators suppress them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::debug;

use crate::config::{FetchConfig, ResourceConfig};
use crate::models::{DownloadHandle, Image, ImageIdentifier};
use crate::resolver;
use crate::sources::local::DecodedImageRegistry;
use crate::sources::traits::{FetchObserver, ImageCache, ImageDownloader};

/// Marker identifying one acquisition attempt
///
/// Generations increase monotonically per controller; only the most
/// recently issued one is live. Retiring the live generation (identifier
/// change, clear, teardown) invalidates every outstanding completion,
/// including ones from collaborators that have no cancel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Generation(u64);

/// Mutable acquisition state, only ever touched under the controller lock
pub(crate) struct FetchState {
    pub(crate) identifier: Option<ImageIdentifier>,
    pub(crate) default_image: Option<Image>,
    pub(crate) current_image: Option<Image>,
    pub(crate) loaded: bool,
    pub(crate) live_generation: Option<Generation>,
    pub(crate) active_download: Option<DownloadHandle>,
    pub(crate) torn_down: bool,
}

impl FetchState {
    fn new() -> Self {
        Self {
            identifier: None,
            default_image: None,
            current_image: None,
            loaded: false,
            live_generation: None,
            active_download: None,
            torn_down: false,
        }
    }

    /// Retire the live generation and hand back the download handle, if
    /// any, for the caller to cancel once the lock is released
    fn cancel_in_flight(&mut self) -> Option<DownloadHandle> {
        self.live_generation = None;
        self.active_download.take()
    }
}

/// Shared core of a controller, also reachable (weakly) from resolver tasks
pub(crate) struct ControllerInner {
    pub(crate) state: Mutex<FetchState>,
    generation_counter: AtomicU64,
    cache_decoded_images: AtomicBool,
    cache: RwLock<Option<Weak<dyn ImageCache>>>,
    downloader: RwLock<Option<Weak<dyn ImageDownloader>>>,
    observer: RwLock<Option<Weak<dyn FetchObserver>>>,
    should_fetch: RwLock<Arc<dyn Fn() -> bool + Send + Sync>>,
    pub(crate) registry: DecodedImageRegistry,
    pub(crate) resource_config: ResourceConfig,
}

impl ControllerInner {
    pub(crate) fn next_generation(&self) -> Generation {
        Generation(self.generation_counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub(crate) fn cache(&self) -> Option<Arc<dyn ImageCache>> {
        self.cache.read().unwrap().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn downloader(&self) -> Option<Arc<dyn ImageDownloader>> {
        self.downloader
            .read()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn observer(&self) -> Option<Arc<dyn FetchObserver>> {
        self.observer
            .read()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
    }

    pub(crate) fn caches_decoded_images(&self) -> bool {
        self.cache_decoded_images.load(Ordering::Relaxed)
    }

    pub(crate) fn is_generation_live(&self, generation: Generation) -> bool {
        let state = self.state.lock().unwrap();
        !state.torn_down && state.live_generation == Some(generation)
    }

    /// Forward a cancellation to the downloader, outside the lock
    fn cancel_download(&self, handle: Option<DownloadHandle>) {
        if let Some(handle) = handle {
            if let Some(downloader) = self.downloader() {
                debug!(handle = %handle, "cancelling in-flight download");
                downloader.cancel_download(&handle);
            }
        }
    }

    /// Evaluate the externally-owned eligibility predicate
    ///
    /// The predicate Arc is cloned out of the RwLock first so external
    /// code never runs under any controller lock.
    fn is_fetch_permitted(&self) -> bool {
        let predicate = self.should_fetch.read().unwrap().clone();
        predicate()
    }
}

/// Asynchronous image acquisition controller for one display element
///
/// All methods are safe to call concurrently from any thread; state
/// transitions are serialized internally. Acquisitions run on spawned
/// tokio tasks, so any method that can start a fetch must be called from
/// within a tokio runtime context. The controller is single-owner:
/// dropping it tears it down and any still-running acquisition task
/// becomes a no-op.
pub struct ImageFetchController {
    inner: Arc<ControllerInner>,
}

impl ImageFetchController {
    /// Create a controller with the given configuration
    pub fn new(config: FetchConfig) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                state: Mutex::new(FetchState::new()),
                generation_counter: AtomicU64::new(0),
                cache_decoded_images: AtomicBool::new(config.cache_decoded_images),
                cache: RwLock::new(None),
                downloader: RwLock::new(None),
                observer: RwLock::new(None),
                should_fetch: RwLock::new(Arc::new(|| true)),
                registry: DecodedImageRegistry::default(),
                resource_config: config.resource,
            }),
        }
    }

    /// Create a controller with default configuration
    pub fn with_defaults() -> Self {
        Self::new(FetchConfig::default())
    }

    /// Attach a cache collaborator (held weakly, never owned)
    pub fn set_cache(&self, cache: &Arc<dyn ImageCache>) {
        *self.inner.cache.write().unwrap() = Some(Arc::downgrade(cache));
    }

    /// Attach a downloader collaborator (held weakly, never owned)
    pub fn set_downloader(&self, downloader: &Arc<dyn ImageDownloader>) {
        *self.inner.downloader.write().unwrap() = Some(Arc::downgrade(downloader));
    }

    /// Attach an observer (held weakly, never owned)
    pub fn set_observer(&self, observer: &Arc<dyn FetchObserver>) {
        *self.inner.observer.write().unwrap() = Some(Arc::downgrade(observer));
    }

    /// Install the externally-owned "should fetch" eligibility predicate
    ///
    /// Consulted by [`set_identifier`] to decide whether a fetch starts
    /// immediately. Defaults to always-true.
    ///
    /// [`set_identifier`]: ImageFetchController::set_identifier
    pub fn set_should_fetch<F>(&self, predicate: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        *self.inner.should_fetch.write().unwrap() = Arc::new(predicate);
    }

    /// Bind the element to a new identifier
    ///
    /// No-op when `identifier` equals the current one. Otherwise cancels
    /// in-flight work, marks the element unloaded and stores the new
    /// identifier. When `reset_to_default` is set, or the identifier is
    /// cleared, the current image immediately reverts to the default
    /// image. Starts a fetch when an identifier is present and the
    /// eligibility predicate allows it.
    pub fn set_identifier(&self, identifier: Option<ImageIdentifier>, reset_to_default: bool) {
        let cancelled = {
            let mut state = self.inner.state.lock().unwrap();
            if state.torn_down || state.identifier == identifier {
                return;
            }
            debug!(
                identifier = identifier.as_ref().map(|i| i.as_str()).unwrap_or("<none>"),
                "identifier changed"
            );
            let cancelled = state.cancel_in_flight();
            state.loaded = false;
            state.identifier = identifier.clone();
            if reset_to_default || identifier.is_none() {
                state.current_image = state.default_image.clone();
            }
            cancelled
        };
        self.inner.cancel_download(cancelled);

        if identifier.is_some() && self.inner.is_fetch_permitted() {
            self.try_fetch();
        }
    }

    /// The identifier the element is currently bound to
    pub fn identifier(&self) -> Option<ImageIdentifier> {
        self.inner.state.lock().unwrap().identifier.clone()
    }

    /// Set the image shown until an acquisition succeeds
    ///
    /// No-op when unchanged (handle identity). Applied as the current
    /// image immediately unless a successful load has already completed;
    /// never marks the element loaded.
    pub fn set_default_image(&self, image: Option<Image>) {
        let mut state = self.inner.state.lock().unwrap();
        if state.torn_down || state.default_image == image {
            return;
        }
        state.default_image = image.clone();
        if !state.loaded {
            state.current_image = image;
        }
    }

    /// The configured default image
    pub fn default_image(&self) -> Option<Image> {
        self.inner.state.lock().unwrap().default_image.clone()
    }

    /// The image the element should currently display
    pub fn current_image(&self) -> Option<Image> {
        self.inner.state.lock().unwrap().current_image.clone()
    }

    /// Whether a successful acquisition has completed for the current
    /// identifier
    pub fn is_loaded(&self) -> bool {
        self.inner.state.lock().unwrap().loaded
    }

    /// Control whether the local-file strategy caches decoded bitmaps by
    /// logical resource name
    pub fn set_cache_decoded_images(&self, enabled: bool) {
        self.inner
            .cache_decoded_images
            .store(enabled, Ordering::Relaxed);
    }

    /// Whether decoded-bitmap caching is enabled for local files
    pub fn caches_decoded_images(&self) -> bool {
        self.inner.caches_decoded_images()
    }

    /// Display lifecycle hook: the element is about to be shown
    pub fn display_will_start(&self) {
        self.try_fetch();
    }

    /// Fetch-data lifecycle hook: the element should acquire its data now
    pub fn fetch_data(&self) {
        self.try_fetch();
    }

    /// Discard fetched data and revert to the default image
    ///
    /// Cancels in-flight work and marks the element unloaded. The
    /// controller remains usable afterward.
    pub fn clear_fetched_data(&self) {
        let cancelled = {
            let mut state = self.inner.state.lock().unwrap();
            if state.torn_down {
                return;
            }
            let cancelled = state.cancel_in_flight();
            state.current_image = state.default_image.clone();
            state.loaded = false;
            cancelled
        };
        self.inner.cancel_download(cancelled);
    }

    /// Terminal shutdown: cancel in-flight work and reject everything after
    ///
    /// Idempotent; also invoked from `Drop`. After teardown every trigger
    /// and every late completion is a no-op.
    pub fn teardown(&self) {
        let cancelled = {
            let mut state = self.inner.state.lock().unwrap();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            state.cancel_in_flight()
        };
        self.inner.cancel_download(cancelled);
    }

    /// Start an acquisition if one is warranted
    ///
    /// No-op unless the element is unloaded, bound to an identifier, has
    /// nothing in flight and is not torn down. The fresh generation is
    /// marked live under the lock, before the resolver task exists, so a
    /// concurrent trigger cannot start a second acquisition.
    fn try_fetch(&self) {
        let (identifier, generation) = {
            let mut state = self.inner.state.lock().unwrap();
            if state.torn_down || state.loaded || state.live_generation.is_some() {
                return;
            }
            let Some(identifier) = state.identifier.clone() else {
                return;
            };
            let generation = self.inner.next_generation();
            state.live_generation = Some(generation);
            (identifier, generation)
        };
        debug!(identifier = %identifier, "starting acquisition");
        resolver::spawn_acquisition(Arc::downgrade(&self.inner), identifier, generation);
    }
}

impl Drop for ImageFetchController {
    fn drop(&mut self) {
        self.teardown();
    }
}
