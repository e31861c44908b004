//! Source resolver: strategy selection and generation-validated delivery
//!
//! One acquisition runs as one spawned task. The task holds only a weak
//! reference to the controller core between suspension points, so a
//! completion that arrives after teardown (or after the controller was
//! dropped outright) is ignored without touching freed state. Every
//! terminal outcome, hit or miss, funnels through [`deliver`], which is
//! the single place the generation check and the state mutation happen.

use std::sync::{Arc, Weak};

use tracing::{debug, trace};

use crate::controller::{ControllerInner, Generation};
use crate::models::{Image, ImageIdentifier};
use crate::sources::local;
use crate::sources::traits::ProgressFn;

/// Spawn the acquisition task for one (identifier, generation) pair
pub(crate) fn spawn_acquisition(
    inner: Weak<ControllerInner>,
    identifier: ImageIdentifier,
    generation: Generation,
) {
    tokio::spawn(async move {
        if identifier.is_local() {
            acquire_local(inner, identifier, generation).await;
        } else {
            acquire_remote(inner, identifier, generation).await;
        }
    });
}

/// Local-file strategy
///
/// Resolution happens on this task, so delivery is asynchronous to the
/// caller even though the filesystem work itself is cheap.
async fn acquire_local(
    inner: Weak<ControllerInner>,
    identifier: ImageIdentifier,
    generation: Generation,
) {
    let Some(strong) = inner.upgrade() else {
        return;
    };

    let registry = if strong.caches_decoded_images() {
        Some(&strong.registry)
    } else {
        None
    };

    match local::resolve_local(&identifier, &strong.resource_config, registry).await {
        Ok(image) => deliver(&strong, generation, Some(image)),
        Err(err) => {
            debug!(identifier = %identifier, error = %err, "local resolution failed");
            deliver(&strong, generation, None);
        }
    }
}

/// Cache-then-download strategy for remote identifiers
///
/// Degrades to download-only when no cache is attached and to a terminal
/// miss when neither collaborator is reachable.
async fn acquire_remote(
    inner: Weak<ControllerInner>,
    identifier: ImageIdentifier,
    generation: Generation,
) {
    let cache = inner.upgrade().and_then(|strong| strong.cache());
    if let Some(cache) = cache {
        let cached = cache.cached_image(&identifier).await;

        // The cache has no cancel operation; staleness is decided here,
        // on return, against the live generation.
        let Some(strong) = inner.upgrade() else {
            return;
        };
        if !strong.is_generation_live(generation) {
            debug!(identifier = %identifier, "dropping stale cache completion");
            return;
        }
        if let Some(image) = cached {
            debug!(identifier = %identifier, "cache hit");
            deliver(&strong, generation, Some(image));
            return;
        }
        debug!(identifier = %identifier, "cache miss");
    }

    let Some(strong) = inner.upgrade() else {
        return;
    };
    let Some(downloader) = strong.downloader() else {
        debug!(identifier = %identifier, "no downloader attached, giving up");
        deliver(&strong, generation, None);
        return;
    };

    let progress = progress_probe(inner.clone(), generation);
    let task = downloader.start_download(&identifier, Some(progress));

    // The lock was not held across start_download. Record the handle only
    // if this attempt is still the live one; otherwise the download was
    // obsolete the moment it started and is cancelled right away.
    let stale = {
        let mut state = strong.state.lock().unwrap();
        if state.torn_down || state.live_generation != Some(generation) {
            true
        } else {
            state.active_download = Some(task.handle.clone());
            false
        }
    };
    if stale {
        debug!(identifier = %identifier, "attempt went stale during download start");
        downloader.cancel_download(&task.handle);
        return;
    }
    drop(strong);
    drop(downloader);

    let result = task.completion.await;

    let Some(strong) = inner.upgrade() else {
        return;
    };
    match result {
        Ok(image) => deliver(&strong, generation, Some(image)),
        Err(err) => {
            debug!(identifier = %identifier, error = %err, "download failed");
            deliver(&strong, generation, None);
        }
    }
}

/// Progress callback handed to the downloader
///
/// Filtered by the same generation rule as terminal completions: progress
/// for a retired attempt is dropped silently.
fn progress_probe(inner: Weak<ControllerInner>, generation: Generation) -> ProgressFn {
    Arc::new(move |fraction: f32| {
        let Some(strong) = inner.upgrade() else {
            return;
        };
        if strong.is_generation_live(generation) {
            trace!(fraction, "download progress");
        }
    })
}

/// Apply a terminal outcome to controller state
///
/// Drops the outcome when the generation is no longer live or the
/// controller was torn down. On success the image becomes current, the
/// element is marked loaded, and the observer is notified outside the
/// lock so it may safely re-enter the controller.
fn deliver(inner: &Arc<ControllerInner>, generation: Generation, image: Option<Image>) {
    let delivered = {
        let mut state = inner.state.lock().unwrap();
        if state.torn_down || state.live_generation != Some(generation) {
            debug!("dropping stale completion");
            return;
        }
        state.live_generation = None;
        state.active_download = None;
        if let Some(image) = image {
            state.current_image = Some(image.clone());
            state.loaded = true;
            Some(image)
        } else {
            None
        }
    };

    if let Some(image) = delivered {
        if let Some(observer) = inner.observer() {
            observer.image_loaded(&image);
            observer.decoding_finished();
        }
    }
}
