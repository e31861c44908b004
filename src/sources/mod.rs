//! Acquisition sources: collaborator contracts and the local-file strategy

pub mod local;
pub mod traits;

pub use traits::{DownloadTask, FetchObserver, ImageCache, ImageDownloader, ProgressFn};
