//! Error handling for the image fetcher

pub mod types;

pub use types::{DownloadError, FetchError, ResourceError};

/// Crate-wide result alias
pub type FetchResult<T> = Result<T, FetchError>;
