//! Error type definitions for the image fetcher
//!
//! This module defines all error types used throughout the crate, providing
//! a hierarchical error system that makes debugging and error handling more
//! straightforward. None of these errors cross the controller boundary: a
//! failed acquisition resolves to "no image delivered" and the error is
//! logged, never surfaced to the lifecycle collaborator.

use thiserror::Error;

/// Top-level fetch error type
///
/// This enum represents all possible errors that can occur while acquiring
/// an image. It uses `thiserror` to provide automatic error trait
/// implementations and proper error chaining.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Local resource resolution errors
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Download errors reported by the downloader collaborator
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O errors outside the local resolution path
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local resource resolution specific errors
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The identifier does not denote a readable file
    #[error("Resource not found: {identifier}")]
    NotFound { identifier: String },

    /// No candidate matched during the name-based resource search
    #[error("No resource named '{name}' in any search directory")]
    NoMatch { name: String },

    /// The file was read but its contents could not be decoded as an image
    #[error("Decode failed for {identifier}: {message}")]
    Decode { identifier: String, message: String },
}

/// Downloader collaborator specific errors
///
/// Downloader implementations report failures with this vocabulary; the
/// resolver treats every variant the same way (no image delivered), so the
/// distinction exists for logging and for the collaborator's own callers.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The download was cancelled before it produced an image
    #[error("Download cancelled")]
    Cancelled,

    /// Transport-level failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// The server answered with a non-success status
    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16 },

    /// The payload was not a decodable image
    #[error("Response was not a decodable image: {message}")]
    BadPayload { message: String },
}

/// Convenience methods for creating common error types
impl FetchError {
    /// Create a configuration error with a custom message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl ResourceError {
    /// Create a not found error for an identifier
    pub fn not_found<I: Into<String>>(identifier: I) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create a no-match error for a resource name
    pub fn no_match<N: Into<String>>(name: N) -> Self {
        Self::NoMatch { name: name.into() }
    }

    /// Create a decode error
    pub fn decode<I: Into<String>, M: Into<String>>(identifier: I, message: M) -> Self {
        Self::Decode {
            identifier: identifier.into(),
            message: message.into(),
        }
    }
}

impl DownloadError {
    /// Create a network error with a custom message
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16) -> Self {
        Self::HttpStatus { status }
    }

    /// Create a bad payload error
    pub fn bad_payload<M: Into<String>>(message: M) -> Self {
        Self::BadPayload {
            message: message.into(),
        }
    }
}
