//! Error types for the reqwest-proxy-rotator crate.

use thiserror::Error;

/// Unified error type for rotator construction and mutation.
///
/// Probe failures are deliberately absent: an unreachable proxy is excluded
/// from the pool and reported through the warning log and
/// [`excluded_endpoints`](crate::ProxyRotator::excluded_endpoints), not
/// through this enum.
#[derive(Debug, Error)]
pub enum RotatorError {
    /// The endpoint list was empty.
    #[error("no proxy endpoints were given")]
    NoEndpoints,

    /// A cookie-group list was provided but its length did not match the
    /// endpoint list.
    #[error("{endpoints} proxy endpoints paired with {groups} cookie groups")]
    CookieGroupMismatch { endpoints: usize, groups: usize },

    /// Time-windowed selection was configured with a window shorter than
    /// the millisecond granularity selection runs at.
    #[error("time-windowed selection requires a window of at least one millisecond")]
    ZeroWindow,

    /// A proxy URL could not be parsed.
    #[error("invalid proxy url {url}: {source}")]
    InvalidProxyUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client for a proxy could not be built.
    #[error("failed to build client for proxy {url}: {source}")]
    ClientBuild {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Every endpoint failed its reachability probe.
    #[error("no usable proxies after probing {probed} endpoints")]
    NoUsableProxies { probed: usize },

    /// A cookie file existed but could not be read back into a store.
    #[error("failed to load cookie store {name}: {reason}")]
    CookieLoad { name: String, reason: String },

    /// A cookie store could not be flushed to its backing file.
    #[error("failed to save cookie store {name}: {reason}")]
    CookieSave { name: String, reason: String },
}

/// Result type alias for rotator operations.
pub type Result<T> = std::result::Result<T, RotatorError>;
