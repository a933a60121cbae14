use reqwest::StatusCode;
use thiserror::Error;

/// Errors thrown by the library.
///
/// Listing-level errors (`Fetch`, `UnexpectedStatus`, `CursorMissing`,
/// `CursorValue`) abort the page load they occur in. Post-level failures are
/// never surfaced here; they degrade the affected post to a placeholder.
#[derive(Debug, Error)]
pub enum Error {
    /// The request to the proxy failed in transport.
    #[error("{0}")]
    Fetch(#[from] reqwest::Error),

    /// The proxy answered with something other than `200 OK`.
    #[error("proxy returned unexpected status: {0}")]
    UnexpectedStatus(StatusCode),

    /// The listing page has no usable pagination link, so the batch cursor
    /// cannot be resolved. The forum is likely unsupported or the markup
    /// changed.
    #[error("no usable pagination link in the listing page")]
    CursorMissing,

    /// A pagination link was found but its batch value is not numeric.
    #[error("pagination link carries a malformed batch value: {0:?}")]
    CursorValue(String),

    /// The configured proxy endpoint is not a valid URL.
    #[error("invalid proxy endpoint: {0}")]
    Proxy(#[from] url::ParseError),
}
