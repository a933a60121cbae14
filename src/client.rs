use std::ops::Deref;

use crate::{error::Error, result::Result};
use async_trait::async_trait;
use reqwest::{header::USER_AGENT, Client as ReqwestClient};
use url::Url;

/// Marker the proxy appends to a body it served from its file cache.
const CACHE_MARKER: &str = "[from cache]";

/// A fetch collaborator that resolves an opaque forum query into raw HTML.
///
/// [`Client`] is the production implementation; tests substitute their own to
/// control latency and failures without a network.
#[async_trait]
pub trait Fetch {
    /// Fetches the page addressed by `query` and returns its HTML.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent at all. Failures
    /// that produced a response (bad status, unreadable body) are carried
    /// inside the [`Reply`] instead.
    async fn fetch(&self, query: &str) -> Result<Reply>;
}

/// Fetches forum pages through the caching proxy endpoint.
///
/// All requests are `POST`s to one fixed local endpoint with the query string
/// as form data; the browser-side origin policy rules out direct cross-origin
/// fetches, and the proxy's 24-hour file cache keeps repeat loads cheap. The
/// client itself never caches and never retries.
#[derive(Debug, Clone)]
pub struct Client {
    http: ReqwestClient,
    proxy: Url,
}

impl Client {
    /// Constructs a `Client` talking to the given proxy endpoint.
    ///
    /// # Errors
    ///
    /// This function will return an error if `proxy` is not a valid URL.
    pub fn new(proxy: &str) -> Result<Client> {
        let proxy = Url::parse(proxy)?;
        let http = ReqwestClient::new();
        Ok(Client { http, proxy })
    }

    /// Returns the proxy endpoint this client talks to.
    pub fn proxy(&self) -> &Url {
        &self.proxy
    }

    /// Submits one query to the proxy and returns the raw HTML reply.
    ///
    /// # Errors
    ///
    /// This function will return an error if the request fails in transport.
    /// A non-`200` status or an unreadable body is reported inside the
    /// returned [`Reply`].
    pub async fn fetch(&self, query: &str) -> Result<Reply> {
        use reqwest::StatusCode;

        let request = self
            .http
            .post(self.proxy.clone())
            .header(USER_AGENT, "ClpicsClient/0.1")
            .form(&[("qs", query)]);
        log::info!("request for {query} dispatched");
        let response = request.send().await?;

        log::debug!("response status: {}", response.status());

        let inner = match response.status() {
            StatusCode::OK => response.text().await.map_err(Into::into),
            code => Err(Error::UnexpectedStatus(code)),
        };

        let (inner, cache_hit) = match inner {
            Ok(body) => {
                let (body, cache_hit) = strip_cache_marker(body);
                (Ok(body), cache_hit)
            }
            err => (err, false),
        };

        if cache_hit {
            log::debug!("{query} served from the proxy cache");
        }

        Ok(Reply { inner, cache_hit })
    }
}

#[async_trait]
impl Fetch for Client {
    async fn fetch(&self, query: &str) -> Result<Reply> {
        Client::fetch(self, query).await
    }
}

/// Splits the proxy's cache-hit marker off the end of a body, if present.
fn strip_cache_marker(body: String) -> (String, bool) {
    match body.strip_suffix(CACHE_MARKER) {
        Some(stripped) => (stripped.to_string(), true),
        None => (body, false),
    }
}

/// The proxy's answer to a single query.
///
/// Wraps the HTML body (or the error that replaced it) together with whether
/// the proxy served it from its cache. The cache flag only affects staleness,
/// never the meaning of the body.
#[derive(Debug)]
pub struct Reply {
    inner: Result<String>,
    cache_hit: bool,
}

impl Reply {
    /// Wraps a fetched body (or its failure) into a `Reply`.
    pub fn new(inner: Result<String>, cache_hit: bool) -> Reply {
        Reply { inner, cache_hit }
    }

    /// Returns true if the proxy answered from its cache.
    pub fn cache_hit(&self) -> bool {
        self.cache_hit
    }

    /// Consumes the reply and yields the HTML body.
    ///
    /// # Errors
    ///
    /// This function will return an error if the proxy answered with a
    /// non-`200` status or the body could not be read.
    pub fn into_body(self) -> Result<String> {
        self.inner
    }
}

impl Deref for Reply {
    type Target = Result<String>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
