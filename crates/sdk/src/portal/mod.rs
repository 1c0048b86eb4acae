//! Portal request layer.
//!
//! Every endpoint is described by a [`PortalRequest`]: it builds its own HTTP
//! request against a portal URL and parses the portal's answer. [`SkynetClient`]
//! does everything in between: headers, timeouts, sending and status checks.

mod client;
mod error;
pub(crate) mod options;

pub use client::SkynetClient;
pub use error::{RequestError, MAX_ERROR_BODY_LEN};
pub use options::{CommonOptions, DEFAULT_PORTAL_URL};

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

pub trait PortalRequest {
    type Response;

    fn build_request(self, portal_url: &Url, client: &Client) -> RequestBuilder;

    /// Statuses the endpoint handles itself instead of failing with
    /// [`RequestError::UnexpectedStatus`].
    fn accepts_status(status: StatusCode) -> bool {
        status.is_success()
    }

    fn parse_response(response: PortalResponse) -> Result<Self::Response, RequestError>;
}

/// A fully read portal response
#[derive(Debug)]
pub struct PortalResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl PortalResponse {
    /// The body as UTF-8 text
    pub fn text(&self) -> Result<String, RequestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    /// The body parsed as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        let text = self.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    /// A header value, looked up case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Append path components to `base`, keeping any path `base` already has.
///
/// Slashes around each component are normalised and empty components are
/// skipped. A `?query` in the last component becomes the URL's query, and any
/// query or fragment on `base` is dropped.
pub fn make_url(base: &Url, components: &[&str]) -> Url {
    let mut path = base.path().trim_end_matches('/').to_string();
    for component in components {
        let trimmed = component.trim_matches('/');
        if trimmed.is_empty() {
            continue;
        }
        path.push('/');
        path.push_str(trimmed);
    }

    // fragments never reach the portal
    let path = path.split('#').next().unwrap_or_default();
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base.clone();
    url.set_path(path);
    url.set_query(query);
    url.set_fragment(None);
    url
}
