//! Download functions.

use common::skylink::trim_skylink_prefix;
use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::portal::{make_url, CommonOptions, PortalRequest, PortalResponse, RequestError};
use crate::SkynetClient;

/// Download error.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("request error: {0}")]
    RequestError(#[from] RequestError),
    #[error("invalid skylink: {0}")]
    InvalidSkylink(String),
}

/// Download options.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Common options.
    pub common: CommonOptions,
    /// The endpoint to contact.
    pub endpoint_download: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        CommonOptions::default().into()
    }
}

impl From<CommonOptions> for DownloadOptions {
    fn from(common: CommonOptions) -> Self {
        Self {
            common,
            endpoint_download: "/".to_string(),
        }
    }
}

struct DownloadRequest<'a> {
    endpoint: &'a str,
    /// Skylink without the URI prefix, possibly followed by a path
    skylink: &'a str,
}

impl PortalRequest for DownloadRequest<'_> {
    type Response = Vec<u8>;

    fn build_request(self, portal_url: &Url, client: &Client) -> RequestBuilder {
        client.get(make_url(portal_url, &[self.endpoint, self.skylink]))
    }

    fn parse_response(response: PortalResponse) -> Result<Self::Response, RequestError> {
        Ok(response.body.to_vec())
    }
}

impl SkynetClient {
    /// Downloads the bytes at the given `skylink`.
    ///
    /// The skylink may carry the `sia://` prefix and a path into a directory
    /// skyfile. It is otherwise passed to the portal as is.
    pub async fn download_bytes(
        &self,
        skylink: &str,
        opts: Option<&DownloadOptions>,
    ) -> Result<Vec<u8>, DownloadError> {
        let opts = self.options(opts);

        let skylink = trim_skylink_prefix(skylink);
        if skylink.trim_matches('/').is_empty() {
            return Err(DownloadError::InvalidSkylink("empty skylink".to_string()));
        }

        let request = DownloadRequest {
            endpoint: &opts.endpoint_download,
            skylink,
        };
        let bytes = self.call(request, &opts.common, None).await?;

        tracing::debug!("downloaded {} bytes from {}", bytes.len(), skylink);
        Ok(bytes)
    }
}
