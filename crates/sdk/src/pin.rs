//! Pin functions.

use common::skylink::trim_skylink_prefix;
use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::portal::{make_url, CommonOptions, PortalRequest, PortalResponse, RequestError};
use crate::SkynetClient;

const SKYLINK_HEADER: &str = "skynet-skylink";

/// Pin error.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("request error: {0}")]
    RequestError(#[from] RequestError),
    #[error("invalid skylink: {0}")]
    InvalidSkylink(String),
    #[error("pin response failed validation: {0}")]
    ValidationError(String),
}

/// Pin options.
#[derive(Debug, Clone)]
pub struct PinOptions {
    /// Common options.
    pub common: CommonOptions,
    /// The endpoint to contact.
    pub endpoint_pin: String,
}

impl Default for PinOptions {
    fn default() -> Self {
        CommonOptions::default().into()
    }
}

impl From<CommonOptions> for PinOptions {
    fn from(common: CommonOptions) -> Self {
        Self {
            common,
            endpoint_pin: "/skynet/pin".to_string(),
        }
    }
}

struct PinRequest<'a> {
    endpoint: &'a str,
    skylink: &'a str,
}

impl PortalRequest for PinRequest<'_> {
    /// The skylink echoed back by the portal, if any
    type Response = Option<String>;

    fn build_request(self, portal_url: &Url, client: &Client) -> RequestBuilder {
        client.get(make_url(portal_url, &[self.endpoint, self.skylink]))
    }

    fn parse_response(response: PortalResponse) -> Result<Self::Response, RequestError> {
        Ok(response.header(SKYLINK_HEADER).map(str::to_string))
    }
}

impl SkynetClient {
    /// Re-pins the given `skylink` on the portal, returning the skylink the
    /// portal reports as pinned.
    pub async fn pin_skylink(
        &self,
        skylink: &str,
        opts: Option<&PinOptions>,
    ) -> Result<String, PinError> {
        let opts = self.options(opts);

        let skylink = trim_skylink_prefix(skylink);
        if skylink.trim_matches('/').is_empty() {
            return Err(PinError::InvalidSkylink("empty skylink".to_string()));
        }

        let request = PinRequest {
            endpoint: &opts.endpoint_pin,
            skylink,
        };
        let pinned = self.call(request, &opts.common, None).await?;

        pinned.ok_or_else(|| {
            tracing::warn!("pin response for {} carried no skylink header", skylink);
            PinError::ValidationError(format!("'{}' header not found in response", SKYLINK_HEADER))
        })
    }
}
