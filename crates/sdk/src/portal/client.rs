use std::borrow::Cow;
use std::time::Duration;

use reqwest::header::COOKIE;
use reqwest::{Client, Response};

use super::error::{RequestError, MAX_ERROR_BODY_LEN};
use super::options::CommonOptions;
use super::{PortalRequest, PortalResponse};
use crate::config::SkynetConfig;

const SKYNET_API_KEY_HEADER: &str = "Skynet-Api-Key";
const USER_AGENT: &str = concat!("skynet-sdk/", env!("CARGO_PKG_VERSION"));

/// Client for a Skynet portal.
///
/// Holds no protocol state: only a pooled HTTP client and the [`CommonOptions`]
/// used when a call passes no options of its own. Cloning is cheap and clones
/// share the connection pool, so one client can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct SkynetClient {
    client: Client,
    defaults: CommonOptions,
}

impl SkynetClient {
    /// Client for the default portal
    pub fn new() -> Result<Self, RequestError> {
        Self::with_options(CommonOptions::default())
    }

    /// Client whose calls default to `defaults`
    pub fn with_options(defaults: CommonOptions) -> Result<Self, RequestError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::from_http_client(client, defaults))
    }

    /// Client built from a loaded [`SkynetConfig`]
    pub fn from_config(config: &SkynetConfig) -> Result<Self, RequestError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        Ok(Self::from_http_client(
            builder.build()?,
            config.common_options(),
        ))
    }

    /// Wrap an existing HTTP client
    pub fn from_http_client(client: Client, defaults: CommonOptions) -> Self {
        Self { client, defaults }
    }

    /// The options used when a call passes none
    pub fn defaults(&self) -> &CommonOptions {
        &self.defaults
    }

    /// Get the underlying HTTP client for custom requests
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Resolve per-call options, falling back to this client's defaults
    pub(crate) fn options<'a, O>(&self, opts: Option<&'a O>) -> Cow<'a, O>
    where
        O: Clone + From<CommonOptions>,
    {
        match opts {
            Some(opts) => Cow::Borrowed(opts),
            None => Cow::Owned(O::from(self.defaults.clone())),
        }
    }

    /// Send `request` to the portal named in `common`.
    ///
    /// Attaches the cookie and API key headers, applies `timeout` to the whole
    /// request and rejects statuses the endpoint does not accept.
    pub async fn call<T: PortalRequest>(
        &self,
        request: T,
        common: &CommonOptions,
        timeout: Option<Duration>,
    ) -> Result<T::Response, RequestError> {
        let mut builder = request.build_request(&common.portal_url, &self.client);
        if let Some(cookie) = &common.custom_cookie {
            builder = builder.header(COOKIE, cookie);
        }
        if let Some(key) = &common.skynet_api_key {
            builder = builder.header(SKYNET_API_KEY_HEADER, key);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let request = builder.build()?;
        tracing::debug!(method = %request.method(), url = %request.url(), "sending portal request");

        let response = self.client.execute(request).await.map_err(|e| {
            tracing::debug!("portal request failed: {}", e);
            RequestError::from(e)
        })?;

        let status = response.status();
        if !T::accepts_status(status) {
            let url = response.url().clone();
            let body = read_error_body(response).await;
            tracing::warn!(%status, %url, "unexpected portal status");
            return Err(RequestError::UnexpectedStatus { status, body });
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?;

        T::parse_response(PortalResponse {
            status,
            headers,
            body,
        })
    }
}

/// Read at most [`MAX_ERROR_BODY_LEN`] bytes of an error response.
async fn read_error_body(mut response: Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY_LEN {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            _ => break,
        }
    }
    body.truncate(MAX_ERROR_BODY_LEN);
    String::from_utf8_lossy(&body).into_owned()
}
