use url::Url;

/// The default Skynet portal URL.
pub const DEFAULT_PORTAL_URL: &str = "https://siasky.net";

pub(crate) fn default_portal_url() -> Url {
    Url::parse(DEFAULT_PORTAL_URL).expect("default portal URL must parse")
}

/// Options common to all portal requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonOptions {
    /// The portal URL.
    pub portal_url: Url,
    /// Optional custom cookie, sent as the `Cookie` header.
    pub custom_cookie: Option<String>,
    /// Optional Skynet API key, sent as the `Skynet-Api-Key` header.
    pub skynet_api_key: Option<String>,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            portal_url: default_portal_url(),
            custom_cookie: None,
            skynet_api_key: None,
        }
    }
}

impl CommonOptions {
    /// Options pointing at `portal_url` with no credentials
    pub fn with_portal(portal_url: Url) -> Self {
        Self {
            portal_url,
            ..Default::default()
        }
    }
}
