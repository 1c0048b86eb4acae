//! Registry functions.
//!
//! Registry entries are read with [`SkynetClient::get_entry`] and written with
//! [`SkynetClient::set_entry`], where the caller picks the revision.
//! [`SkynetClient::set_entry_data`] picks the next revision itself by reading
//! the entry first.

use std::time::Duration;

use common::crypto::{PublicKey, SecretKey, Signature, SignatureError};
use common::registry::{self, EntryData, RegistryEntry, SignedRegistryEntry};
use common::skylink::SkylinkError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::portal::{make_url, CommonOptions, PortalRequest, PortalResponse, RequestError};
use crate::SkynetClient;

/// Portal-side registry lookup timeout in seconds, sent with every read.
const DEFAULT_GET_ENTRY_TIMEOUT: &str = "5";
const ED25519_KEY_PREFIX: &str = "ed25519:";
const ED25519_ALGORITHM: &str = "ed25519";
const DEFAULT_ENDPOINT_REGISTRY: &str = "/skynet/registry";

/// Get entry error.
#[derive(Debug, thiserror::Error)]
pub enum GetEntryError {
    #[error("request error: {0}")]
    RequestError(#[from] RequestError),
    #[error("UTF-8 error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
    #[error("signature error: {0}")]
    SignatureError(#[from] SignatureError),
    #[error("malformed entry data: {0}")]
    MalformedData(#[from] hex::FromHexError),
    /// The entry's signature does not match its owner and contents.
    #[error("entry failed validation: {0}")]
    ValidationError(String),
    #[error("entry does not hold a data link: {0}")]
    InvalidDataLink(#[from] SkylinkError),
}

/// Set entry error.
#[derive(Debug, thiserror::Error)]
pub enum SetEntryError {
    #[error("request error: {0}")]
    RequestError(#[from] RequestError),
    #[error("signature error: {0}")]
    SignatureError(#[from] SignatureError),
    /// The entry cannot be stored, e.g. its payload is too long.
    #[error("entry failed validation: {0}")]
    ValidationError(#[source] SignatureError),
}

/// Set entry data error.
#[derive(Debug, thiserror::Error)]
pub enum SetEntryDataError {
    #[error("failed to read current entry: {0}")]
    GetEntryError(#[from] GetEntryError),
    #[error("failed to write entry: {0}")]
    SetEntryError(#[from] SetEntryError),
    #[error("entry revision is already at its maximum")]
    RevisionOverflow,
    #[error("revision {attempted} lost a race: registry now holds revision {current}")]
    RevisionConflict { attempted: u64, current: u64 },
}

/// Get entry options.
#[derive(Debug, Clone)]
pub struct GetEntryOptions {
    /// Common options.
    pub common: CommonOptions,
    /// The endpoint to contact.
    pub endpoint_get_entry: String,
    /// Client-side timeout for the whole request (no limit if not set).
    pub timeout: Option<Duration>,
}

impl Default for GetEntryOptions {
    fn default() -> Self {
        CommonOptions::default().into()
    }
}

impl From<CommonOptions> for GetEntryOptions {
    fn from(common: CommonOptions) -> Self {
        Self {
            common,
            endpoint_get_entry: DEFAULT_ENDPOINT_REGISTRY.to_string(),
            timeout: None,
        }
    }
}

/// Set entry options.
#[derive(Debug, Clone)]
pub struct SetEntryOptions {
    /// Common options.
    pub common: CommonOptions,
    /// The endpoint to contact.
    pub endpoint_set_entry: String,
}

impl Default for SetEntryOptions {
    fn default() -> Self {
        CommonOptions::default().into()
    }
}

impl From<CommonOptions> for SetEntryOptions {
    fn from(common: CommonOptions) -> Self {
        Self {
            common,
            endpoint_set_entry: DEFAULT_ENDPOINT_REGISTRY.to_string(),
        }
    }
}

/// Set entry data options, covering both the read and the write.
#[derive(Debug, Clone)]
pub struct SetEntryDataOptions {
    /// Common options.
    pub common: CommonOptions,
    /// The endpoint used to read the current entry.
    pub endpoint_get_entry: String,
    /// The endpoint used to write the new entry.
    pub endpoint_set_entry: String,
    /// Client-side timeout for reading the current entry.
    pub timeout: Option<Duration>,
}

impl Default for SetEntryDataOptions {
    fn default() -> Self {
        CommonOptions::default().into()
    }
}

impl From<CommonOptions> for SetEntryDataOptions {
    fn from(common: CommonOptions) -> Self {
        Self {
            common,
            endpoint_get_entry: DEFAULT_ENDPOINT_REGISTRY.to_string(),
            endpoint_set_entry: DEFAULT_ENDPOINT_REGISTRY.to_string(),
            timeout: None,
        }
    }
}

impl SetEntryDataOptions {
    pub fn get_entry_options(&self) -> GetEntryOptions {
        GetEntryOptions {
            common: self.common.clone(),
            endpoint_get_entry: self.endpoint_get_entry.clone(),
            timeout: self.timeout,
        }
    }

    pub fn set_entry_options(&self) -> SetEntryOptions {
        SetEntryOptions {
            common: self.common.clone(),
            endpoint_set_entry: self.endpoint_set_entry.clone(),
        }
    }
}

/// Build the URL for reading the entry of `public_key` under `data_key`.
pub fn get_entry_url(public_key: &PublicKey, data_key: &str, opts: &GetEntryOptions) -> Url {
    let mut url = make_url(&opts.common.portal_url, &[opts.endpoint_get_entry.as_str()]);
    let data_key_hash = common::crypto::hash_data_key(data_key);

    url.query_pairs_mut()
        .clear()
        .append_pair("publickey", &format!("{}{}", ED25519_KEY_PREFIX, public_key.to_hex()))
        .append_pair("datakey", &hex::encode(data_key_hash))
        .append_pair("timeout", DEFAULT_GET_ENTRY_TIMEOUT);
    url
}

#[derive(Debug, Deserialize)]
struct GetEntryResponse {
    data: String,
    revision: u64,
    signature: String,
}

struct GetEntryRequest {
    url: Url,
}

impl PortalRequest for GetEntryRequest {
    type Response = Option<GetEntryResponse>;

    fn build_request(self, _portal_url: &Url, client: &Client) -> RequestBuilder {
        client.get(self.url)
    }

    fn accepts_status(status: StatusCode) -> bool {
        status.is_success() || status == StatusCode::NOT_FOUND
    }

    fn parse_response(response: PortalResponse) -> Result<Self::Response, RequestError> {
        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        response.json().map(Some)
    }
}

#[derive(Debug, Serialize)]
struct SiaPublicKey {
    algorithm: &'static str,
    key: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct SetEntryBody {
    publickey: SiaPublicKey,
    datakey: String,
    revision: u64,
    data: Vec<u8>,
    signature: Vec<u8>,
}

struct SetEntryRequest<'a> {
    endpoint: &'a str,
    body: SetEntryBody,
}

impl PortalRequest for SetEntryRequest<'_> {
    type Response = ();

    fn build_request(self, portal_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(make_url(portal_url, &[self.endpoint]))
            .json(&self.body)
    }

    fn parse_response(_response: PortalResponse) -> Result<Self::Response, RequestError> {
        Ok(())
    }
}

impl SkynetClient {
    /// Read and verify the entry of `public_key` under `data_key`.
    ///
    /// Returns `None` when the registry holds no such entry. Nothing is
    /// retried; a timeout from `opts` surfaces as [`RequestError::HttpError`].
    pub async fn get_entry(
        &self,
        public_key: &PublicKey,
        data_key: &str,
        opts: Option<&GetEntryOptions>,
    ) -> Result<Option<SignedRegistryEntry>, GetEntryError> {
        let opts = self.options(opts);

        let request = GetEntryRequest {
            url: get_entry_url(public_key, data_key, &opts),
        };
        let Some(response) = self.call(request, &opts.common, opts.timeout).await? else {
            tracing::debug!("no registry entry for {} under {:?}", public_key, data_key);
            return Ok(None);
        };

        verify_entry_response(response, public_key, data_key).map(Some)
    }

    /// Read the payload and revision of an entry, if it exists.
    pub async fn get_entry_data(
        &self,
        public_key: &PublicKey,
        data_key: &str,
        opts: Option<&GetEntryOptions>,
    ) -> Result<Option<EntryData>, GetEntryError> {
        let signed = self.get_entry(public_key, data_key, opts).await?;
        Ok(signed.map(|signed| signed.entry.into()))
    }

    /// Sign `entry` and publish it under the key's public half.
    ///
    /// The caller chooses the revision. The registry rejects a revision that is
    /// not higher than the stored one, which surfaces as
    /// [`RequestError::UnexpectedStatus`].
    pub async fn set_entry(
        &self,
        secret_key: &SecretKey,
        entry: &RegistryEntry,
        opts: Option<&SetEntryOptions>,
    ) -> Result<(), SetEntryError> {
        let opts = self.options(opts);

        let signature = registry::sign(entry, secret_key).map_err(|e| match e {
            SignatureError::DataTooLong { .. } => SetEntryError::ValidationError(e),
            e => SetEntryError::SignatureError(e),
        })?;

        let request = SetEntryRequest {
            endpoint: &opts.endpoint_set_entry,
            body: SetEntryBody {
                publickey: SiaPublicKey {
                    algorithm: ED25519_ALGORITHM,
                    key: secret_key.public().to_bytes().to_vec(),
                },
                datakey: hex::encode(entry.data_key_hash()),
                revision: entry.revision,
                data: entry.data.clone(),
                signature: signature.to_bytes().to_vec(),
            },
        };
        self.call(request, &opts.common, None).await?;

        tracing::debug!(
            "set registry entry {:?} to revision {}",
            entry.data_key,
            entry.revision
        );
        Ok(())
    }

    /// Write `data` under `data_key`, using the revision after the current one.
    ///
    /// This reads the entry and then writes it, so two writers racing on the
    /// same key can both pick the same revision. The registry accepts only
    /// one of them; the loser gets [`SetEntryDataError::RevisionConflict`].
    /// Callers needing a single writer must serialize calls for a key
    /// themselves, or use [`SkynetClient::set_entry`] with their own revision.
    pub async fn set_entry_data(
        &self,
        secret_key: &SecretKey,
        data_key: &str,
        data: &[u8],
        opts: Option<&SetEntryDataOptions>,
    ) -> Result<EntryData, SetEntryDataError> {
        let opts = self.options(opts);
        let public_key = secret_key.public();
        let get_opts = opts.get_entry_options();

        let revision = match self.get_entry(&public_key, data_key, Some(&get_opts)).await? {
            Some(current) => current
                .entry
                .revision
                .checked_add(1)
                .ok_or(SetEntryDataError::RevisionOverflow)?,
            None => 0,
        };

        let entry = RegistryEntry::new(data_key, data, revision);
        let err = match self
            .set_entry(secret_key, &entry, Some(&opts.set_entry_options()))
            .await
        {
            Ok(()) => return Ok(entry.into()),
            Err(err) => err,
        };

        if is_rejected_write(&err) {
            if let Ok(Some(current)) = self.get_entry(&public_key, data_key, Some(&get_opts)).await {
                if current.entry.revision >= revision {
                    tracing::warn!(
                        "lost race on {:?}: attempted revision {}, registry holds {}",
                        data_key,
                        revision,
                        current.entry.revision
                    );
                    return Err(SetEntryDataError::RevisionConflict {
                        attempted: revision,
                        current: current.entry.revision,
                    });
                }
            }
        }

        Err(err.into())
    }
}

/// Decode a registry response and check it was signed by `public_key`.
fn verify_entry_response(
    response: GetEntryResponse,
    public_key: &PublicKey,
    data_key: &str,
) -> Result<SignedRegistryEntry, GetEntryError> {
    let data = hex::decode(&response.data)?;
    let signature = Signature::from_hex(&response.signature)?;

    let signed = SignedRegistryEntry {
        entry: RegistryEntry::new(data_key, data, response.revision),
        signature,
    };
    if !signed.verify(public_key) {
        tracing::warn!(
            "registry entry for {} under {:?} has an invalid signature",
            public_key,
            data_key
        );
        return Err(GetEntryError::ValidationError(
            "signature does not match entry".to_string(),
        ));
    }
    Ok(signed)
}

fn is_rejected_write(err: &SetEntryError) -> bool {
    match err {
        SetEntryError::RequestError(e) => e.status().is_some_and(|s| s.is_client_error()),
        _ => false,
    }
}
