//! Upload functions.

use std::time::Duration;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use common::crypto::HASH_LENGTH;
use common::skylink::{Skylink, SkylinkError};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use url::Url;
use serde::Deserialize;

use crate::portal::{make_url, CommonOptions, PortalRequest, PortalResponse, RequestError};
use crate::SkynetClient;

const PORTAL_FILE_FIELD_NAME: &str = "file";
const OCTET_STREAM: &str = "application/octet-stream";

/// Upload error.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("request error: {0}")]
    RequestError(#[from] RequestError),
    #[error("portal returned an invalid skylink: {0}")]
    InvalidSkylink(#[from] SkylinkError),
    #[error("upload response failed validation: {0}")]
    ValidationError(String),
}

/// Upload options.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Common options.
    pub common: CommonOptions,
    /// The endpoint to contact.
    pub endpoint_upload: String,
    /// Timeout for the whole upload (no limit if not set).
    pub timeout: Option<Duration>,
    /// Check that the returned skylink agrees with the merkle root and
    /// bitfield the portal reported alongside it.
    pub validate_skylink: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        CommonOptions::default().into()
    }
}

impl From<CommonOptions> for UploadOptions {
    fn from(common: CommonOptions) -> Self {
        Self {
            common,
            endpoint_upload: "/skynet/skyfile".to_string(),
            timeout: None,
            validate_skylink: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    skylink: String,
    merkleroot: String,
    bitfield: u16,
}

struct UploadRequest<'a> {
    endpoint: &'a str,
    form: Form,
}

impl PortalRequest for UploadRequest<'_> {
    type Response = UploadResponse;

    fn build_request(self, portal_url: &Url, client: &Client) -> RequestBuilder {
        client
            .post(make_url(portal_url, &[self.endpoint]))
            .multipart(self.form)
    }

    fn parse_response(response: PortalResponse) -> Result<Self::Response, RequestError> {
        response.json()
    }
}

impl SkynetClient {
    /// Upload `bytes` to a file with `filename`, returning its skylink.
    pub async fn upload_bytes(
        &self,
        bytes: &[u8],
        filename: &str,
        opts: Option<&UploadOptions>,
    ) -> Result<Skylink, UploadError> {
        let opts = self.options(opts);

        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(OCTET_STREAM)
            .map_err(RequestError::from)?;
        let request = UploadRequest {
            endpoint: &opts.endpoint_upload,
            form: Form::new().part(PORTAL_FILE_FIELD_NAME, part),
        };

        let response = self.call(request, &opts.common, opts.timeout).await?;
        let skylink: Skylink = response.skylink.parse()?;

        if opts.validate_skylink {
            validate_upload_response(&skylink, &response)?;
        }

        tracing::info!("uploaded {} ({} bytes) as {}", filename, bytes.len(), skylink);
        Ok(skylink)
    }
}

fn validate_upload_response(skylink: &Skylink, response: &UploadResponse) -> Result<(), UploadError> {
    if skylink.bitfield() != response.bitfield {
        return Err(UploadError::ValidationError(format!(
            "skylink bitfield {} does not match reported bitfield {}",
            skylink.bitfield(),
            response.bitfield
        )));
    }

    let merkle_root = decode_merkle_root(&response.merkleroot).ok_or_else(|| {
        UploadError::ValidationError(format!("malformed merkle root: {}", response.merkleroot))
    })?;
    if &merkle_root != skylink.merkle_root() {
        return Err(UploadError::ValidationError(
            "skylink merkle root does not match reported merkle root".to_string(),
        ));
    }
    Ok(())
}

/// Portals report merkle roots as hex; base64 is accepted too.
fn decode_merkle_root(s: &str) -> Option<[u8; HASH_LENGTH]> {
    let bytes = hex::decode(s)
        .ok()
        .or_else(|| URL_SAFE_NO_PAD.decode(s.trim_end_matches('=')).ok())
        .or_else(|| STANDARD.decode(s).ok())?;
    bytes.try_into().ok()
}
