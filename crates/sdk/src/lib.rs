/**
 * Client configuration, loaded from
 *  `~/.skynet/config.toml`.
 */
pub mod config;
/**
 * Downloading skyfiles by skylink.
 */
pub mod download;
/**
 * Data links: skylinks stored in
 *  registry entries.
 */
pub mod links;
/**
 * Re-pinning skylinks on a portal.
 */
pub mod pin;
/**
 * The portal client and the request
 *  layer every endpoint goes through.
 */
pub mod portal;
/**
 * Reading and writing signed
 *  registry entries.
 */
pub mod registry;
/**
 * Uploading files.
 */
pub mod upload;

pub use common;
pub use url::Url;
pub use common::prelude::*;

pub use config::{ConfigError, SkynetConfig};
pub use download::{DownloadError, DownloadOptions};
pub use links::get_entry_link;
pub use pin::{PinError, PinOptions};
pub use portal::{
    CommonOptions, RequestError, SkynetClient, DEFAULT_PORTAL_URL, MAX_ERROR_BODY_LEN,
};
pub use registry::{
    get_entry_url, GetEntryError, GetEntryOptions, SetEntryDataError, SetEntryDataOptions,
    SetEntryError, SetEntryOptions,
};
pub use upload::{UploadError, UploadOptions};
