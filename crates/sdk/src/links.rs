//! Data links: skylinks stored in registry entries.
//!
//! An entry link is a v2 skylink derived from a public key and data key.
//! Portals resolve it to whatever skylink the entry currently holds, which
//! gives a stable link to mutable content.

use common::crypto::{PublicKey, SecretKey};
use common::registry::EntryData;
use common::skylink::{Skylink, RAW_SKYLINK_SIZE};

use crate::registry::{GetEntryError, GetEntryOptions, SetEntryDataError, SetEntryDataOptions};
use crate::SkynetClient;

/// The `sia://` entry link for `public_key` and `data_key`. No network access.
pub fn get_entry_link(public_key: &PublicKey, data_key: &str) -> String {
    Skylink::entry_link(public_key, data_key).to_uri()
}

impl SkynetClient {
    /// Point the entry under `data_key` at `skylink`.
    ///
    /// The skylink is stored in its raw 34-byte form, which fits a registry
    /// entry with room to spare.
    pub async fn set_data_link(
        &self,
        secret_key: &SecretKey,
        data_key: &str,
        skylink: &Skylink,
        opts: Option<&SetEntryDataOptions>,
    ) -> Result<EntryData, SetEntryDataError> {
        let entry = self
            .set_entry_data(secret_key, data_key, &skylink.to_bytes(), opts)
            .await?;
        tracing::info!("{} now points at {}", get_entry_link(&secret_key.public(), data_key), skylink);
        Ok(entry)
    }

    /// The skylink stored under `data_key`, if the entry exists.
    ///
    /// Accepts both the raw form written by [`SkynetClient::set_data_link`]
    /// and a base64 skylink stored as text.
    pub async fn get_data_link(
        &self,
        public_key: &PublicKey,
        data_key: &str,
        opts: Option<&GetEntryOptions>,
    ) -> Result<Option<Skylink>, GetEntryError> {
        let Some(entry) = self.get_entry_data(public_key, data_key, opts).await? else {
            return Ok(None);
        };
        decode_data_link(&entry.data).map(Some)
    }
}

fn decode_data_link(data: &[u8]) -> Result<Skylink, GetEntryError> {
    if data.len() == RAW_SKYLINK_SIZE {
        return Ok(Skylink::from_bytes(data)?);
    }
    let text = std::str::from_utf8(data)?;
    Ok(text.trim().parse()?)
}
