//! In-process mock portal for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use skynet::common::crypto::{hash_all, hash_data_key, PublicKey, Signature};
use skynet::common::registry::hash_registry_entry;
use skynet::{CommonOptions, SecretKey, Skylink, SkynetClient, Url};

/// A registry entry as the mock portal stores it
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub data: Vec<u8>,
    pub revision: u64,
    pub signature: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct PortalState {
    files: HashMap<String, Vec<u8>>,
    /// Keyed by (public key hex, data key hash hex)
    registry: HashMap<(String, String), StoredEntry>,
    /// Written just before the next registry write is handled
    pending_race: Option<(String, String, StoredEntry)>,
    pub cookies: Vec<String>,
    pub api_keys: Vec<String>,
    pub corrupt_merkle_root: bool,
    pub omit_pin_header: bool,
    /// Answer unknown downloads with a very large error body
    pub oversized_errors: bool,
    pub rejected_writes: usize,
}

pub struct MockPortal {
    pub url: Url,
    state: Arc<Mutex<PortalState>>,
}

impl MockPortal {
    /// Serve a fresh portal on an ephemeral local port
    pub async fn start() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let state = Arc::new(Mutex::new(PortalState::default()));

        let app = Router::new()
            .route("/skynet/skyfile", post(upload_handler))
            .route("/skynet/pin/:skylink", get(pin_handler))
            .route(
                "/skynet/registry",
                get(get_entry_handler).post(set_entry_handler),
            )
            .route("/:skylink", get(download_handler))
            .route("/:skylink/*path", get(download_path_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{}", addr)).unwrap(),
            state,
        }
    }

    pub fn options(&self) -> CommonOptions {
        CommonOptions::with_portal(self.url.clone())
    }

    /// A client whose calls default to this portal
    pub fn client(&self) -> SkynetClient {
        SkynetClient::with_options(self.options()).unwrap()
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, PortalState> {
        self.state.lock()
    }

    /// Store a file directly, returning its skylink
    pub fn insert_file(&self, bytes: &[u8]) -> Skylink {
        let skylink = fake_skylink(bytes);
        self.state
            .lock()
            .files
            .insert(skylink.to_string(), bytes.to_vec());
        skylink
    }

    /// Store a directory skyfile, returning its skylink. Each file is
    /// served at `<skylink>/<path>`.
    pub fn insert_directory(&self, files: &[(&str, &[u8])]) -> Skylink {
        let mut listing = Vec::new();
        for (path, bytes) in files {
            listing.extend_from_slice(path.as_bytes());
            listing.extend_from_slice(bytes);
        }
        let skylink = fake_skylink(&listing);

        let mut state = self.state.lock();
        for (path, bytes) in files {
            state
                .files
                .insert(format!("{}/{}", skylink, path.trim_matches('/')), bytes.to_vec());
        }
        skylink
    }

    /// Store an entry without any checks, bypassing the write endpoint
    pub fn insert_raw_entry(&self, public_key: &PublicKey, data_key: &str, entry: StoredEntry) {
        let key = (public_key.to_hex(), hex::encode(hash_data_key(data_key)));
        self.state.lock().registry.insert(key, entry);
    }

    pub fn entry(&self, public_key: &PublicKey, data_key: &str) -> Option<StoredEntry> {
        let key = (public_key.to_hex(), hex::encode(hash_data_key(data_key)));
        self.state.lock().registry.get(&key).cloned()
    }

    /// Have a competing writer land `entry` right before the next registry write
    pub fn race_next_write(&self, public_key: &PublicKey, data_key: &str, entry: StoredEntry) {
        self.state.lock().pending_race = Some((
            public_key.to_hex(),
            hex::encode(hash_data_key(data_key)),
            entry,
        ));
    }
}

/// Options for a portal at `url`
pub fn portal_options(url: &str) -> CommonOptions {
    CommonOptions::with_portal(Url::parse(url).unwrap())
}

/// Deterministic test key
pub fn secret_key(seed: u8) -> SecretKey {
    SecretKey::from_seed(&[seed; 32])
}

/// Sign an entry the way a second writer holding the same key would
pub fn signed_entry(secret_key: &SecretKey, data_key: &str, data: &[u8], revision: u64) -> StoredEntry {
    let hash = hash_registry_entry(&hash_data_key(data_key), data, revision);
    StoredEntry {
        data: data.to_vec(),
        revision,
        signature: secret_key.sign(&hash).unwrap().to_bytes().to_vec(),
    }
}

/// Version 1 skylink over the content hash
fn fake_skylink(bytes: &[u8]) -> Skylink {
    Skylink::new(0, hash_all(&[bytes])).unwrap()
}

fn record_headers(state: &Mutex<PortalState>, headers: &HeaderMap) {
    let mut state = state.lock();
    if let Some(cookie) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        state.cookies.push(cookie.to_string());
    }
    if let Some(key) = headers.get("skynet-api-key").and_then(|v| v.to_str().ok()) {
        state.api_keys.push(key.to_string());
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn download_handler(
    State(state): State<Arc<Mutex<PortalState>>>,
    Path(skylink): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_headers(&state, &headers);
    let state = state.lock();
    match state.files.get(&skylink) {
        Some(bytes) => bytes.clone().into_response(),
        None if state.oversized_errors => {
            (StatusCode::NOT_FOUND, "x".repeat(1 << 20)).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, "skylink not found"),
    }
}

async fn download_path_handler(
    State(state): State<Arc<Mutex<PortalState>>>,
    Path((skylink, path)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    record_headers(&state, &headers);
    let key = format!("{}/{}", skylink, path.trim_matches('/'));
    match state.lock().files.get(&key) {
        Some(bytes) => bytes.clone().into_response(),
        None => error_response(StatusCode::NOT_FOUND, "path not found in skyfile"),
    }
}

async fn upload_handler(
    State(state): State<Arc<Mutex<PortalState>>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    record_headers(&state, &headers);

    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            match field.bytes().await {
                Ok(bytes) => file = Some(bytes.to_vec()),
                Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
            }
        }
    }
    let Some(bytes) = file else {
        return error_response(StatusCode::BAD_REQUEST, "missing file field");
    };

    let skylink = fake_skylink(&bytes);
    let mut state = state.lock();
    state.files.insert(skylink.to_string(), bytes);

    let merkleroot = if state.corrupt_merkle_root {
        hex::encode([0u8; 32])
    } else {
        hex::encode(skylink.merkle_root())
    };
    Json(json!({
        "skylink": skylink.to_string(),
        "merkleroot": merkleroot,
        "bitfield": skylink.bitfield(),
    }))
    .into_response()
}

async fn pin_handler(
    State(state): State<Arc<Mutex<PortalState>>>,
    Path(skylink): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_headers(&state, &headers);
    let state = state.lock();
    if !state.files.contains_key(&skylink) {
        return error_response(StatusCode::NOT_FOUND, "skylink not found");
    }
    if state.omit_pin_header {
        return StatusCode::NO_CONTENT.into_response();
    }
    (StatusCode::NO_CONTENT, [("skynet-skylink", skylink)]).into_response()
}

async fn get_entry_handler(
    State(state): State<Arc<Mutex<PortalState>>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    record_headers(&state, &headers);

    let (Some(public_key), Some(data_key)) = (query.get("publickey"), query.get("datakey")) else {
        return error_response(StatusCode::BAD_REQUEST, "missing publickey or datakey");
    };
    let Some(public_key) = public_key.strip_prefix("ed25519:") else {
        return error_response(StatusCode::BAD_REQUEST, "unsupported key algorithm");
    };

    let key = (public_key.to_string(), data_key.clone());
    match state.lock().registry.get(&key) {
        Some(entry) => Json(json!({
            "data": hex::encode(&entry.data),
            "revision": entry.revision,
            "signature": hex::encode(&entry.signature),
        }))
        .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "registry entry not found"),
    }
}

#[derive(Debug, Deserialize)]
struct SiaPublicKey {
    algorithm: String,
    key: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct SetEntryBody {
    publickey: SiaPublicKey,
    datakey: String,
    revision: u64,
    data: Vec<u8>,
    signature: Vec<u8>,
}

async fn set_entry_handler(
    State(state): State<Arc<Mutex<PortalState>>>,
    headers: HeaderMap,
    Json(body): Json<SetEntryBody>,
) -> Response {
    record_headers(&state, &headers);
    let mut state = state.lock();

    if let Some((public_key, data_key, entry)) = state.pending_race.take() {
        state.registry.insert((public_key, data_key), entry);
    }

    if body.publickey.algorithm != "ed25519" {
        return error_response(StatusCode::BAD_REQUEST, "unsupported key algorithm");
    }
    let Ok(public_key) = PublicKey::try_from(body.publickey.key.as_slice()) else {
        return error_response(StatusCode::BAD_REQUEST, "malformed public key");
    };
    let Some(data_key_hash) = hex::decode(&body.datakey)
        .ok()
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
    else {
        return error_response(StatusCode::BAD_REQUEST, "malformed data key");
    };
    let Ok(signature) = Signature::try_from(body.signature.as_slice()) else {
        return error_response(StatusCode::BAD_REQUEST, "malformed signature");
    };

    let hash = hash_registry_entry(&data_key_hash, &body.data, body.revision);
    if public_key.verify(&hash, &signature).is_err() {
        state.rejected_writes += 1;
        return error_response(StatusCode::BAD_REQUEST, "invalid signature");
    }

    let key = (public_key.to_hex(), body.datakey);
    if let Some(existing) = state.registry.get(&key) {
        if existing.revision >= body.revision {
            state.rejected_writes += 1;
            return error_response(StatusCode::BAD_REQUEST, "revision number too low");
        }
    }

    state.registry.insert(
        key,
        StoredEntry {
            data: body.data,
            revision: body.revision,
            signature: body.signature,
        },
    );
    StatusCode::NO_CONTENT.into_response()
}
