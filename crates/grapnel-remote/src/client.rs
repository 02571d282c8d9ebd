//! HTTP client for the hosting service's REST endpoints.
//!
//! Every endpoint is a form-encoded POST carrying the account's
//! `customer_id` and `pin`; bodies are read as text first so decode
//! failures keep the raw payload available for debug dumps.

use std::path::Path;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{RemoteError, RemoteResult};
use crate::model::{Ack, Transfer, TransferList, TransferTree, UploadTicket};

const LIST_PATH: &str = "/api/transfer/list";
const BROWSE_PATH: &str = "/api/torrent/browse";
const CREATE_PATH: &str = "/api/transfer/create";
const DELETE_PATH: &str = "/api/transfer/delete";
const STATUS_ERROR: &str = "error";

/// Client for the hosting service's credentialed REST API.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: Url,
    customer_id: String,
    pin: String,
    debug: bool,
}

impl RemoteClient {
    /// Build a client for the service at `base_url` with account credentials.
    #[must_use]
    pub fn new(
        http: Client,
        base_url: Url,
        customer_id: impl Into<String>,
        pin: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            customer_id: customer_id.into(),
            pin: pin.into(),
            debug: false,
        }
    }

    /// Dump raw response bodies through `tracing::debug` when enabled.
    #[must_use]
    pub const fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Fetch the account's transfer list in service order.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails transport-level, the
    /// service reports an error status, or the body cannot be decoded.
    pub async fn list_transfers(&self) -> RemoteResult<Vec<Transfer>> {
        const OPERATION: &str = "transfer_list";
        let body = self.post_form(OPERATION, LIST_PATH, &[]).await?;
        let list: TransferList = decode_envelope(OPERATION, &body)?;
        Ok(list.transfers)
    }

    /// Resolve the single transfer whose name starts with `prefix`,
    /// compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::AmbiguousName`] when several transfers
    /// share the prefix, [`RemoteError::NoMatch`] when none does, and
    /// any error the underlying list call produces.
    pub async fn find_transfer(&self, prefix: &str) -> RemoteResult<Transfer> {
        let transfers = self.list_transfers().await?;
        find_by_prefix(transfers, prefix)
    }

    /// Browse the content tree of a transfer by info hash.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails transport-level, the
    /// service reports an error status, or the body cannot be decoded.
    pub async fn browse_transfer(&self, hash: &str) -> RemoteResult<TransferTree> {
        const OPERATION: &str = "torrent_browse";
        let body = self
            .post_form(OPERATION, BROWSE_PATH, &[("hash", hash)])
            .await?;
        decode_envelope(OPERATION, &body)
    }

    /// Upload a `.torrent` file from the local filesystem.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, the request fails
    /// transport-level, the service reports an error status, or the
    /// body cannot be decoded.
    pub async fn upload_torrent_file(&self, path: &Path) -> RemoteResult<UploadTicket> {
        const OPERATION: &str = "transfer_create";
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| RemoteError::io(OPERATION, path, source))?;
        let file_name = path.file_name().map_or_else(
            || "upload.torrent".to_string(),
            |name| name.to_string_lossy().into_owned(),
        );

        let form = Form::new()
            .part("src", Part::bytes(bytes).file_name(file_name))
            .text("customer_id", self.customer_id.clone())
            .text("pin", self.pin.clone())
            .text("type", "torrent");
        let response = self
            .http
            .post(self.endpoint(CREATE_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(|source| RemoteError::http(OPERATION, source))?;

        let body = self.read_body(OPERATION, response).await?;
        decode_envelope(OPERATION, &body)
    }

    /// Submit a magnet link for server-side fetching.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails transport-level, the
    /// service reports an error status, or the body cannot be decoded.
    pub async fn upload_magnet(&self, link: &str) -> RemoteResult<UploadTicket> {
        const OPERATION: &str = "transfer_create";
        let body = self
            .post_form(OPERATION, CREATE_PATH, &[("type", "torrent"), ("src", link)])
            .await?;
        decode_envelope(OPERATION, &body)
    }

    /// Delete a transfer server-side.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails transport-level, the
    /// service reports an error status, or the body cannot be decoded.
    pub async fn delete_transfer(&self, id: &str) -> RemoteResult<()> {
        const OPERATION: &str = "transfer_delete";
        let body = self
            .post_form(OPERATION, DELETE_PATH, &[("type", "torrent"), ("id", id)])
            .await?;
        decode_envelope::<Ack>(OPERATION, &body)?;
        Ok(())
    }

    async fn post_form(
        &self,
        operation: &'static str,
        path: &str,
        extra: &[(&str, &str)],
    ) -> RemoteResult<String> {
        let mut form: Vec<(&str, &str)> = Vec::with_capacity(extra.len() + 2);
        form.push(("customer_id", self.customer_id.as_str()));
        form.push(("pin", self.pin.as_str()));
        form.extend_from_slice(extra);

        let response = self
            .http
            .post(self.endpoint(path))
            .form(&form)
            .send()
            .await
            .map_err(|source| RemoteError::http(operation, source))?;
        self.read_body(operation, response).await
    }

    async fn read_body(
        &self,
        operation: &'static str,
        response: reqwest::Response,
    ) -> RemoteResult<String> {
        let body = response
            .text()
            .await
            .map_err(|source| RemoteError::http(operation, source))?;
        if self.debug {
            tracing::debug!(operation, body = %body, "raw service response");
        }
        Ok(body)
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}{path}")
    }
}

/// Decode a service envelope, surfacing `status: "error"` bodies as
/// [`RemoteError::Api`] before attempting the typed decode.
fn decode_envelope<T: DeserializeOwned>(operation: &'static str, body: &str) -> RemoteResult<T> {
    let probe: StatusProbe =
        serde_json::from_str(body).map_err(|source| RemoteError::decode(operation, source))?;
    if probe.status == STATUS_ERROR {
        let message = probe
            .message
            .unwrap_or_else(|| "service reported an unspecified failure".to_string());
        return Err(RemoteError::api(operation, message));
    }
    serde_json::from_str(body).map_err(|source| RemoteError::decode(operation, source))
}

#[derive(Deserialize)]
struct StatusProbe {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

fn find_by_prefix(transfers: Vec<Transfer>, prefix: &str) -> RemoteResult<Transfer> {
    let needle = prefix.to_lowercase();
    let mut matched: Option<Transfer> = None;
    for transfer in transfers {
        if transfer.name.to_lowercase().starts_with(&needle) {
            if matched.is_some() {
                return Err(RemoteError::AmbiguousName {
                    prefix: prefix.to_string(),
                });
            }
            matched = Some(transfer);
        }
    }
    matched.ok_or_else(|| RemoteError::NoMatch {
        prefix: prefix.to_string(),
    })
}
