//! Blocking HTTP adapter for the Consul KV API

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::{KvStore, ModifyIndex, Result, StoreConfig, StoreEntry, StoreError};

const TOKEN_HEADER: &str = "X-Consul-Token";

/// One element of a `/v1/kv` response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvPair {
    key: String,
    /// Base64 payload; `null` for empty values
    value: Option<String>,
    modify_index: u64,
}

impl KvPair {
    fn into_entry(self, op: &'static str) -> Result<StoreEntry> {
        let value = match self.value {
            Some(encoded) => STANDARD.decode(encoded).map_err(|e| StoreError::Decode {
                op,
                key: self.key.clone(),
                message: e.to_string(),
            })?,
            None => Vec::new(),
        };
        Ok(StoreEntry {
            key: self.key,
            value,
            version: ModifyIndex(self.modify_index),
        })
    }
}

/// Consul KV client.
///
/// All calls block the current thread until the agent answers or the
/// configured timeout elapses. Nothing is retried here.
#[derive(Debug, Clone)]
pub struct ConsulStore {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl ConsulStore {
    /// Build a client for the configured agent.
    ///
    /// Fails on an unusable address; no request is made yet.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let base = config.base_url()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(StoreError::ClientBuild)?;

        Ok(Self {
            client,
            base,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// The `/v1/kv/<key>` URL, with every key segment percent-encoded.
    pub fn kv_url(&self, key: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidAddress {
                address: self.base.to_string(),
                reason: "cannot be used as a base URL".into(),
            })?
            .pop_if_empty()
            .extend(["v1", "kv"])
            .extend(key.split('/'));
        Ok(url)
    }

    fn send(&self, op: &'static str, key: &str, request: RequestBuilder) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        };
        tracing::debug!(op, key, "consul request");
        request.send().map_err(|source| StoreError::Transport {
            op,
            key: key.to_string(),
            source,
        })
    }

    fn read_body(op: &'static str, key: &str, response: Response) -> Result<String> {
        let status = response.status();
        let body = response.text().map_err(|source| StoreError::Transport {
            op,
            key: key.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(StoreError::Status {
                op,
                key: key.to_string(),
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(body)
    }

    fn decode<T: serde::de::DeserializeOwned>(op: &'static str, key: &str, body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| StoreError::Decode {
            op,
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn read_pairs(&self, op: &'static str, key: &str, request: RequestBuilder) -> Result<Vec<StoreEntry>> {
        let response = self.send(op, key, request)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body = Self::read_body(op, key, response)?;
        let pairs: Vec<KvPair> = Self::decode(op, key, &body)?;
        pairs.into_iter().map(|pair| pair.into_entry(op)).collect()
    }

    fn conditional(&self, op: &'static str, key: &str, request: RequestBuilder) -> Result<bool> {
        let response = self.send(op, key, request)?;
        let body = Self::read_body(op, key, response)?;
        Self::decode(op, key, body.trim())
    }
}

impl KvStore for ConsulStore {
    fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>> {
        let url = self.kv_url(prefix)?;
        let request = self.client.get(url).query(&[("recurse", "true")]);
        self.read_pairs("list", prefix, request)
    }

    fn get(&self, key: &str) -> Result<Option<StoreEntry>> {
        let url = self.kv_url(key)?;
        let entries = self.read_pairs("get", key, self.client.get(url))?;
        Ok(entries.into_iter().find(|entry| entry.key == key))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<ModifyIndex> {
        let url = self.kv_url(key)?;
        let request = self.client.put(url).body(value.to_vec());
        if !self.conditional("put", key, request)? {
            return Err(StoreError::Rejected {
                key: key.to_string(),
            });
        }
        // The write response carries no index; read it back.
        self.get(key)?
            .map(|entry| entry.version)
            .ok_or_else(|| StoreError::Vanished {
                key: key.to_string(),
            })
    }

    fn compare_and_swap(&self, key: &str, value: &[u8], expected: ModifyIndex) -> Result<bool> {
        let url = self.kv_url(key)?;
        let request = self
            .client
            .put(url)
            .query(&[("cas", expected.0)])
            .body(value.to_vec());
        self.conditional("cas", key, request)
    }

    fn compare_and_delete(&self, key: &str, expected: ModifyIndex) -> Result<bool> {
        let url = self.kv_url(key)?;
        let request = self.client.delete(url).query(&[("cas", expected.0)]);
        self.conditional("delete-cas", key, request)
    }
}
