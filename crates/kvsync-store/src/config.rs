//! Connection settings for a store client

use std::time::Duration;

use reqwest::Url;

use crate::{Result, StoreError};

/// Default agent address, matching the Consul CLI.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8500";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the store lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// `host:port` or a full `http(s)://` URL
    pub address: String,
    /// Static access token; `None` or empty means unauthenticated
    pub token: Option<String>,
    /// Upper bound on a single HTTP request
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl StoreConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the address into a base URL.
    ///
    /// A bare `host:port` is assumed to speak plain HTTP.
    pub fn base_url(&self) -> Result<Url> {
        let address = self.address.trim();
        let invalid = |reason: String| StoreError::InvalidAddress {
            address: self.address.clone(),
            reason,
        };

        if address.is_empty() {
            return Err(invalid("address is empty".into()));
        }

        let candidate = if address.contains("://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };

        let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(invalid(format!("unsupported scheme '{other}'"))),
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }
        Ok(url)
    }
}
