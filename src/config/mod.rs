//! Harness configuration.
//!
//! A [`HarnessConfig`] is built once (defaults, then an optional JSON file,
//! then CLI overrides), validated, and passed explicitly to the runner. There
//! is no global state.

use reqwest::Url;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://fakestoreapi.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BODY_EXCERPT_LIMIT: usize = 2048;
pub const DEFAULT_BURST_SIZE: usize = 5;
pub const MAX_BURST_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("endpoint `{0}` must start with `/`")]
    InvalidEndpoint(String),
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("burst size must be greater than zero")]
    ZeroBurst,
    #[error("burst size {0} exceeds the maximum of {MAX_BURST_SIZE}")]
    BurstTooLarge(usize),
    #[error("user agent `{user_agent}` is not a valid header value: {reason}")]
    InvalidUserAgent { user_agent: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    #[serde(default = "default_users_endpoint")]
    pub users: String,
    #[serde(default = "default_products_endpoint")]
    pub products: String,
    #[serde(default = "default_carts_endpoint")]
    pub carts: String,
    #[serde(default = "default_login_endpoint")]
    pub login: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            users: default_users_endpoint(),
            products: default_products_endpoint(),
            carts: default_carts_endpoint(),
            login: default_login_endpoint(),
        }
    }
}

impl Endpoints {
    fn all(&self) -> [&str; 4] {
        [
            self.users.as_str(),
            self.products.as_str(),
            self.carts.as_str(),
            self.login.as_str(),
        ]
    }
}

/// Tag filter applied to generated cases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[serde(default)]
    pub include_tags: BTreeSet<String>,
    #[serde(default)]
    pub exclude_tags: BTreeSet<String>,
}

impl Selection {
    /// A case is selected when it carries at least one included tag (or no
    /// include filter is set) and none of the excluded tags.
    pub fn matches(&self, tags: &BTreeSet<String>) -> bool {
        let included =
            self.include_tags.is_empty() || self.include_tags.iter().any(|tag| tags.contains(tag));
        included && !self.exclude_tags.iter().any(|tag| tags.contains(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default = "default_body_excerpt_limit")]
    pub body_excerpt_limit: usize,
    #[serde(default)]
    pub burst_size: Option<usize>,
    #[serde(default)]
    pub selection: Selection,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoints: Endpoints::default(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            verify_ssl: default_verify_ssl(),
            proxy_url: None,
            body_excerpt_limit: default_body_excerpt_limit(),
            burst_size: None,
            selection: Selection::default(),
        }
    }
}

impl HarnessConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|err| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: err.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        Ok(url)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;

        if let Some(endpoint) = self.endpoints.all().into_iter().find(|e| !e.starts_with('/')) {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        match self.burst_size {
            Some(0) => return Err(ConfigError::ZeroBurst),
            Some(size) if size > MAX_BURST_SIZE => return Err(ConfigError::BurstTooLarge(size)),
            _ => {}
        }
        HeaderValue::from_str(&self.user_agent).map_err(|err| ConfigError::InvalidUserAgent {
            user_agent: self.user_agent.escape_debug().to_string(),
            reason: err.to_string(),
        })?;

        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_users_endpoint() -> String {
    "/users".to_string()
}

fn default_products_endpoint() -> String {
    "/products".to_string()
}

fn default_carts_endpoint() -> String {
    "/carts".to_string()
}

fn default_login_endpoint() -> String {
    "/auth/login".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    format!("api-conformance/{}", env!("CARGO_PKG_VERSION"))
}

fn default_verify_ssl() -> bool {
    true
}

fn default_body_excerpt_limit() -> usize {
    DEFAULT_BODY_EXCERPT_LIMIT
}
