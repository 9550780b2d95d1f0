//! Client configuration, populated from environment variables.

use std::time::Duration;

use crate::error::GraphError;

/// The Graph API endpoint every call is bound to by default.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for a [`GraphClient`](crate::GraphClient).
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `FBGRAPH_BASE_URL` | `https://graph.facebook.com` | API base URL; function paths are appended to it |
/// | `FBGRAPH_TIMEOUT_SECS` | `30` | Per-request timeout |
/// | `FBGRAPH_USER_AGENT` | `fbgraph/<version>` | `User-Agent` header sent with every request |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// Base URL of the Graph API, without a trailing slash.
    pub base_url: String,

    /// Timeout applied to each HTTP request.
    pub timeout: Duration,

    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("fbgraph/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GraphConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, GraphError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GraphError> {
        let defaults = Self::default();

        let base_url = lookup("FBGRAPH_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        if base_url.is_empty() {
            return Err(GraphError::Config("FBGRAPH_BASE_URL must not be empty".into()));
        }

        let timeout = match lookup("FBGRAPH_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                GraphError::Config(format!(
                    "FBGRAPH_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            None => defaults.timeout,
        };

        Ok(Self {
            base_url,
            timeout,
            user_agent: lookup("FBGRAPH_USER_AGENT").unwrap_or(defaults.user_agent),
        })
    }

    /// Replace the base URL, e.g. to point at a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}
