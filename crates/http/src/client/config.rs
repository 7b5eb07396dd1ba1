//! Client configuration loaded from files and `XM_*` environment variables

use super::error::ClientError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:9090`
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("xm-client/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load configuration from `XM_BASE_URL`, `XM_TIMEOUT_SECS` and `XM_USER_AGENT`
    ///
    /// # Errors
    ///
    /// Returns an error if `XM_BASE_URL` is missing or a value cannot be parsed
    pub fn from_env() -> Result<Self, ClientError> {
        Self::load(None, None)
    }

    /// Load configuration from a file, with `XM_*` variables taking precedence
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        Self::load(Some(path.as_ref()), None)
    }

    /// Layer defaults, an optional file, `XM_*` variables and an explicit
    /// base URL, later sources winning
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL is configured anywhere or a value
    /// cannot be parsed
    pub fn load(path: Option<&Path>, base_url: Option<String>) -> Result<Self, ClientError> {
        Self::load_with_env(path, base_url, None)
    }

    /// [`Self::load`] reading `XM_*` values from `env` instead of the
    /// process environment when given
    fn load_with_env(
        path: Option<&Path>,
        base_url: Option<String>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ClientError> {
        let mut builder = Self::with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("XM").source(env))
            .set_override_option("base_url", base_url)?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    fn with_defaults()
    -> Result<config::ConfigBuilder<config::builder::DefaultState>, ClientError> {
        Ok(config::Config::builder()
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("user_agent", default_user_agent())?)
    }
}
