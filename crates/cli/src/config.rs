//! CLI configuration utilities

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use xm_http::ClientConfig;

/// File the CLI keeps the logged-in user in, relative to the data directory
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Resolve the data directory: explicit flag, then `XM_STATE_DIR`, then the
/// system data directory
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        std::env::var_os("XM_STATE_DIR").map_or_else(
            || {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("xm")
            },
            PathBuf::from,
        )
    })
}

pub fn credentials_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CREDENTIALS_FILE)
}

/// Load the client configuration
///
/// Defaults, then the config file, then `XM_*` variables, then `--base-url`
/// and `--timeout`.
pub fn load_client_config(
    config_file: Option<&Path>,
    base_url: Option<String>,
    timeout: Option<u64>,
) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(config_file, base_url).context(
        "failed to load client configuration; pass --base-url or --config, or set XM_BASE_URL",
    )?;

    if let Some(secs) = timeout {
        config.timeout_secs = secs;
    }

    Ok(config)
}
