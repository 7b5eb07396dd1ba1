//! Client configuration and initialization

use crate::config::FrontendConfig;
use crate::navigation::HistoryNavigator;
use crate::storage::LocalStorage;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use web_sys::window;
pub use xm_http::ClientError;
use xm_http::{LoginRedirect, XmClient};

/// Global client instance
static CLIENT: OnceCell<XmClient> = OnceCell::new();

/// Pick the backend base URL
///
/// The build-time URL wins; otherwise requests go to the page's own origin.
fn resolve_base_url(configured: Option<&str>, origin: Option<String>) -> String {
    configured
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .or(origin)
        .unwrap_or_default()
}

/// Get the base URL for API calls
fn get_base_url() -> String {
    let origin = window().and_then(|w| w.location().origin().ok());
    resolve_base_url(FrontendConfig::BASE_URL, origin)
}

/// Build a client reading the token from `localStorage` and redirecting to
/// the login route when the backend reports an expired session
pub fn build_client() -> Result<XmClient, ClientError> {
    XmClient::builder()
        .base_url(get_base_url())
        .storage(Arc::new(LocalStorage))
        .on_unauthorized(Arc::new(LoginRedirect::new(HistoryNavigator)))
        .build()
}

/// Get the shared client instance, creating it on first use
pub fn create_client() -> Result<XmClient, ClientError> {
    CLIENT.get_or_try_init(build_client).cloned()
}
