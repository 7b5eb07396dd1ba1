//! Frontend configuration

/// Build-time frontend settings
pub struct FrontendConfig;

impl FrontendConfig {
    /// Backend base URL baked in at build time (`XM_BASE_URL=... trunk build`)
    pub const BASE_URL: Option<&'static str> = option_env!("XM_BASE_URL");

    /// Route shown when the session has expired
    pub const LOGIN_ROUTE: &'static str = xm_http::LOGIN_ROUTE;
}
