//! Browser bindings for the XM HTTP client: `localStorage` credentials,
//! History-API login redirects and console logging.

pub mod client;
pub mod config;
pub mod logging;
pub mod navigation;
pub mod storage;

pub use client::{build_client, create_client};
pub use config::FrontendConfig;
pub use logging::init_logging;
pub use navigation::HistoryNavigator;
pub use storage::LocalStorage;
