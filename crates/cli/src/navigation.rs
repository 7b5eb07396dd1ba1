//! Terminal stand-in for client-side navigation

use tracing::warn;
use xm_http::{LOGIN_ROUTE, Navigator};

/// Tells the user to sign in again instead of routing anywhere
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNavigator;

impl ConsoleNavigator {
    pub fn notice(path: &str) -> String {
        if path == LOGIN_ROUTE {
            "session expired, run `xm login --token <TOKEN>` to sign in again".to_string()
        } else {
            format!("the server asked to navigate to {path}")
        }
    }
}

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        warn!(path, "Navigation requested");
        eprintln!("{}", Self::notice(path));
    }
}
