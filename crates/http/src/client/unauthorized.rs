//! Unauthorized-response notification
//!
//! The response pipeline only classifies a body as unauthorized and notifies
//! subscribers; what happens next (routing to a login view, printing a notice,
//! clearing state) belongs to whoever subscribed.

use serde_json::Value;
use tracing::debug;

/// Route the login redirect navigates to
pub const LOGIN_ROUTE: &str = "/login";

/// Raised when a response body carries the unauthorized code
#[derive(Debug, Clone, PartialEq)]
pub struct UnauthorizedEvent {
    /// The `code` field as the server sent it
    pub code: Value,
    /// The `msg` field, if the body had one
    pub message: Option<String>,
}

/// Subscriber for unauthorized responses
///
/// Handlers run inline on the response path and must not block.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self, event: &UnauthorizedEvent);
}

impl<F> UnauthorizedHandler for F
where
    F: Fn(&UnauthorizedEvent) + Send + Sync,
{
    fn on_unauthorized(&self, event: &UnauthorizedEvent) {
        self(event);
    }
}

/// Client-side navigation
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Handler that sends the user to [`LOGIN_ROUTE`]
#[derive(Debug, Clone, Default)]
pub struct LoginRedirect<N> {
    navigator: N,
}

impl<N: Navigator> LoginRedirect<N> {
    pub const fn new(navigator: N) -> Self {
        Self { navigator }
    }

    pub const fn navigator(&self) -> &N {
        &self.navigator
    }
}

impl<N: Navigator> UnauthorizedHandler for LoginRedirect<N> {
    fn on_unauthorized(&self, event: &UnauthorizedEvent) {
        debug!(code = %event.code, "Redirecting to {LOGIN_ROUTE}");
        self.navigator.navigate(LOGIN_ROUTE);
    }
}
