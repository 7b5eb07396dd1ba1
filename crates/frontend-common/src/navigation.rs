//! History-API navigation for single-page apps

use std::fmt::Debug;
use tracing::{debug, error};
use wasm_bindgen::JsValue;
use web_sys::PopStateEvent;
use xm_http::Navigator;

/// Navigates by pushing onto `window.history`
///
/// A `popstate` event is dispatched after the push so client-side routers
/// listening for history changes render the new route. If the History API
/// is unavailable the navigator falls back to a full page load.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryNavigator;

impl HistoryNavigator {
    fn push(path: &str) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window object"))?;
        window
            .history()?
            .push_state_with_url(&JsValue::NULL, "", Some(path))?;
        let event = PopStateEvent::new("popstate")?;
        window.dispatch_event(&event)?;
        Ok(())
    }

    fn assign(path: &str) -> Result<(), JsValue> {
        web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window object"))?
            .location()
            .set_href(path)
    }
}

/// Try `push`, falling back to `assign`; both failures are logged and the
/// fallback's error is returned
fn navigate_with<E: Debug>(
    path: &str,
    push: impl FnOnce(&str) -> Result<(), E>,
    assign: impl FnOnce(&str) -> Result<(), E>,
) -> Result<(), E> {
    let Err(err) = push(path) else {
        return Ok(());
    };
    error!("History navigation to {path} failed: {err:?}");

    assign(path).inspect_err(|err| {
        error!("Fallback navigation to {path} failed: {err:?}");
    })
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        debug!(path, "Navigating");
        let _ = navigate_with(path, Self::push, Self::assign);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_push_success_skips_fallback() {
        let assigned = RefCell::new(Vec::new());
        let result = navigate_with(
            "/login",
            |_| Ok::<(), String>(()),
            |path| {
                assigned.borrow_mut().push(path.to_string());
                Ok(())
            },
        );
        assert!(result.is_ok());
        assert!(assigned.borrow().is_empty());
    }

    #[test]
    fn test_push_failure_falls_back() {
        let assigned = RefCell::new(Vec::new());
        let result = navigate_with(
            "/login",
            |_| Err("SecurityError".to_string()),
            |path| {
                assigned.borrow_mut().push(path.to_string());
                Ok(())
            },
        );
        assert!(result.is_ok());
        assert_eq!(*assigned.borrow(), vec!["/login".to_string()]);
    }

    #[test]
    fn test_fallback_failure_is_reported() {
        let result = navigate_with(
            "/login",
            |_| Err("no history".to_string()),
            |_| Err("no location".to_string()),
        );
        assert_eq!(result, Err("no location".to_string()));
    }
}
