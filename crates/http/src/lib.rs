//! XM HTTP client
//!
//! A preconfigured API client: base URL and timeout, `Content-Type` and
//! `token` headers injected on every request, response bodies normalized to
//! JSON, and a notification whenever the backend reports an expired session.

pub mod client;

pub use client::detection::UploadFile;
pub use client::error::ClientError;
pub use client::interceptor::{RequestInterceptor, ResponseInterceptor};
pub use client::request::{OutgoingRequest, RequestBody};
pub use client::response::{ApiResult, ResponseBody};
pub use client::unauthorized::{
    LOGIN_ROUTE, LoginRedirect, Navigator, UnauthorizedEvent, UnauthorizedHandler,
};
pub use client::{XmClient, XmClientBuilder};

#[cfg(not(target_arch = "wasm32"))]
pub use client::config::ClientConfig;
