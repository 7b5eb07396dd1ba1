//! Request and response interceptors
//!
//! Every request passes through the client's [`RequestInterceptor`]s before it
//! is transmitted, and every successful response body passes through the
//! [`ResponseInterceptor`]s before it reaches the caller. The default chain is
//!
//! - requests: [`JsonContentType`], then [`TokenHeader`]
//! - responses: [`NormalizeBody`], then [`DetectUnauthorized`]

use super::error::ClientError;
use super::request::OutgoingRequest;
use super::response::ResponseBody;
use super::unauthorized::{UnauthorizedEvent, UnauthorizedHandler};
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use serde_json::Value;
use std::sync::Arc;
use tracing::{trace, warn};
use xm_core::{KeyValueStore, StoredUser};

/// Content type set on every non-multipart request
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// Header carrying the session token
pub const TOKEN_HEADER: HeaderName = HeaderName::from_static("token");

/// Code the backend puts in a body when the session is not valid
pub const UNAUTHORIZED_CODE: &str = "401";

/// Hook run on each outgoing request
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut OutgoingRequest) -> Result<(), ClientError>;
}

/// Hook run on each successful response body
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, body: ResponseBody) -> Result<ResponseBody, ClientError>;
}

/// Sets `Content-Type: application/json;charset=utf-8` unless the body is a
/// multipart form, whose boundary-bearing content type the transport sets
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonContentType;

impl RequestInterceptor for JsonContentType {
    fn on_request(&self, request: &mut OutgoingRequest) -> Result<(), ClientError> {
        if !request.body.is_multipart() {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }
        Ok(())
    }
}

/// Attaches the `token` header from the stored user record
///
/// The store is read on every request so a fresh login is picked up
/// immediately. Without a stored user the header is sent empty.
#[derive(Clone)]
pub struct TokenHeader {
    store: Arc<dyn KeyValueStore>,
}

impl TokenHeader {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl RequestInterceptor for TokenHeader {
    fn on_request(&self, request: &mut OutgoingRequest) -> Result<(), ClientError> {
        let user = StoredUser::load(self.store.as_ref())?;
        let token = HeaderValue::from_str(user.token_or_empty())?;
        request.headers.insert(TOKEN_HEADER, token);
        Ok(())
    }
}

/// Decodes bodies that arrive as JSON text
///
/// Covers plain-text bodies as well as JSON bodies whose value is itself a
/// string holding encoded JSON. The empty string passes through untouched;
/// any other text must be valid JSON or the call fails with
/// [`ClientError::Serialization`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeBody;

impl ResponseInterceptor for NormalizeBody {
    fn on_response(&self, body: ResponseBody) -> Result<ResponseBody, ClientError> {
        match body {
            ResponseBody::Text(text) | ResponseBody::Json(Value::String(text))
                if !text.is_empty() =>
            {
                trace!(len = text.len(), "Decoding string response body");
                Ok(ResponseBody::Json(serde_json::from_str(&text)?))
            }
            other => Ok(other),
        }
    }
}

/// Whether a body `code` field marks an unauthorized response
///
/// Accepts the number `401` as well as the string `"401"`.
pub fn is_unauthorized_code(code: &Value) -> bool {
    match code {
        Value::String(code) => code == UNAUTHORIZED_CODE,
        Value::Number(code) => code.as_u64() == Some(401),
        _ => false,
    }
}

/// Notifies [`UnauthorizedHandler`]s when a body carries the unauthorized code
///
/// The body is returned unchanged either way.
#[derive(Clone, Default)]
pub struct DetectUnauthorized {
    handlers: Vec<Arc<dyn UnauthorizedHandler>>,
}

impl DetectUnauthorized {
    pub fn new(handlers: Vec<Arc<dyn UnauthorizedHandler>>) -> Self {
        Self { handlers }
    }

    fn event_for(body: &ResponseBody) -> Option<UnauthorizedEvent> {
        let json = body.as_json()?;
        let code = json.get("code").filter(|c| is_unauthorized_code(c))?;
        Some(UnauthorizedEvent {
            code: code.clone(),
            message: json.get("msg").and_then(Value::as_str).map(str::to_string),
        })
    }
}

impl ResponseInterceptor for DetectUnauthorized {
    fn on_response(&self, body: ResponseBody) -> Result<ResponseBody, ClientError> {
        if let Some(event) = Self::event_for(&body) {
            warn!(
                code = %event.code,
                msg = event.message.as_deref().unwrap_or_default(),
                handlers = self.handlers.len(),
                "Unauthorized response"
            );
            for handler in &self.handlers {
                handler.on_unauthorized(&event);
            }
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use reqwest::multipart::Form;
    use serde_json::json;
    use std::sync::Mutex;
    use xm_core::{MemoryStore, USER_STORAGE_KEY};

    fn request() -> OutgoingRequest {
        OutgoingRequest::new(Method::POST, "http://localhost:9090/user/add")
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<UnauthorizedEvent>>,
    }

    impl UnauthorizedHandler for Recorder {
        fn on_unauthorized(&self, event: &UnauthorizedEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn detector() -> (DetectUnauthorized, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let handler: Arc<dyn UnauthorizedHandler> = recorder.clone();
        let detector = DetectUnauthorized::new(vec![handler]);
        (detector, recorder)
    }

    #[test]
    fn test_json_content_type_on_json_body() {
        let mut req = request().json_value(json!({"name": "ada"}));
        JsonContentType.on_request(&mut req).unwrap();
        assert_eq!(req.headers[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_json_content_type_on_empty_body() {
        let mut req = OutgoingRequest::new(Method::GET, "http://localhost:9090/user/selectAll");
        JsonContentType.on_request(&mut req).unwrap();
        assert_eq!(req.headers[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_json_content_type_skips_multipart() {
        let mut req = request().multipart(Form::new().text("file", "data"));
        JsonContentType.on_request(&mut req).unwrap();
        assert!(req.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_token_header_from_stored_user() {
        let store = Arc::new(MemoryStore::with_item(
            USER_STORAGE_KEY,
            r#"{"username":"admin","token":"abc.def.ghi"}"#,
        ));
        let mut req = request();
        TokenHeader::new(store).on_request(&mut req).unwrap();
        assert_eq!(req.headers[TOKEN_HEADER], "abc.def.ghi");
    }

    #[test]
    fn test_token_header_empty_without_user() {
        let mut req = request();
        TokenHeader::new(Arc::new(MemoryStore::new()))
            .on_request(&mut req)
            .unwrap();
        assert_eq!(req.headers[TOKEN_HEADER], "");
    }

    #[test]
    fn test_token_header_reads_store_each_time() {
        let store = Arc::new(MemoryStore::new());
        let interceptor = TokenHeader::new(store.clone());

        let mut first = request();
        interceptor.on_request(&mut first).unwrap();
        assert_eq!(first.headers[TOKEN_HEADER], "");

        StoredUser::with_token("fresh").save(store.as_ref()).unwrap();

        let mut second = request();
        interceptor.on_request(&mut second).unwrap();
        assert_eq!(second.headers[TOKEN_HEADER], "fresh");
    }

    #[test]
    fn test_token_header_malformed_user_fails() {
        let store = Arc::new(MemoryStore::with_item(USER_STORAGE_KEY, "not-json"));
        let mut req = request();
        let result = TokenHeader::new(store).on_request(&mut req);
        assert!(matches!(result, Err(ClientError::Credentials(_))));
    }

    #[test]
    fn test_normalize_parses_text() {
        let body = NormalizeBody
            .on_response(ResponseBody::Text(r#"{"code":"200","data":[1]}"#.into()))
            .unwrap();
        assert_eq!(body, ResponseBody::Json(json!({"code": "200", "data": [1]})));
    }

    #[test]
    fn test_normalize_keeps_empty_string() {
        let body = NormalizeBody
            .on_response(ResponseBody::Text(String::new()))
            .unwrap();
        assert_eq!(body, ResponseBody::Text(String::new()));
    }

    #[test]
    fn test_normalize_parses_json_string_value() {
        let body = NormalizeBody
            .on_response(ResponseBody::Json(json!(r#"{"code":"401","msg":"x"}"#)))
            .unwrap();
        assert_eq!(body, ResponseBody::Json(json!({"code": "401", "msg": "x"})));
    }

    #[test]
    fn test_normalize_keeps_empty_json_string() {
        let body = NormalizeBody
            .on_response(ResponseBody::Json(json!("")))
            .unwrap();
        assert_eq!(body, ResponseBody::Json(json!("")));
    }

    #[test]
    fn test_normalize_keeps_structured_body() {
        let body = NormalizeBody
            .on_response(ResponseBody::Json(json!({"code": "200"})))
            .unwrap();
        assert_eq!(body, ResponseBody::Json(json!({"code": "200"})));
    }

    #[test]
    fn test_normalize_rejects_malformed_text() {
        let result = NormalizeBody.on_response(ResponseBody::Text("<html>".into()));
        assert!(matches!(result, Err(ClientError::Serialization(_))));
    }

    #[test]
    fn test_is_unauthorized_code() {
        assert!(is_unauthorized_code(&json!("401")));
        assert!(is_unauthorized_code(&json!(401)));
        assert!(!is_unauthorized_code(&json!("200")));
        assert!(!is_unauthorized_code(&json!(401.5)));
        assert!(!is_unauthorized_code(&Value::Null));
    }

    #[test]
    fn test_detect_unauthorized_notifies() {
        let (detector, recorder) = detector();
        let body = ResponseBody::Json(json!({"code": "401", "msg": "x"}));

        let returned = detector.on_response(body.clone()).unwrap();

        assert_eq!(returned, body);
        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].code, json!("401"));
        assert_eq!(events[0].message.as_deref(), Some("x"));
    }

    #[test]
    fn test_detect_unauthorized_ignores_other_codes() {
        let (detector, recorder) = detector();
        let body = ResponseBody::Json(json!({"code": "200", "data": {}}));

        assert_eq!(detector.on_response(body.clone()).unwrap(), body);
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_detect_unauthorized_ignores_text() {
        let (detector, recorder) = detector();
        detector
            .on_response(ResponseBody::Text(String::new()))
            .unwrap();
        assert!(recorder.events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_pipeline_string_body_triggers_handler() {
        let (detector, recorder) = detector();
        let body = NormalizeBody
            .on_response(ResponseBody::Text(r#"{"code":"401","msg":"x"}"#.into()))
            .and_then(|b| detector.on_response(b))
            .unwrap();

        assert_eq!(body.into_value(), json!({"code": "401", "msg": "x"}));
        assert_eq!(recorder.events.lock().unwrap().len(), 1);
    }
}
