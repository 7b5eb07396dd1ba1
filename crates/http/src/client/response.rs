//! Incoming response bodies and the backend's result envelope

use super::error::ClientError;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A response body as it moves through the response interceptors
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Already structured (served as JSON)
    Json(Value),
    /// Raw text, possibly a JSON document served with a text content type
    Text(String),
}

impl ResponseBody {
    /// Read the body of a successful response
    ///
    /// JSON content types are decoded eagerly; a JSON-typed body that fails to
    /// decode is kept as text so the normalizing interceptor reports it.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));

        let text = response.text().await?;

        if is_json && !text.is_empty() {
            if let Ok(value) = serde_json::from_str(&text) {
                return Ok(Self::Json(value));
            }
        }

        Ok(Self::Text(text))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// The body as a JSON value; text becomes a JSON string
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

/// Success code used by the backend's result envelope
pub const SUCCESS_CODE: &str = "200";

/// `{ code, msg, data }` envelope wrapped around every backend answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResult<T> {
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,
    pub msg: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Unwrap `data`, turning a non-success code into [`ClientError::Api`]
    pub fn into_data(self) -> Result<Option<T>, ClientError> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(ClientError::Api {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            })
        }
    }
}

impl<T: DeserializeOwned> ApiResult<T> {
    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        Ok(serde_json::from_value(value)?)
    }
}

fn code_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(code) => Ok(code),
        Value::Number(code) => Ok(code.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number code, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_value() {
        assert_eq!(ResponseBody::Json(json!({"a": 1})).into_value(), json!({"a": 1}));
        assert_eq!(ResponseBody::Text(String::new()).into_value(), json!(""));
    }

    #[test]
    fn test_api_result_success() {
        let result: ApiResult<Vec<u32>> =
            ApiResult::from_value(json!({"code": "200", "msg": "ok", "data": [1, 2]})).unwrap();
        assert!(result.is_success());
        assert_eq!(result.into_data().unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_api_result_numeric_code() {
        let result: ApiResult<Value> =
            ApiResult::from_value(json!({"code": 200, "data": null})).unwrap();
        assert!(result.is_success());
        assert_eq!(result.into_data().unwrap(), None);
    }

    #[test]
    fn test_api_result_error_code() {
        let result: ApiResult<Value> =
            ApiResult::from_value(json!({"code": "500", "msg": "detection failed"})).unwrap();
        let err = result.into_data().unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { ref code, ref message } if code == "500" && message == "detection failed"
        ));
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Detection {
        label: String,
    }

    #[test]
    fn test_api_result_payload_without_default() {
        let result: ApiResult<Detection> =
            ApiResult::from_value(json!({"code": "200", "data": {"label": "crack"}})).unwrap();
        assert_eq!(result.msg, None);
        assert_eq!(
            result.into_data().unwrap(),
            Some(Detection {
                label: "crack".into()
            })
        );

        let empty: ApiResult<Detection> = ApiResult::from_value(json!({"code": "200"})).unwrap();
        assert_eq!(empty.into_data().unwrap(), None);
    }
}
