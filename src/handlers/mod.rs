//! HTTP entry points: the action router, the MFA page and the service endpoints.

pub mod actions;
pub mod mfa;
pub mod root;

use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use serde_json::Value;

use crate::error::ConsoleError;
use crate::params::{self, Params};

/// Query string merged with the body (form or JSON object); body values win.
pub fn request_params(query: Option<&str>, headers: &HeaderMap, body: &Bytes) -> Result<Params, ConsoleError> {
    let query = params::from_urlencoded(query.unwrap_or_default().as_bytes());
    if body.is_empty() {
        return Ok(query);
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let body = if content_type.starts_with("application/json") {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(ConsoleError::bad_request("Request body must be a JSON object")),
            Err(e) => return Err(ConsoleError::bad_request(format!("Invalid JSON body: {}", e))),
        }
    } else {
        params::from_urlencoded(body)
    };

    Ok(params::merge(query, body))
}

pub fn host_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_body_overrides_query() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        let body = Bytes::from_static(b"status=1&moduleids[]=5&moduleids[]=6");

        let params = request_params(Some("action=module.update&status=0"), &headers, &body).unwrap();
        assert_eq!(params["action"], "module.update");
        assert_eq!(params["status"], "1");
        assert_eq!(params["moduleids"], json!(["5", "6"]));
    }

    #[test]
    fn test_json_body_must_be_object() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let params = request_params(None, &headers, &Bytes::from_static(br#"{"idx":"web.x","value_int":1}"#)).unwrap();
        assert_eq!(params["value_int"], 1);

        let err = request_params(None, &headers, &Bytes::from_static(b"[1]")).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
