//! Response envelope and HTTP encoding

use serde::Serialize;
use warp::http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE,
};
use warp::http::StatusCode;
use warp::hyper::Body;

use crate::error::HelperError;

/// Uniform JSON envelope: `{"ok": bool, ...}`
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

impl Response {
    pub fn ok(data: serde_json::Value) -> Self {
        Self { ok: true, data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: serde_json::json!({ "error": message.into() }),
        }
    }

    /// Preflight answer
    pub fn empty() -> Self {
        Self::ok(serde_json::json!({}))
    }

    pub fn merged(output_path: &str) -> Self {
        Self::ok(serde_json::json!({ "output_path": output_path }))
    }

    pub fn downloaded(output_dir: &str, message: &str) -> Self {
        Self::ok(serde_json::json!({
            "output_dir": output_dir,
            "message": message,
        }))
    }
}

impl From<&HelperError> for Response {
    fn from(err: &HelperError) -> Self {
        Response::error(err.to_string())
    }
}

/// Encode an envelope with the fixed JSON and CORS headers.
pub fn encode(status: StatusCode, response: &Response) -> warp::reply::Response {
    let body = serde_json::to_vec(response)
        .unwrap_or_else(|_| br#"{"ok":false,"error":"Internal error"}"#.to_vec());
    let len = body.len();

    let mut reply = warp::reply::Response::new(Body::from(body));
    *reply.status_mut() = status;

    let headers = reply.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));

    reply
}

/// Encode a handler result, mapping errors to their status code.
pub fn encode_result(result: Result<Response, HelperError>) -> warp::reply::Response {
    match result {
        Ok(response) => encode(StatusCode::OK, &response),
        Err(err) => encode(err.status(), &Response::from(&err)),
    }
}
