use std::{fmt, pin::Pin};

use bytes::{Bytes, BytesMut};
use futures::{future::BoxFuture, Stream, TryStreamExt};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::services::ollama::models::errors::ClientError;

pub mod host;
pub mod reqwest_transport;

#[cfg(test)]
pub(crate) mod mock;

pub use host::{format_host, DEFAULT_HOST, DEFAULT_PORT};
pub use reqwest_transport::ReqwestTransport;

/// A body delivered chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send + 'static>>;

/// Request payload. Callers choose explicitly between structured data and
/// raw bytes.
pub enum RequestBody {
    Empty,
    Json(Value),
    Stream(ByteStream),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(body: &T) -> Result<Self, ClientError> {
        Ok(RequestBody::Json(serde_json::to_value(body)?))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "Empty"),
            RequestBody::Json(v) => f.debug_tuple("Json").field(v).finish(),
            RequestBody::Stream(_) => write!(f, "Stream(..)"),
        }
    }
}

#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false)
    }

    pub async fn bytes(self) -> Result<Bytes, ClientError> {
        let buf = self
            .body
            .try_fold(BytesMut::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        Ok(buf.freeze())
    }

    pub async fn text(self) -> Result<String, ClientError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        let text = self.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ClientError::Serialization(format!(
                "Error decoding response body: {e}. Raw JSON was: '{text}'"
            ))
        })
    }
}

/// Issues HTTP requests on behalf of the client.
///
/// The client never talks to the network directly; everything goes through
/// an implementation of this trait, so hosts can inject their own.
pub trait Transport: Send + Sync + fmt::Debug {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ClientError>>;

    /// Whether [`RequestBody::Stream`] bodies can be sent without buffering.
    fn supports_streaming_body(&self) -> bool {
        true
    }
}

/// Headers attached to every request before config and per-call headers.
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Ok(agent) = HeaderValue::from_str(&user_agent()) {
        headers.insert(USER_AGENT, agent);
    }
    headers
}

pub fn user_agent() -> String {
    format!(
        "ollama-client/{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}

/// Passes 2xx responses through and turns anything else into
/// [`ClientError::Response`].
pub async fn check_ok(response: HttpResponse) -> Result<HttpResponse, ClientError> {
    let status = response.status;
    if status.is_success() {
        return Ok(response);
    }

    let fallback = format!(
        "Error {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
    let message = match response.text().await {
        Ok(text) => match serde_json::from_str::<Value>(&text) {
            Ok(json) => match json.get("error").and_then(Value::as_str) {
                Some(error) => error.to_string(),
                None if !text.trim().is_empty() => text,
                None => fallback,
            },
            Err(_) if !text.trim().is_empty() => text,
            Err(_) => fallback,
        },
        Err(_) => fallback,
    };

    Err(ClientError::Response { status: status.as_u16(), message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn response(status: u16, body: &'static str) -> HttpResponse {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![Ok(Bytes::from_static(body.as_bytes()))];
        HttpResponse::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Box::pin(stream::iter(chunks)),
        )
    }

    #[tokio::test]
    async fn success_passes_through() {
        let resp = check_ok(response(200, r#"{"ok":true}"#)).await.unwrap();
        let v: Value = resp.json().await.unwrap();
        assert_eq!(v["ok"], true);
    }

    #[tokio::test]
    async fn json_error_field_becomes_message() {
        let err = check_ok(response(404, r#"{"error":"not found"}"#)).await.unwrap_err();
        match err {
            ClientError::Response { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_text_body_becomes_message() {
        let err = check_ok(response(500, "model runner crashed")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("model runner crashed"));
    }

    #[tokio::test]
    async fn empty_body_falls_back_to_status_line() {
        let err = check_ok(response(404, "")).await.unwrap_err();
        match err {
            ClientError::Response { message, .. } => assert_eq!(message, "Error 404: Not Found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn default_headers_are_json() {
        let headers = default_headers();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("ollama-client/"));
    }
}
