use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use futures::{
    future::{self, BoxFuture},
    stream, StreamExt,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method, StatusCode,
};
use serde_json::Value;

use super::{HttpRequest, HttpResponse, RequestBody, Transport};
use crate::services::ollama::models::errors::ClientError;

/// A request as seen by [`MockTransport`], with any streamed body collected.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub json: Option<Value>,
    pub raw: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub json: bool,
    pub chunks: Vec<Bytes>,
    /// Keep the body open after the last chunk.
    pub hang: bool,
    /// Never answer at all.
    pub stall: bool,
}

impl MockResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            json: true,
            chunks: vec![Bytes::from(body.to_string())],
            hang: false,
            stall: false,
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            json: false,
            chunks: vec![],
            hang: false,
            stall: false,
        }
    }

    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Bytes>,
    {
        Self {
            status: 200,
            json: false,
            chunks: chunks.into_iter().map(Into::into).collect(),
            hang: false,
            stall: false,
        }
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }
}

type Handler = Box<dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync>;

/// Scripted in-memory transport.
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<RecordedRequest>>,
    streaming: bool,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport").field("streaming", &self.streaming).finish()
    }
}

impl MockTransport {
    /// Answers requests with `responses` in order, then with 500s.
    pub fn sequence(responses: Vec<MockResponse>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::with_handler(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    MockResponse::json(500, serde_json::json!({"error": "unscripted request"}))
                })
        })
    }

    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            streaming: true,
        }
    }

    pub fn without_streaming_bodies(mut self) -> Self {
        self.streaming = false;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &Method) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.method == *method).count()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ClientError>> {
        Box::pin(async move {
            let HttpRequest { method, url, headers, body } = request;
            let (json, raw) = match body {
                RequestBody::Empty => (None, None),
                RequestBody::Json(v) => (Some(v), None),
                RequestBody::Stream(mut s) => {
                    let mut raw = Vec::new();
                    while let Some(chunk) = s.next().await {
                        raw.extend_from_slice(&chunk?);
                    }
                    (None, Some(raw))
                }
            };
            let recorded = RecordedRequest { method, url, headers, json, raw };
            let scripted = (self.handler)(&recorded);
            self.requests.lock().unwrap().push(recorded);
            if scripted.stall {
                future::pending::<()>().await;
            }

            let mut headers = HeaderMap::new();
            if scripted.json {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            let chunks = stream::iter(scripted.chunks.into_iter().map(Ok::<Bytes, ClientError>));
            let body: super::ByteStream = if scripted.hang {
                Box::pin(chunks.chain(stream::pending()))
            } else {
                Box::pin(chunks)
            };
            Ok::<_, ClientError>(HttpResponse::new(
                StatusCode::from_u16(scripted.status).unwrap(),
                headers,
                body,
            ))
        })
    }

    fn supports_streaming_body(&self) -> bool {
        self.streaming
    }
}
