use std::{fmt, sync::Arc};

use reqwest::{header::HeaderMap, Method};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, span, Instrument, Level};

use crate::services::{
    ollama::models::errors::ClientError,
    transport::{check_ok, HttpRequest, HttpResponse, RequestBody, Transport},
};

/// Sends requests against `<host>/api` with the client's headers and turns
/// non-2xx answers into errors.
#[derive(Clone)]
pub struct RequestExecutor {
    host: String,
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
}

impl fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("host", &self.host)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    pub fn new(host: String, transport: Arc<dyn Transport>, headers: HeaderMap) -> Self {
        Self {
            host,
            transport,
            headers,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/api{}", self.host, endpoint)
    }

    pub fn supports_streaming_body(&self) -> bool {
        self.transport.supports_streaming_body()
    }

    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
    ) -> Result<HttpResponse, ClientError> {
        self.request_with_headers(method, endpoint, body, HeaderMap::new()).await
    }

    /// Like [`RequestExecutor::request`], with `headers` taking precedence over
    /// the client's own.
    pub async fn request_with_headers(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
        headers: HeaderMap,
    ) -> Result<HttpResponse, ClientError> {
        let url = self.url(endpoint);
        let mut merged = self.headers.clone();
        for (name, value) in headers.iter() {
            merged.insert(name.clone(), value.clone());
        }

        let span = span!(
            Level::DEBUG,
            "ollama_request",
            "http.request.method" = method.as_str(),
            "url.full" = url.as_str(),
        );

        async move {
            debug!(body = ?body, "sending request");
            let response = self
                .transport
                .send(HttpRequest { method, url, headers: merged, body })
                .await?;

            match check_ok(response).await {
                Ok(response) => {
                    debug!(status = %response.status, "request succeeded");
                    Ok(response)
                }
                Err(e) => {
                    debug!(error = %e, "request failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Sends `body` as JSON and decodes a JSON answer.
    pub async fn json<B, R>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(method, endpoint, RequestBody::json(body)?).await?.json().await
    }

    pub async fn get<R: DeserializeOwned>(&self, endpoint: &str) -> Result<R, ClientError> {
        self.request(Method::GET, endpoint, RequestBody::Empty).await?.json().await
    }
}
