use futures::{future::BoxFuture, TryStreamExt};
use reqwest::{Body, Client};
use tracing::error;

use super::{HttpRequest, HttpResponse, RequestBody, Transport};
use crate::services::ollama::models::errors::ClientError;

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("Could not build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ClientError>> {
        Box::pin(async move {
            let HttpRequest { method, url, headers, body } = request;
            let mut builder = self.client.request(method, &url).headers(headers);
            builder = match body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
                RequestBody::Stream(stream) => builder.body(Body::wrap_stream(stream)),
            };

            let response = builder.send().await.map_err(|e| {
                error!(%url, error = %e, "failed to send request");
                ClientError::from(e)
            })?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = Box::pin(response.bytes_stream().map_err(ClientError::from));
            Ok::<_, ClientError>(HttpResponse::new(status, headers, body))
        })
    }
}
