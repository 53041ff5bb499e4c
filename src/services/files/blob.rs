use std::path::Path;

use async_stream::try_stream;
use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Method,
};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info};

use crate::services::{
    ollama::{executor::RequestExecutor, models::errors::ClientError},
    transport::{ByteStream, RequestBody},
};

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Computes `sha256:<hex>` over the file's contents without loading it into memory.
pub async fn digest_file(path: &Path) -> Result<String, ClientError> {
    let path = path.to_owned();
    tokio::task::spawn_blocking(move || -> Result<String, ClientError> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(format!("sha256:{:x}", hasher.finalize()))
    })
    .await
    .map_err(|e| ClientError::Io(std::io::Error::other(e)))?
}

fn file_stream(file: tokio::fs::File) -> ByteStream {
    Box::pin(try_stream! {
        let mut file = file;
        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
        loop {
            let n = file.read(&mut buf).await.map_err(ClientError::from)?;
            if n == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buf[..n]);
        }
    })
}

/// Uploads local files as content-addressed blobs.
#[derive(Debug, Clone)]
pub struct BlobUploader {
    executor: RequestExecutor,
}

impl BlobUploader {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Makes sure the server holds the blob for `path` and returns its digest.
    ///
    /// The file is only sent when the existence check answers 404; any other
    /// lookup failure is returned as is.
    pub async fn create_blob(&self, path: &Path) -> Result<String, ClientError> {
        let digest = digest_file(path).await?;
        let endpoint = format!("/blobs/{digest}");

        match self.executor.request(Method::HEAD, &endpoint, RequestBody::Empty).await {
            Ok(_) => {
                debug!(%digest, "blob already present");
                Ok(digest)
            }
            Err(e) if e.is_not_found() => {
                self.upload(path, &endpoint).await?;
                info!(%digest, path = %path.display(), "uploaded blob");
                Ok(digest)
            }
            Err(e) => {
                error!(%digest, error = %e, "blob lookup failed");
                Err(e)
            }
        }
    }

    async fn upload(&self, path: &Path, endpoint: &str) -> Result<(), ClientError> {
        if !self.executor.supports_streaming_body() {
            return Err(ClientError::Unsupported(
                "Streaming uploads are not supported in this environment.".into(),
            ));
        }

        let file = tokio::fs::File::open(path).await?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        let body = RequestBody::Stream(file_stream(file));
        self.executor
            .request_with_headers(Method::POST, endpoint, body, headers)
            .await?;
        Ok(())
    }
}
