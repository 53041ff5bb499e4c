use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::Abortable;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::services::{
    files::{encode_images, rewrite_modelfile, BlobUploader},
    ollama::{
        client_config::ClientConfig,
        executor::RequestExecutor,
        models::*,
        registry::RequestRegistry,
    },
    streaming::{json_lines, AbortableStream},
    transport::{format_host, ReqwestTransport, RequestBody, Transport},
};

/// Client for the Ollama HTTP API.
///
/// Cheap to clone; clones share the transport and the set of open streams,
/// so [`Ollama::abort`] on any clone cancels streams opened by all of them.
///
/// ```no_run
/// use ollama_client::{ClientBuilder, ClientConfig, GenerateRequest};
///
/// async {
///     let ollama = ClientConfig::default().host(":11434").build().unwrap();
///     let reply = ollama.generate(GenerateRequest::new("llama3.2", "Why is the sky blue?")).await;
/// };
/// ```
#[derive(Clone, Debug)]
pub struct Ollama {
    inner: Arc<OllamaInner>,
}

#[derive(Debug)]
struct OllamaInner {
    config: ClientConfig,
    executor: RequestExecutor,
    blobs: Option<BlobUploader>,
    registry: Arc<RequestRegistry>,
}

impl Ollama {
    /// A client for the default local server.
    pub fn new() -> Result<Self, ClientError> {
        Self::try_from(ClientConfig::default())
    }

    pub fn get_config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The normalized server address, without the `/api` suffix.
    pub fn host(&self) -> &str {
        self.inner.executor.host()
    }

    /// Number of streams that are open and not yet finished.
    pub fn ongoing_streams(&self) -> usize {
        self.inner.registry.len()
    }

    /// Cancels every open stream of this client.
    pub fn abort(&self) {
        self.inner.registry.abort_all();
    }

    pub async fn generate(
        &self,
        mut request: GenerateRequest,
    ) -> Result<GenerateResponse, ClientError> {
        request.base.stream = Some(false);
        request.images = self.prepare_images(request.images).await?;
        self.post("/generate", &request).await
    }

    pub async fn generate_stream(
        &self,
        mut request: GenerateRequest,
    ) -> Result<AbortableStream<GenerateResponse>, ClientError> {
        request.base.stream = Some(true);
        request.images = self.prepare_images(request.images).await?;
        self.post_stream("/generate", &request).await
    }

    pub async fn chat(&self, mut request: ChatRequest) -> Result<ChatResponse, ClientError> {
        request.base.stream = Some(false);
        self.prepare_messages(&mut request.messages).await?;
        self.post("/chat", &request).await
    }

    pub async fn chat_stream(
        &self,
        mut request: ChatRequest,
    ) -> Result<AbortableStream<ChatResponse>, ClientError> {
        request.base.stream = Some(true);
        self.prepare_messages(&mut request.messages).await?;
        self.post_stream("/chat", &request).await
    }

    pub async fn pull(&self, mut request: PullRequest) -> Result<ProgressResponse, ClientError> {
        request.stream = Some(false);
        self.post("/pull", &request).await
    }

    pub async fn pull_stream(
        &self,
        mut request: PullRequest,
    ) -> Result<AbortableStream<ProgressResponse>, ClientError> {
        request.stream = Some(true);
        self.post_stream("/pull", &request).await
    }

    pub async fn push(&self, mut request: PushRequest) -> Result<ProgressResponse, ClientError> {
        request.stream = Some(false);
        self.post("/push", &request).await
    }

    pub async fn push_stream(
        &self,
        mut request: PushRequest,
    ) -> Result<AbortableStream<ProgressResponse>, ClientError> {
        request.stream = Some(true);
        self.post_stream("/push", &request).await
    }

    /// Creates a model from a model definition, uploading any local files
    /// its `FROM`/`ADAPTER` lines point at.
    pub async fn create(&self, request: CreateRequest) -> Result<ProgressResponse, ClientError> {
        let mut request = self.prepare_create(request).await?;
        request.stream = Some(false);
        self.post("/create", &request).await
    }

    pub async fn create_stream(
        &self,
        request: CreateRequest,
    ) -> Result<AbortableStream<ProgressResponse>, ClientError> {
        let mut request = self.prepare_create(request).await?;
        request.stream = Some(true);
        self.post_stream("/create", &request).await
    }

    /// Uploads `path` as a blob unless the server already has it.
    pub async fn create_blob(&self, path: impl AsRef<Path>) -> Result<String, ClientError> {
        self.blobs()?.create_blob(path.as_ref()).await
    }

    pub async fn list(&self) -> Result<ListResponse, ClientError> {
        self.inner.executor.get("/tags").await
    }

    /// Models currently loaded in memory.
    pub async fn ps(&self) -> Result<ListResponse, ClientError> {
        self.inner.executor.get("/ps").await
    }

    pub async fn show(&self, request: ShowRequest) -> Result<ShowResponse, ClientError> {
        self.post("/show", &request).await
    }

    pub async fn embed(&self, request: EmbedRequest) -> Result<EmbedResponse, ClientError> {
        self.post("/embed", &request).await
    }

    pub async fn embeddings(
        &self,
        request: EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, ClientError> {
        self.post("/embeddings", &request).await
    }

    pub async fn copy(&self, request: CopyRequest) -> Result<StatusResponse, ClientError> {
        self.inner
            .executor
            .request(Method::POST, "/copy", RequestBody::json(&request)?)
            .await?;
        Ok(StatusResponse::success())
    }

    pub async fn delete(&self, request: DeleteRequest) -> Result<StatusResponse, ClientError> {
        self.inner
            .executor
            .request(Method::DELETE, "/delete", RequestBody::json(&request)?)
            .await?;
        Ok(StatusResponse::success())
    }

    pub async fn version(&self) -> Result<VersionResponse, ClientError> {
        self.inner.executor.get("/version").await
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.inner.executor.json(Method::POST, endpoint, body).await
    }

    async fn post_stream<B, T>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<AbortableStream<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Completion,
    {
        let body = RequestBody::json(body)?;
        let registry = &self.inner.registry;

        // registered while the request is in flight, so abort() also cancels the send
        let pending = registry.register();
        let send = self.inner.executor.request(Method::POST, endpoint, body);
        let response = match Abortable::new(send, pending.registration).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                registry.remove(&pending.id);
                return Err(e);
            }
            Err(_) => {
                registry.remove(&pending.id);
                return Err(ClientError::Aborted);
            }
        };
        let Some(ticket) = registry.renew(pending.id) else {
            return Err(ClientError::Aborted);
        };

        debug!(id = %ticket.id, endpoint, "stream opened");
        Ok(AbortableStream::new(ticket, Box::pin(json_lines(response.body)), registry.clone()))
    }

    fn blobs(&self) -> Result<&BlobUploader, ClientError> {
        self.inner.blobs.as_ref().ok_or_else(|| {
            ClientError::Unsupported("Local file access is disabled for this client.".into())
        })
    }

    async fn prepare_images(
        &self,
        images: Option<Vec<ImageData>>,
    ) -> Result<Option<Vec<ImageData>>, ClientError> {
        if self.inner.blobs.is_none() {
            return Ok(images);
        }
        encode_images(images).await
    }

    async fn prepare_messages(&self, messages: &mut [Message]) -> Result<(), ClientError> {
        for message in messages.iter_mut() {
            message.images = self.prepare_images(message.images.take()).await?;
        }
        Ok(())
    }

    /// Resolves `path`/`modelfile` into the final definition text.
    async fn prepare_create(
        &self,
        mut request: CreateRequest,
    ) -> Result<CreateRequest, ClientError> {
        let modelfile = match (request.path.take(), request.modelfile.take()) {
            (Some(path), _) => {
                let blobs = self.blobs()?;
                let text = tokio::fs::read_to_string(&path).await?;
                let base_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                rewrite_modelfile(&text, &base_dir, blobs).await?
            }
            (None, Some(text)) => match &self.inner.blobs {
                Some(blobs) => rewrite_modelfile(&text, &std::env::current_dir()?, blobs).await?,
                None => text,
            },
            (None, None) => {
                return Err(ClientError::InvalidInput(
                    "Must provide either path or modelfile to create a model".into(),
                ))
            }
        };
        request.modelfile = Some(modelfile);
        Ok(request)
    }
}

impl TryFrom<ClientConfig> for Ollama {
    type Error = ClientError;

    fn try_from(cfg: ClientConfig) -> Result<Self, Self::Error> {
        let transport: Arc<dyn Transport> = match &cfg.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(ReqwestTransport::new()?),
        };
        let host = format_host(cfg.host.as_deref().unwrap_or_default());
        let executor = RequestExecutor::new(host, transport, cfg.headers()?);
        let blobs = cfg
            .local_files
            .unwrap_or(true)
            .then(|| BlobUploader::new(executor.clone()));

        Ok(Self {
            inner: Arc::new(OllamaInner {
                config: cfg,
                executor,
                blobs,
                registry: Arc::new(RequestRegistry::new()),
            }),
        })
    }
}
