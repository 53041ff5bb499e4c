//! Async client for the Ollama HTTP API.
//!
//! Streaming endpoints return an [`AbortableStream`] of typed parts decoded
//! from the server's newline-delimited JSON; [`Ollama::abort`] cancels every
//! stream still open on a client. Model creation uploads local weights as
//! content-addressed blobs and rewrites the definition to point at them.

pub(crate) mod services;
mod observability;

pub use observability::init_default_tracing;

pub use services::files::{
    digest_file, encode_image, encode_images, resolve_path, rewrite_modelfile, BlobUploader,
};
pub use services::ollama::models::{self, *};
pub use services::ollama::{ClientBuilder, ClientConfig, Ollama, RequestExecutor, RequestRegistry};
pub use services::streaming::{json_lines, AbortableStream, StreamState, ValueStream};
pub use services::transport::{
    check_ok, default_headers, format_host, user_agent, ByteStream, HttpRequest, HttpResponse,
    ReqwestTransport, RequestBody, Transport, DEFAULT_HOST, DEFAULT_PORT,
};
