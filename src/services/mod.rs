pub mod files;
pub mod ollama;
pub mod streaming;
pub mod transport;
