pub mod client;
pub mod client_config;
pub mod executor;
pub mod models;
pub mod registry;

pub use client::Ollama;
pub use client_config::{ClientBuilder, ClientConfig};
pub use executor::RequestExecutor;
pub use registry::RequestRegistry;
