use std::{collections::HashMap, sync::Arc};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};

use crate::services::{
    ollama::{client::Ollama, models::errors::ClientError},
    transport::{default_headers, Transport},
};

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Server address, normalized with [`crate::format_host`]. Defaults to
    /// `http://127.0.0.1:11434`.
    pub host: Option<String>,
    /// Sent as `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    /// Extra HTTP headers appended to every request
    pub extra_headers: Option<HashMap<String, String>>,
    /// Request function to use instead of the built-in `reqwest` one.
    pub transport: Option<Arc<dyn Transport>>,
    /// Whether the client may read local files (blob uploads, model
    /// definitions and images given as paths). Defaults to `true`.
    pub local_files: Option<bool>,
}

impl ClientConfig {
    /// Reads `OLLAMA_HOST` and `OLLAMA_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("OLLAMA_HOST").ok(),
            api_key: std::env::var("OLLAMA_API_KEY").ok().filter(|k| !k.is_empty()),
            ..Default::default()
        }
    }

    /// Default headers overlaid with `extra_headers` and the bearer token.
    pub(crate) fn headers(&self) -> Result<HeaderMap, ClientError> {
        let mut headers = default_headers();
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| ClientError::Config(format!("Invalid api key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(extra) = &self.extra_headers {
            for (name, value) in extra {
                let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    ClientError::Config(format!("Invalid header name {name:?}: {e}"))
                })?;
                let value = HeaderValue::from_str(value).map_err(|e| {
                    ClientError::Config(format!("Invalid header value for {name}: {e}"))
                })?;
                headers.insert(name, value);
            }
        }
        Ok(headers)
    }
}

pub trait ClientBuilder {
    fn host(self, host: impl Into<String>) -> Self;
    fn api_key(self, api_key: impl Into<String>) -> Self;
    fn extra_headers(self, extra_headers: HashMap<String, String>) -> Self;
    fn transport(self, transport: Arc<dyn Transport>) -> Self;
    fn local_files(self, enabled: bool) -> Self;
    fn build(self) -> Result<Ollama, ClientError>;
}

impl ClientBuilder for ClientConfig {
    fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn extra_headers(mut self, extra_headers: HashMap<String, String>) -> Self {
        self.extra_headers = Some(extra_headers);
        self
    }

    fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    fn local_files(mut self, enabled: bool) -> Self {
        self.local_files = Some(enabled);
        self
    }

    fn build(self) -> Result<Ollama, ClientError> {
        Ollama::try_from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::CONTENT_TYPE;

    #[test]
    fn bearer_and_extra_headers() {
        let mut extra = HashMap::new();
        extra.insert("X-Trace".to_string(), "abc".to_string());
        extra.insert("Content-Type".to_string(), "application/x-ndjson".to_string());
        let headers = ClientConfig::default().api_key("k").extra_headers(extra).headers().unwrap();

        assert_eq!(headers[AUTHORIZATION], "Bearer k");
        assert_eq!(headers["x-trace"], "abc");
        assert_eq!(headers[CONTENT_TYPE], "application/x-ndjson");
    }

    #[test]
    fn invalid_header_is_a_config_error() {
        let mut extra = HashMap::new();
        extra.insert("bad header".to_string(), "v".to_string());
        let err = ClientConfig::default().extra_headers(extra).headers().unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }
}
