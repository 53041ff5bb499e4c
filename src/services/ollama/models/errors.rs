/// Errors produced by the Ollama client, its transport and its streams.
#[derive(Debug)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    Response { status: u16, message: String },
    /// The request could not be sent or the body could not be read.
    Request(String),
    /// The server reported an error inside a streamed response.
    Stream(String),
    /// The byte stream ended before any item carried a completion signal.
    IncompleteStream,
    /// The stream was cancelled through its abort handle.
    Aborted,
    /// A body could not be encoded or decoded.
    Serialization(String),
    /// The client could not be constructed.
    Config(String),
    /// The operation needs a capability the current environment lacks.
    Unsupported(String),
    /// The caller supplied an unusable request.
    InvalidInput(String),
    /// Local file access failed.
    Io(std::io::Error),
}

impl ClientError {
    /// HTTP status code for [`ClientError::Response`], `None` otherwise.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Response { status, message } => {
                write!(f, "Response Error ({status}): {message}")
            }
            ClientError::Request(s) => write!(f, "Request Error: {s}"),
            ClientError::Stream(s) => write!(f, "Stream Error: {s}"),
            ClientError::IncompleteStream => {
                write!(f, "Did not receive done or success response in stream.")
            }
            ClientError::Aborted => write!(f, "Stream aborted"),
            ClientError::Serialization(s) => write!(f, "Serialization Error: {s}"),
            ClientError::Config(s) => write!(f, "Config Error: {s}"),
            ClientError::Unsupported(s) => write!(f, "Unsupported: {s}"),
            ClientError::InvalidInput(s) => write!(f, "Invalid Input: {s}"),
            ClientError::Io(e) => write!(f, "IO Error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}
