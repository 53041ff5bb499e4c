use std::{collections::HashMap, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::base::{Completion, Message};

/// Request for `/api/pull`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct PullRequest {
    #[serde(rename = "name")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl PullRequest {
    pub fn new<T: Into<String>>(model: T) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Request for `/api/push`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct PushRequest {
    #[serde(rename = "name")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl PushRequest {
    pub fn new<T: Into<String>>(model: T) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Request for `/api/create`.
///
/// Exactly one of `path` (a model definition file on the local disk) or
/// `modelfile` (inline text) must be given. `path` is never sent; the client
/// reads and rewrites the file into `modelfile`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct CreateRequest {
    #[serde(rename = "name")]
    pub model: String,
    #[serde(skip_serializing)]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modelfile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl CreateRequest {
    pub fn from_modelfile<M: Into<String>, T: Into<String>>(model: M, modelfile: T) -> Self {
        Self {
            model: model.into(),
            modelfile: Some(modelfile.into()),
            ..Default::default()
        }
    }

    pub fn from_path<M: Into<String>, P: Into<PathBuf>>(model: M, path: P) -> Self {
        Self {
            model: model.into(),
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

/// Progress line shared by pull, push and create.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ProgressResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
}

impl Completion for ProgressResponse {
    fn is_done(&self) -> bool {
        self.status == "success"
    }
}

/// Request for `/api/show`.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ShowRequest {
    #[serde(rename = "name")]
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl ShowRequest {
    pub fn new<T: Into<String>>(model: T) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ModelDetails {
    #[serde(default)]
    pub parent_model: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub families: Option<Vec<String>>,
    #[serde(default)]
    pub parameter_size: String,
    #[serde(default)]
    pub quantization_level: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ShowResponse {
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub modelfile: String,
    #[serde(default)]
    pub parameters: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub system: String,
    #[serde(default)]
    pub details: ModelDetails,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub model_info: HashMap<String, Value>,
    #[serde(default)]
    pub projector_info: HashMap<String, Value>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub modified_at: String,
}

/// An entry of `/api/tags` or `/api/ps`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModelResponse {
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub details: ModelDetails,
    /// Only reported by `/api/ps`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Only reported by `/api/ps`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_vram: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ListResponse {
    pub models: Vec<ModelResponse>,
}

#[derive(Serialize, Debug, Clone)]
pub struct CopyRequest {
    pub source: String,
    pub destination: String,
}

impl CopyRequest {
    pub fn new<S: Into<String>, D: Into<String>>(source: S, destination: D) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct DeleteRequest {
    #[serde(rename = "name")]
    pub model: String,
}

impl DeleteRequest {
    pub fn new<T: Into<String>>(model: T) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// Returned by endpoints that answer with an empty 2xx body.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: "success".into() }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VersionResponse {
    pub version: String,
}
