use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// An image attached to a prompt or chat message.
///
/// The server only accepts base64 strings. `Bytes` are encoded on
/// serialization; `Path` is read and encoded by the client before the
/// request is sent, and falls back to the raw string when the file does
/// not exist locally.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    Base64(String),
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl ImageData {
    pub fn base64<T: Into<String>>(data: T) -> Self {
        Self::Base64(data.into())
    }

    pub fn bytes<T: Into<Vec<u8>>>(data: T) -> Self {
        Self::Bytes(data.into())
    }

    pub fn path<T: Into<PathBuf>>(path: T) -> Self {
        Self::Path(path.into())
    }

    /// The wire representation of this image.
    pub fn to_base64(&self) -> String {
        match self {
            ImageData::Base64(s) => s.clone(),
            ImageData::Bytes(b) => STANDARD.encode(b),
            ImageData::Path(p) => p.to_string_lossy().into_owned(),
        }
    }
}

impl Serialize for ImageData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ImageData::Base64)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCallFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub function: ToolCallFunction,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            thinking: None,
            images: None,
            tool_calls: None,
        }
    }

    pub fn system<T: Into<String>>(content: T) -> Self {
        Self::new(Role::System, content.into())
    }

    pub fn user<T: Into<String>>(content: T) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    pub fn tool<T: Into<String>>(content: T) -> Self {
        Self::new(Role::Tool, content.into())
    }

    pub fn with_images(mut self, images: Vec<ImageData>) -> Self {
        self.images = Some(images);
        self
    }
}

/// Fields shared by the generate and chat endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct BaseRequest {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Options>,
    /// Overwritten by the client: `false` for buffered calls, `true` for streams.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think: Option<bool>,
}

impl BaseRequest {
    pub fn new<T: Into<String>>(model: T) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Model runtime parameters, sent as the `options` object.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_batch: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_thread: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_keep: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_last_n: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_mmap: Option<bool>,
}

/// Marks the terminal element of a streamed response.
pub trait Completion {
    fn is_done(&self) -> bool;
}

impl Completion for Value {
    fn is_done(&self) -> bool {
        self.get("done").and_then(Value::as_bool).unwrap_or(false)
            || self.get("status").and_then(Value::as_str) == Some("success")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn image_bytes_serialize_as_base64() {
        let msg = Message::user("look").with_images(vec![ImageData::bytes(b"abc".to_vec())]);
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["images"][0], "YWJj");
        assert_eq!(v["role"], "user");
        assert!(v.get("tool_calls").is_none());
    }

    #[test]
    fn options_nest_under_options_key() {
        let mut base = BaseRequest::new("llama3");
        base.options = Some(Options { temperature: Some(0.5), ..Default::default() });
        let v = serde_json::to_value(&base).unwrap();
        assert_eq!(v["options"]["temperature"], 0.5);
        assert!(v.get("stream").is_none());
    }

    #[test]
    fn value_completion_rules() {
        assert!(json!({"done": true}).is_done());
        assert!(json!({"status": "success"}).is_done());
        assert!(!json!({"done": false, "status": "pulling"}).is_done());
        assert!(!json!({"response": "hi"}).is_done());
    }
}
