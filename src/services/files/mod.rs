//! Capabilities that need the local filesystem: blob uploads, model
//! definition rewriting and image encoding.

pub mod blob;
pub mod images;
pub mod modelfile;

pub use blob::{digest_file, BlobUploader};
pub use images::{encode_image, encode_images};
pub use modelfile::{resolve_path, rewrite_modelfile};
