pub mod abortable;
pub mod json_lines;

pub use abortable::{AbortableStream, StreamState, ValueStream};
pub use json_lines::json_lines;
