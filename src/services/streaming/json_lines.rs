use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::warn;

use crate::services::{ollama::models::errors::ClientError, transport::ByteStream};

/// Decodes a newline-delimited JSON body into one value per line.
///
/// Bytes are buffered until a `\n` arrives, so lines and multi-byte
/// characters may be split across chunks freely. Lines that are not valid
/// JSON are logged and skipped; a transport error ends the stream.
pub fn json_lines(
    body: ByteStream,
) -> impl Stream<Item = Result<Value, ClientError>> + Send + 'static {
    try_stream! {
        let mut body = body;
        let mut buf = Vec::<u8>::new();
        // bytes of `buf` already known to hold no newline
        let mut scanned = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            buf.extend_from_slice(&chunk);

            let mut start = 0;
            while let Some(offset) = buf[scanned..].iter().position(|&b| b == b'\n') {
                let end = scanned + offset;
                let value = parse_line(&buf[start..end]);
                start = end + 1;
                scanned = start;
                if let Some(value) = value {
                    yield value;
                }
            }
            buf.drain(..start);
            scanned = buf.len();
        }

        let rest = std::mem::take(&mut buf);
        for line in rest.split(|&b| b == b'\n') {
            if let Some(value) = parse_line(line) {
                yield value;
            }
        }
    }
}

fn parse_line(line: &[u8]) -> Option<Value> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, line = %text, "skipping malformed JSON line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::{stream, TryStreamExt};
    use serde_json::json;

    fn body(chunks: Vec<Vec<u8>>) -> ByteStream {
        let chunks: Vec<Result<Bytes, ClientError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        Box::pin(stream::iter(chunks))
    }

    async fn decode_bytes(chunks: Vec<Vec<u8>>) -> Vec<Value> {
        json_lines(body(chunks)).try_collect().await.unwrap()
    }

    async fn decode(chunks: &[&str]) -> Vec<Value> {
        decode_bytes(chunks.iter().map(|c| c.as_bytes().to_vec()).collect()).await
    }

    #[tokio::test]
    async fn one_value_per_line() {
        let values = decode(&["{\"a\":1}\n{\"a\":2}\n"]).await;
        assert_eq!(values, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[tokio::test]
    async fn lines_split_across_chunks() {
        let values = decode(&["{\"res", "ponse\":\"hel", "lo\"}\n{\"do", "ne\":true}\n"]).await;
        assert_eq!(values, vec![json!({"response": "hello"}), json!({"done": true})]);
    }

    #[tokio::test]
    async fn multibyte_character_split_across_chunks() {
        let text = "{\"response\":\"caf\u{e9} \u{1f980}\"}\n".as_bytes();
        // split inside both the two-byte and the four-byte sequence
        let e_acute = text.iter().position(|&b| b == 0xc3).unwrap();
        let crab = text.iter().position(|&b| b == 0xf0).unwrap();
        let values = decode_bytes(vec![
            text[..e_acute + 1].to_vec(),
            text[e_acute + 1..crab + 2].to_vec(),
            text[crab + 2..].to_vec(),
        ])
        .await;
        assert_eq!(values, vec![json!({"response": "caf\u{e9} \u{1f980}"})]);
    }

    #[tokio::test]
    async fn long_line_in_single_byte_chunks() {
        let long = "x".repeat(20_000);
        let text = format!("{{\"a\":\"{long}\"}}\n{{\"a\":1}}\n{{\"a\":2}}");
        let values = decode_bytes(text.bytes().map(|b| vec![b]).collect()).await;
        assert_eq!(values, vec![json!({"a": long}), json!({"a": 1}), json!({"a": 2})]);
    }

    #[tokio::test]
    async fn several_lines_and_a_partial_one_per_chunk() {
        let values = decode(&["{\"a\":1}\n{\"a\":2}\n{\"a\"", ":3}\n{", "\"a\":4}\n"]).await;
        assert_eq!(
            values,
            vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3}), json!({"a": 4})]
        );
    }

    #[tokio::test]
    async fn malformed_lines_are_skipped() {
        let values = decode(&["{\"a\":1}\nnot json\n{\"a\":", "2}\n{broken\n{\"a\":3}\n"]).await;
        assert_eq!(values, vec![json!({"a": 1}), json!({"a": 2}), json!({"a": 3})]);
    }

    #[tokio::test]
    async fn trailing_line_without_newline_is_decoded() {
        let values = decode(&["{\"a\":1}\n{\"a\":2}"]).await;
        assert_eq!(values, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[tokio::test]
    async fn blank_lines_and_crlf_are_tolerated() {
        let values = decode(&["\n{\"a\":1}\r\n\r\n{\"a\":2}\r\n"]).await;
        assert_eq!(values, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let chunks: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from_static(b"{\"a\":1}\n")),
            Err(ClientError::Request("connection reset".into())),
            Ok(Bytes::from_static(b"{\"a\":2}\n")),
        ];
        let results: Vec<_> = json_lines(Box::pin(stream::iter(chunks))).collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &json!({"a": 1}));
        assert!(matches!(results[1], Err(ClientError::Request(_))));
    }
}
