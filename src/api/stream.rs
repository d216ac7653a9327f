//! Incremental decoder for `data:`-prefixed, newline-delimited completion streams

use color_eyre::Result;
use serde::Deserialize;
use std::io::{ErrorKind, Read};

const DONE_MARKER: &str = "[DONE]";
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Something the user should see while a reply streams in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// New assistant text: the fragment just received and the text so far
    Delta { fragment: String, text: String },
    /// An error record embedded in an otherwise healthy stream
    ServerError { message: String },
}

/// The two record shapes a server sends; anything else is ignored
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error { error: ServerError },
    Chunk { choices: Vec<Choice> },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ServerError {
    Detailed {
        #[serde(default)]
        message: Option<String>,
    },
    Plain(String),
}

impl ServerError {
    fn into_message(self) -> String {
        let message = match self {
            ServerError::Detailed { message } => message,
            ServerError::Plain(message) => Some(message),
        };
        message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// An `error` field that is null, false or an empty string does not mark an error record
fn drop_blank_error(value: &mut serde_json::Value) {
    let Some(record) = value.as_object_mut() else {
        return;
    };
    let blank = match record.get("error") {
        Some(serde_json::Value::Null | serde_json::Value::Bool(false)) => true,
        Some(serde_json::Value::String(text)) => text.is_empty(),
        _ => false,
    };
    if blank {
        record.remove("error");
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// Buffers partial lines across reads and accumulates assistant text
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    text: String,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk of the body; only newline-terminated lines are decoded
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Text accumulated so far
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ends the stream; an unterminated trailing line is dropped
    pub fn finish(self) -> String {
        if !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding unterminated line at end of stream"
            );
        }
        self.text
    }

    fn decode_line(&mut self, line: &str) -> Option<StreamEvent> {
        let payload = line.trim().strip_prefix("data:")?.trim();
        if payload.is_empty() || payload == DONE_MARKER {
            return None;
        }
        if !payload.starts_with('{') {
            tracing::warn!(payload, "skipping non-JSON stream line");
            return None;
        }

        let mut value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, payload, "failed to parse stream line as JSON");
                return None;
            }
        };

        drop_blank_error(&mut value);
        match serde_json::from_value::<StreamPayload>(value) {
            Ok(StreamPayload::Error { error }) => {
                let message = error.into_message();
                tracing::error!(error_message = %message, "server reported an error mid-stream");
                Some(StreamEvent::ServerError { message })
            }
            Ok(StreamPayload::Chunk { choices }) => {
                let fragment = choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta)
                    .and_then(|delta| delta.content)
                    .filter(|content| !content.is_empty())?;
                self.text.push_str(&fragment);
                Some(StreamEvent::Delta {
                    fragment,
                    text: self.text.clone(),
                })
            }
            Err(_) => {
                tracing::debug!(payload, "ignoring stream record of unknown shape");
                None
            }
        }
    }
}

/// Reads a response body to the end, reporting events as they decode
///
/// Returns the full assistant text. Read errors abort with the text discarded.
pub fn consume_stream(
    mut reader: impl Read,
    mut on_event: impl FnMut(StreamEvent),
) -> Result<String> {
    let mut decoder = StreamDecoder::new();
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => return Err(error.into()),
        };
        let received = chunk.get(..read).unwrap_or_default();
        for event in decoder.feed(received) {
            on_event(event);
        }
    }
    Ok(decoder.finish())
}
