//! In-memory transport doubles shared by unit tests

use super::{ChatCompletionRequest, CompletionTransport};
use color_eyre::Result;
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read};
use std::sync::Mutex;

/// Hands out one scripted chunk per `read` call
pub(crate) struct ChunkedReader {
    chunks: VecDeque<Vec<u8>>,
    fail_at_end: bool,
}

impl ChunkedReader {
    pub(crate) fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            fail_at_end: false,
        }
    }

    /// Like [`ChunkedReader::new`], but the read after the last chunk fails
    pub(crate) fn failing_after<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            fail_at_end: true,
            ..Self::new(chunks)
        }
    }
}

impl Read for ChunkedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            if self.fail_at_end {
                return Err(io::Error::new(
                    ErrorKind::ConnectionReset,
                    "connection reset",
                ));
            }
            return Ok(0);
        };
        let len = chunk.len().min(buf.len());
        buf[..len].copy_from_slice(&chunk[..len]);
        if len < chunk.len() {
            self.chunks.push_front(chunk.split_off(len));
        }
        Ok(len)
    }
}

/// How a [`ScriptedTransport`] answers a completion request
#[derive(Debug, Clone)]
pub(crate) enum StreamScript {
    Body(Vec<String>),
    BrokenAfter(Vec<String>),
    Refused(String),
}

/// Transport that replays canned answers and records every request
pub(crate) struct ScriptedTransport {
    models: std::result::Result<Vec<String>, String>,
    script: StreamScript,
    pub(crate) requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: StreamScript) -> Self {
        Self {
            models: Ok(Vec::new()),
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Streams `data:` records carrying each fragment, then `[DONE]`
    pub(crate) fn replying(fragments: &[&str]) -> Self {
        let mut chunks: Vec<String> = fragments
            .iter()
            .map(|fragment| {
                format!(
                    "data: {}\n\n",
                    serde_json::json!({"choices": [{"delta": {"content": fragment}}]})
                )
            })
            .collect();
        chunks.push("data: [DONE]\n\n".to_string());
        Self::new(StreamScript::Body(chunks))
    }

    pub(crate) fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Ok(models.iter().map(|model| (*model).to_string()).collect());
        self
    }

    pub(crate) fn with_model_error(mut self, message: &str) -> Self {
        self.models = Err(message.to_string());
        self
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl CompletionTransport for ScriptedTransport {
    fn list_models(&self, _base_url: &str) -> Result<Vec<String>> {
        self.models
            .clone()
            .map_err(|message| color_eyre::eyre::eyre!(message))
    }

    fn open_stream(
        &self,
        _base_url: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Box<dyn Read + Send>> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.script {
            StreamScript::Body(chunks) => Ok(Box::new(ChunkedReader::new(chunks.clone()))),
            StreamScript::BrokenAfter(chunks) => {
                Ok(Box::new(ChunkedReader::failing_after(chunks.clone())))
            }
            StreamScript::Refused(message) => Err(color_eyre::eyre::eyre!(message.clone())),
        }
    }
}
