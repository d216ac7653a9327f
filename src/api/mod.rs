pub mod models;
#[path = "openai-compat.rs"]
pub mod openai_compat;
pub mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use models::ModelDirectory;
pub use openai_compat::{ChatCompletionRequest, build_request};
pub use stream::StreamEvent;

use color_eyre::Result;
use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MODELS_TIMEOUT: Duration = Duration::from_secs(10);

/// Network seam between the chat session and the inference server
pub trait CompletionTransport: Send + Sync {
    /// Lists model identifiers from `GET {base_url}/v1/models`
    fn list_models(&self, base_url: &str) -> Result<Vec<String>>;

    /// Posts a streaming chat request and hands back the raw response body
    fn open_stream(
        &self,
        base_url: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Box<dyn Read + Send>>;
}

/// [`CompletionTransport`] over blocking reqwest
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Only connecting is bounded; a reply may stream for as long as the model runs
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?,
        })
    }
}

impl CompletionTransport for HttpTransport {
    fn list_models(&self, base_url: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{base_url}/v1/models"))
            .timeout(MODELS_TIMEOUT)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(color_eyre::eyre::eyre!("HTTP {}", status.as_u16()));
        }

        let list: openai_compat::ModelList = response.json()?;
        Ok(list.into_ids())
    }

    fn open_stream(
        &self,
        base_url: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Box<dyn Read + Send>> {
        let response = self
            .client
            .post(format!("{base_url}/v1/chat/completions"))
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(color_eyre::eyre::eyre!("HTTP {}", status.as_u16()));
        }
        tracing::debug!(%status, "completion stream opened");
        Ok(Box::new(response))
    }
}

/// Opens a completion stream and decodes it to the end
pub fn stream_completion(
    transport: &dyn CompletionTransport,
    base_url: &str,
    request: &ChatCompletionRequest,
    on_event: impl FnMut(StreamEvent),
) -> Result<String> {
    let body = transport.open_stream(base_url, request)?;
    stream::consume_stream(body, on_event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serves one canned HTTP response and reports the request it received
    fn serve_once(status_line: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/event-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                head.push_str(&line);
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();
            head.push_str(&String::from_utf8_lossy(&request_body));
            tx.send(head).unwrap();

            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        });

        (base_url, rx)
    }

    #[test]
    fn streams_completion_from_http_server() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
            "data: [DONE]\n\n"
        );
        let (base_url, requests) = serve_once("200 OK", body);
        let transport = HttpTransport::new().unwrap();
        let request = build_request("Hello", &[], Some("local-model"));

        let mut deltas = Vec::new();
        let text = stream_completion(&transport, &base_url, &request, |event| {
            deltas.push(event);
        })
        .unwrap();

        assert_eq!(text, "Hi there");
        assert_eq!(deltas.len(), 2);

        let received = requests.recv().unwrap();
        assert!(received.starts_with("POST /v1/chat/completions "));
        assert!(received.contains("\"stream\":true"));
        assert!(received.contains("\"model\":\"local-model\""));
    }

    #[test]
    fn non_success_status_is_an_error() {
        let (base_url, _requests) = serve_once("500 Internal Server Error", "boom");
        let transport = HttpTransport::new().unwrap();
        let request = build_request("Hello", &[], None);

        let error = stream_completion(&transport, &base_url, &request, |_| {}).unwrap_err();
        assert_eq!(error.to_string(), "HTTP 500");
    }

    #[test]
    fn lists_models_from_http_server() {
        let body = r#"{"object":"list","data":[{"id":"qwen2.5-7b"},{"name":"phi-3"}]}"#;
        let (base_url, requests) = serve_once("200 OK", body);
        let transport = HttpTransport::new().unwrap();

        let models = transport.list_models(&base_url).unwrap();

        assert_eq!(models, vec!["qwen2.5-7b", "phi-3"]);
        assert!(requests.recv().unwrap().starts_with("GET /v1/models "));
    }

    #[test]
    fn unreachable_server_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let transport = HttpTransport::new().unwrap();
        assert!(transport.list_models(&base_url).is_err());
    }
}
