//! Streaming client for OpenAI-compatible chat-completions APIs
//!
//! Sends one POST per completion with `stream: true` and converts the
//! server-sent-event response into a [`CompletionStream`]. The API key is
//! taken per call and never stored on the client.

use crate::errors::AssistantError;
use crate::errors::Result;
use crate::stream::CompletionEvent;
use crate::stream::CompletionStream;
use async_trait::async_trait;
use futures::Stream;
use futures::StreamExt;
use projtrack_core::config::AssistantConfig;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;

/// One message in a chat-completions request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Backend seam for completion requests.
///
/// The production implementation is [`ChatCompletionsClient`]; tests
/// substitute implementations that replay canned streams.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a streaming completion.
    ///
    /// The returned stream yields text deltas in order, then a terminal
    /// [`CompletionEvent::Done`]. Dropping the stream cancels the request.
    async fn complete(
        &self,
        api_key: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionStream>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    config: AssistantConfig,
}

impl ChatCompletionsClient {
    pub fn new() -> Self {
        Self::with_config(AssistantConfig::default())
    }

    pub fn with_config(config: AssistantConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "stream": true,
            "messages": messages,
        })
    }
}

impl Default for ChatCompletionsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(
        &self,
        api_key: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionStream> {
        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            "starting completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.build_request_body(&messages))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) if body.is_empty() => format!("HTTP {status}"),
                Err(_) => body,
            };
            return Err(AssistantError::Upstream { status, message });
        }

        let (tx, rx) = mpsc::channel(100);
        tokio::spawn(process_stream(response.bytes_stream(), tx));

        Ok(CompletionStream::new(rx))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Read the byte stream, reassemble SSE events, and forward completion
/// events over the channel.
///
/// Returns as soon as the terminal marker is forwarded, an error is
/// forwarded, or the receiver is dropped (caller cancelled). If the byte
/// stream ends before the terminal marker arrives the caller gets an
/// explicit stream error rather than a silent truncation.
async fn process_stream(
    stream: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
    tx: mpsc::Sender<Result<CompletionEvent>>,
) {
    let mut stream = stream;
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(Err(AssistantError::Network(e))).await;
                return;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&bytes));

        while let Some(event_text) = extract_sse_event(&mut buffer) {
            match parse_sse_event(&event_text) {
                Ok(Some(CompletionEvent::Done)) => {
                    let _ = tx.send(Ok(CompletionEvent::Done)).await;
                    return;
                }
                Ok(Some(event)) => {
                    if tx.send(Ok(event)).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
    }

    tracing::warn!("completion stream ended without a [DONE] marker");
    let _ = tx
        .send(Err(AssistantError::Stream(
            "response ended without a completion marker".to_string(),
        )))
        .await;
}

/// Pull the next complete SSE event off the front of `buffer`.
///
/// Events are separated by a blank line. Returns `None` until a full
/// event is buffered; consumed bytes are drained from the buffer.
fn extract_sse_event(buffer: &mut String) -> Option<String> {
    let pos = buffer.find("\n\n")?;
    let event = buffer[..pos].to_string();
    buffer.drain(..pos + 2);
    Some(event)
}

/// Parse one SSE event into a completion event.
///
/// Chat-completions streams carry JSON chunks on `data:` lines and mark
/// the end with a literal `data: [DONE]`. Events without a data line
/// (comments, keepalives) and chunks without text content yield `None`.
fn parse_sse_event(event_text: &str) -> Result<Option<CompletionEvent>> {
    let mut data = None;
    for line in event_text.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data = Some(rest.trim());
        }
    }

    let Some(payload) = data else {
        return Ok(None);
    };

    if payload == "[DONE]" {
        return Ok(Some(CompletionEvent::Done));
    }

    let chunk: ChatChunk = serde_json::from_str(payload)
        .map_err(|e| AssistantError::Parse(format!("bad completion chunk: {e}")))?;

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(CompletionEvent::Delta(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn delta_event(text: &str) -> String {
        let chunk = json!({"choices": [{"delta": {"content": text}}]});
        format!("data: {chunk}")
    }

    #[test]
    fn extract_waits_for_a_complete_event() {
        let mut buffer = "data: partial".to_string();
        assert_eq!(extract_sse_event(&mut buffer), None);
        assert_eq!(buffer, "data: partial");

        buffer.push_str("\n\ndata: next");
        assert_eq!(extract_sse_event(&mut buffer), Some("data: partial".to_string()));
        assert_eq!(buffer, "data: next");
    }

    #[test]
    fn extract_splits_consecutive_events() {
        let mut buffer = "data: one\n\ndata: two\n\n".to_string();
        assert_eq!(extract_sse_event(&mut buffer), Some("data: one".to_string()));
        assert_eq!(extract_sse_event(&mut buffer), Some("data: two".to_string()));
        assert_eq!(extract_sse_event(&mut buffer), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn parse_reads_a_text_delta() {
        let event = parse_sse_event(&delta_event("Hello")).unwrap();
        assert_eq!(event, Some(CompletionEvent::Delta("Hello".to_string())));
    }

    #[test]
    fn parse_recognizes_the_done_marker() {
        let event = parse_sse_event("data: [DONE]").unwrap();
        assert_eq!(event, Some(CompletionEvent::Done));
    }

    #[test]
    fn parse_skips_role_only_chunks() {
        let event = parse_sse_event(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#);
        assert_eq!(event.unwrap(), None);
    }

    #[test]
    fn parse_skips_keepalive_comments() {
        assert_eq!(parse_sse_event(": keep-alive").unwrap(), None);
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = parse_sse_event("data: {not json").unwrap_err();
        assert!(matches!(err, AssistantError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn request_body_asks_for_a_stream() {
        let client = ChatCompletionsClient::with_config(AssistantConfig {
            base_url: "http://localhost:9000/v1".to_string(),
            model: "test-model".to_string(),
            temperature: 0.2,
        });
        let messages = vec![ChatMessage::system("be helpful"), ChatMessage::user("hello")];

        let body = client.build_request_body(&messages);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn endpoint_tolerates_a_trailing_slash() {
        let client = ChatCompletionsClient::with_config(AssistantConfig {
            base_url: "http://localhost:9000/v1/".to_string(),
            ..AssistantConfig::default()
        });
        assert_eq!(client.endpoint(), "http://localhost:9000/v1/chat/completions");
    }

    #[tokio::test]
    async fn process_stream_reassembles_events_across_chunks() {
        let first = format!("{}\n\ndata: [D", delta_event("Hi"));
        let chunks: Vec<reqwest::Result<bytes::Bytes>> = vec![
            Ok(bytes::Bytes::from(first)),
            Ok(bytes::Bytes::from("ONE]\n\n")),
        ];
        let (tx, mut rx) = mpsc::channel(8);

        process_stream(futures::stream::iter(chunks), tx).await;

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first, CompletionEvent::Delta("Hi".to_string()));
        let second = rx.recv().await.unwrap().unwrap();
        assert_eq!(second, CompletionEvent::Done);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn process_stream_flags_truncated_responses() {
        let chunks: Vec<reqwest::Result<bytes::Bytes>> =
            vec![Ok(bytes::Bytes::from(format!("{}\n\n", delta_event("cut "))))];
        let (tx, mut rx) = mpsc::channel(8);

        process_stream(futures::stream::iter(chunks), tx).await;

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first, CompletionEvent::Delta("cut ".to_string()));
        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(matches!(err, AssistantError::Stream(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn process_stream_stops_after_the_done_marker() {
        let payload = format!("data: [DONE]\n\n{}\n\n", delta_event("late"));
        let chunks: Vec<reqwest::Result<bytes::Bytes>> = vec![Ok(bytes::Bytes::from(payload))];
        let (tx, mut rx) = mpsc::channel(8);

        process_stream(futures::stream::iter(chunks), tx).await;

        assert_eq!(rx.recv().await.unwrap().unwrap(), CompletionEvent::Done);
        assert!(rx.recv().await.is_none());
    }
}
