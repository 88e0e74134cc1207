//! OpenRouter API client for streaming chat completions.
//!
//! Requests carry the system instruction, the collected text and any inlined
//! images. The response is read as server-sent events and surfaced as a
//! stream of text deltas.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use scribe_core::OpenRouterSettings;

use crate::error::{CompletionError, Result};
use crate::request::CompletionRequest;

/// Text deltas in arrival order. Ends after the provider's `[DONE]` marker.
pub type TokenStream = BoxStream<'static, Result<String>>;

/// A model that streams a completion for a request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a completion. Errors before the first byte are returned directly;
    /// later failures arrive as an `Err` item on the stream.
    async fn stream_completion(&self, request: CompletionRequest) -> Result<TokenStream>;
}

/// OpenRouter API client for chat completions.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenRouterClient {
    /// Create a client from settings.
    pub fn new(settings: &OpenRouterSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
        }
    }

    /// Model identifier sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &CompletionRequest) -> ChatRequest {
        let user = if request.images.is_empty() {
            MessageContent::Text(request.text.clone())
        } else {
            let mut parts = vec![ContentPart::Text {
                text: request.text.clone(),
            }];
            parts.extend(request.images.iter().map(|image| ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_url(),
                },
            }));
            MessageContent::Parts(parts)
        };

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", MessageContent::Text(request.system.clone())),
                ChatMessage::new("user", user),
            ],
            stream: true,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn stream_completion(&self, request: CompletionRequest) -> Result<TokenStream> {
        let body = self.build_request(&request);
        debug!(
            model = %self.model,
            text_chars = request.text.chars().count(),
            images = request.images.len(),
            "Starting completion stream"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "Issue Scribe")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(CompletionError::from))
            .boxed();

        Ok(sse_tokens(bytes))
    }
}

struct SseState {
    body: BoxStream<'static, Result<Vec<u8>>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

/// Turn a raw event-stream body into text deltas.
pub(crate) fn sse_tokens(body: BoxStream<'static, Result<Vec<u8>>>) -> TokenStream {
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            if let Some(pos) = state.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                state.consume_line(&line);
                continue;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    state.pending.push_back(Err(CompletionError::Stream(e.to_string())));
                }
                None => {
                    let trailing = std::mem::take(&mut state.buffer);
                    state.consume_line(&trailing);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

impl SseState {
    fn consume_line(&mut self, raw: &[u8]) {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                self.pending.push_back(Err(CompletionError::Stream(format!(
                    "invalid UTF-8 in stream: {}",
                    e
                ))));
                return;
            }
        };

        // Blank separators, `event:` lines and `:` keep-alive comments carry no data
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.trim();
        if data == "[DONE]" {
            trace!("Completion stream finished");
            self.finished = true;
            return;
        }

        match parse_chunk(data) {
            Ok(deltas) => self.pending.extend(deltas.into_iter().map(Ok)),
            Err(e) => {
                warn!(error = %e, "Completion stream chunk rejected");
                self.pending.push_back(Err(e));
            }
        }
    }
}

fn parse_chunk(data: &str) -> Result<Vec<String>> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| CompletionError::Stream(format!("failed to parse stream chunk: {}", e)))?;

    if let Some(error) = chunk.error {
        return Err(CompletionError::Stream(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.and_then(|d| d.content))
        .filter(|text| !text.is_empty())
        .collect())
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// A message in the chat conversation.
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

impl ChatMessage {
    fn new(role: &str, content: MessageContent) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::InlineImage;

    fn client() -> OpenRouterClient {
        OpenRouterClient::new(&OpenRouterSettings {
            api_key: "sk-test".into(),
            api_url: "http://localhost/chat".into(),
            model: "test/model".into(),
        })
    }

    fn body_of(chunks: &[&str]) -> BoxStream<'static, Result<Vec<u8>>> {
        let chunks: Vec<Result<Vec<u8>>> =
            chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        stream::iter(chunks).boxed()
    }

    async fn collect(tokens: TokenStream) -> Vec<Result<String>> {
        tokens.collect().await
    }

    #[test]
    fn test_text_only_request() {
        let request = CompletionRequest {
            system: "sys".into(),
            text: "hello".into(),
            images: vec![],
        };
        let json = serde_json::to_value(client().build_request(&request)).unwrap();
        assert_eq!(json["model"], "test/model");
        assert_eq!(json["stream"], true);
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_request_with_images() {
        let request = CompletionRequest {
            system: "sys".into(),
            text: "see screenshot".into(),
            images: vec![InlineImage {
                mime_type: "image/png".into(),
                data: "QUJD".into(),
            }],
        };
        let json = serde_json::to_value(client().build_request(&request)).unwrap();
        let parts = &json["messages"][1]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "see screenshot");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,QUJD");
    }

    #[tokio::test]
    async fn test_sse_split_across_chunks() {
        let body = body_of(&[
            ": OPENROUTER PROCESSING\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"{\\\"iss\"}}]}\n",
            "\ndata: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"ues\\\"\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ]);

        let tokens: Vec<String> = collect(sse_tokens(body))
            .await
            .into_iter()
            .map(|t| t.unwrap())
            .collect();
        assert_eq!(tokens, vec!["{\"iss".to_string(), "ues\"".to_string()]);
    }

    #[tokio::test]
    async fn test_sse_trailing_line_without_newline() {
        let body = body_of(&["data: {\"choices\":[{\"delta\":{\"content\":\"end\"}}]}"]);
        let tokens = collect(sse_tokens(body)).await;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].as_ref().unwrap(), "end");
    }

    #[tokio::test]
    async fn test_sse_error_ends_stream() {
        let body = body_of(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: {\"error\":{\"message\":\"provider overloaded\"}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
        ]);
        let tokens = collect(sse_tokens(body)).await;
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].as_ref().unwrap(), "a");
        match &tokens[1] {
            Err(CompletionError::Stream(msg)) => assert_eq!(msg, "provider overloaded"),
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sse_transport_error_surfaces() {
        let chunks: Vec<Result<Vec<u8>>> = vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n".to_vec()),
            Err(CompletionError::Http("connection reset".into())),
        ];
        let tokens = collect(sse_tokens(stream::iter(chunks).boxed())).await;
        assert_eq!(tokens.len(), 2);
        assert!(matches!(tokens[1], Err(CompletionError::Stream(_))));
    }
}
