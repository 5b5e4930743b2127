//! Anthropic Messages API backend
//!
//! Requests go out with `stream: true`; the server-sent events come back
//! through [`SseDecoder`], which turns each complete event into zero or more
//! [`StreamDelta`]s for [`collect_response`](crate::provider::collect_response).

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::types::{LlmMessage, LlmRequest, LlmTool, StreamDelta, Usage};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const FALLBACK_MAX_TOKENS: u32 = 4096;
const DEFAULT_RETRY_MS: u64 = 60_000;

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: MESSAGES_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Request body. Messages and tools already serialize in the wire shape.
#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    messages: &'a [LlmMessage],
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [LlmTool]>,
}

impl<'a> From<&'a LlmRequest> for MessagesBody<'a> {
    fn from(request: &'a LlmRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens.unwrap_or(FALLBACK_MAX_TOKENS),
            stream: true,
            temperature: request.temperature,
            system: request.system.as_deref(),
            tools: request.tools.as_deref().filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        let body = MessagesBody::from(&request);
        debug!(
            "Messages request: model={}, turns={}, tools={}",
            body.model,
            body.messages.len(),
            body.tools.map_or(0, <[LlmTool]>::len)
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let text = response.text().await.unwrap_or_default();
            warn!("Messages API returned {}: {}", status, text);
            return Err(status_error(status, text, retry_after_ms));
        }

        let bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            tokio::pin!(bytes);
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(LlmError::StreamError(e.to_string()));
                        return;
                    }
                };
                for delta in decoder.push(&chunk) {
                    yield delta;
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

fn status_error(status: StatusCode, body: String, retry_after_ms: Option<u64>) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthFailed(body),
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited {
            retry_after_ms: retry_after_ms.unwrap_or(DEFAULT_RETRY_MS),
        },
        _ => LlmError::RequestFailed(format!("{}: {}", status, body)),
    }
}

/// Incremental server-sent-event decoder. Chunks may split events anywhere,
/// so bytes are buffered until a blank line closes the event.
#[derive(Default)]
pub(crate) struct SseDecoder {
    pending: Vec<u8>,
    buffer: String,
    open_tool: Option<String>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

impl SseDecoder {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<LlmResult<StreamDelta>> {
        self.pending.extend_from_slice(chunk);
        // hold back a multi-byte character cut by the chunk boundary
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => self.pending.len(),
        };
        let ready: Vec<u8> = self.pending.drain(..valid).collect();
        self.buffer.push_str(&String::from_utf8_lossy(&ready));
        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut out = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let raw: String = self.buffer.drain(..end + 2).collect();
            let data: String = raw
                .lines()
                .filter_map(|l| l.strip_prefix("data:"))
                .map(str::trim_start)
                .collect();
            if data.is_empty() {
                continue;
            }
            match serde_json::from_str::<SseEvent>(&data) {
                Ok(event) => self.apply(event, &mut out),
                Err(e) => debug!("Skipping unreadable event ({}): {}", e, data),
            }
        }
        out
    }

    fn apply(&mut self, event: SseEvent, out: &mut Vec<LlmResult<StreamDelta>>) {
        match event {
            SseEvent::ContentBlockStart { content_block: BlockStart::ToolUse { id, name } } => {
                self.open_tool = Some(id.clone());
                out.push(Ok(StreamDelta::ToolCallStart { id, name }));
            }
            SseEvent::ContentBlockStart { .. } => {}
            SseEvent::ContentBlockDelta { delta } => match delta {
                BlockDelta::TextDelta { text } => out.push(Ok(StreamDelta::Text(text))),
                BlockDelta::ThinkingDelta { thinking } => {
                    out.push(Ok(StreamDelta::Thinking(thinking)))
                }
                BlockDelta::InputJsonDelta { partial_json } => {
                    if let Some(id) = &self.open_tool {
                        out.push(Ok(StreamDelta::ToolCallDelta {
                            id: id.clone(),
                            arguments: partial_json,
                        }));
                    }
                }
                BlockDelta::Other => {}
            },
            SseEvent::ContentBlockStop {} => {
                if let Some(id) = self.open_tool.take() {
                    out.push(Ok(StreamDelta::ToolCallEnd { id }));
                }
            }
            SseEvent::MessageDelta { delta, usage } => {
                if delta.stop_reason.is_some() {
                    self.stop_reason = delta.stop_reason;
                }
                if usage.is_some() {
                    self.usage = usage;
                }
            }
            SseEvent::MessageStop {} => out.push(Ok(StreamDelta::Done {
                stop_reason: self.stop_reason.take(),
                usage: self.usage.take(),
            })),
            SseEvent::Error { error } => {
                out.push(Err(LlmError::StreamError(format!("{}: {}", error.kind, error.message))))
            }
            SseEvent::Other => {}
        }
    }
}

/// Every event payload carries its own `type`, so the `event:` line is not
/// needed to dispatch.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SseEvent {
    ContentBlockStart { content_block: BlockStart },
    ContentBlockDelta { delta: BlockDelta },
    ContentBlockStop {},
    MessageDelta { delta: StopInfo, usage: Option<Usage> },
    MessageStop {},
    Error { error: ApiError },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockStart {
    ToolUse { id: String, name: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct StopInfo {
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: String,
    message: String,
}
