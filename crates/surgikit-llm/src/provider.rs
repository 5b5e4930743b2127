//! LLM Provider trait

use crate::types::{AccumulatedToolCall, LlmRequest, ModelResponse, StreamDelta};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tracing::debug;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl From<LlmError> for surgikit_core::Error {
    fn from(e: LlmError) -> Self {
        surgikit_core::Error::transport("llm", e.to_string())
    }
}

/// Stream type for LLM responses
pub type LlmStream = Pin<Box<dyn Stream<Item = LlmResult<StreamDelta>> + Send>>;

/// The model capability: given history, a system instruction and tool
/// schemas, answer or ask for tools.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Stream a completion response.
    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream>;

    /// Run one completion to the end and fold it into a [`ModelResponse`].
    async fn generate(&self, request: LlmRequest) -> LlmResult<ModelResponse> {
        let stream = self.complete_stream(request).await?;
        collect_response(stream).await
    }
}

/// Fold a delta stream into the tagged response. Any error in the stream
/// fails the whole call; a partial answer is never returned.
pub async fn collect_response(mut stream: LlmStream) -> LlmResult<ModelResponse> {
    let mut text = String::new();
    let mut calls: Vec<AccumulatedToolCall> = Vec::new();
    let mut current: Option<AccumulatedToolCall> = None;

    while let Some(delta) = stream.next().await {
        match delta? {
            StreamDelta::Text(t) => text.push_str(&t),
            StreamDelta::Thinking(_) => {}
            StreamDelta::ToolCallStart { id, name } => {
                if let Some(open) = current.take() {
                    calls.push(open);
                }
                current = Some(AccumulatedToolCall { id, name, arguments: String::new() });
            }
            StreamDelta::ToolCallDelta { arguments, .. } => {
                if let Some(ref mut tool) = current {
                    tool.arguments.push_str(&arguments);
                }
            }
            StreamDelta::ToolCallEnd { .. } => {
                if let Some(tool) = current.take() {
                    calls.push(tool);
                }
            }
            StreamDelta::Done { stop_reason, .. } => {
                debug!("stream done: stop_reason={:?}", stop_reason);
            }
            StreamDelta::Error(e) => return Err(LlmError::StreamError(e)),
        }
    }
    if let Some(open) = current.take() {
        calls.push(open);
    }

    if calls.is_empty() {
        Ok(ModelResponse::FinalAnswer(text))
    } else {
        Ok(ModelResponse::ToolRequest {
            text,
            calls: calls.into_iter().map(AccumulatedToolCall::into_requested).collect(),
        })
    }
}
