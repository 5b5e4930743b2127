//! surgikit LLM - the model capability boundary: provider trait, Anthropic
//! adapter with SSE streaming, and a scripted provider

pub mod anthropic;
pub mod mock;
pub mod provider;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use mock::{MockBehavior, ScriptedProvider};
pub use provider::{collect_response, LlmError, LlmProvider, LlmResult, LlmStream};
pub use types::*;
