//! ScriptedProvider - deterministic model responses for tests and offline runs
//!
//! Each call to `complete_stream` pops the next scripted behavior and streams
//! it as deltas, the same shape the Anthropic adapter produces.

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::types::{LlmRequest, StreamDelta};
use async_stream::stream;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Mock behavior configuration
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return a text-only response
    Text(String),
    /// Return a tool_use call with given name and args
    ToolCall { name: String, args: Value },
    /// Return multiple tool_use calls
    MultiToolCall(Vec<(String, Value)>),
    /// Return text followed by a tool call
    TextThenTool {
        text: String,
        tool_name: String,
        tool_args: Value,
    },
    /// Return a tool call whose argument text is not JSON
    Malformed { name: String, raw_args: String },
    /// Fail before streaming, like an unreachable API
    Error(String),
    /// Fail in the middle of the stream
    StreamError(String),
}

impl MockBehavior {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn tool(name: impl Into<String>, args: Value) -> Self {
        Self::ToolCall { name: name.into(), args }
    }
}

/// A sequence of behaviors - each call to complete_stream pops the next one.
/// If the sequence is exhausted, the default behavior is used.
pub struct ScriptedProvider {
    behaviors: Mutex<VecDeque<MockBehavior>>,
    default_behavior: MockBehavior,
    call_count: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedProvider {
    /// Create a mock that always returns the same behavior
    pub fn constant(behavior: MockBehavior) -> Self {
        Self {
            behaviors: Mutex::new(VecDeque::new()),
            default_behavior: behavior,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with a sequence of behaviors (consumed in order)
    pub fn sequence(behaviors: Vec<MockBehavior>) -> Self {
        Self {
            behaviors: Mutex::new(behaviors.into()),
            default_behavior: MockBehavior::Text("(mock: sequence exhausted)".into()),
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue more behaviors after construction.
    pub fn push(&self, behavior: MockBehavior) {
        if let Ok(mut behaviors) = self.behaviors.lock() {
            behaviors.push_back(behavior);
        }
    }

    /// Number of completions requested so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }

    fn next_behavior(&self) -> MockBehavior {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.behaviors
            .lock()
            .ok()
            .and_then(|mut b| b.pop_front())
            .unwrap_or_else(|| self.default_behavior.clone())
    }
}

fn mock_id(n: usize) -> String {
    format!("toolu_mock_{}_{}", n, uuid::Uuid::new_v4().simple())
}

fn tool_deltas(id: String, name: String, args: String) -> Vec<StreamDelta> {
    vec![
        StreamDelta::ToolCallStart { id: id.clone(), name },
        StreamDelta::ToolCallDelta { id: id.clone(), arguments: args },
        StreamDelta::ToolCallEnd { id },
    ]
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete_stream(&self, request: LlmRequest) -> LlmResult<LlmStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let behavior = self.next_behavior();

        let deltas: Vec<StreamDelta> = match behavior {
            MockBehavior::Error(e) => return Err(LlmError::RequestFailed(e)),
            MockBehavior::StreamError(e) => vec![
                StreamDelta::Text("partial".into()),
                StreamDelta::Error(e),
            ],
            MockBehavior::Text(text) => text
                .chars()
                .collect::<Vec<_>>()
                .chunks(20)
                .map(|c| StreamDelta::Text(c.iter().collect()))
                .collect(),
            MockBehavior::ToolCall { name, args } => {
                tool_deltas(mock_id(0), name, args.to_string())
            }
            MockBehavior::MultiToolCall(calls) => calls
                .into_iter()
                .enumerate()
                .flat_map(|(i, (name, args))| tool_deltas(mock_id(i), name, args.to_string()))
                .collect(),
            MockBehavior::TextThenTool { text, tool_name, tool_args } => {
                let mut d = vec![StreamDelta::Text(text)];
                d.extend(tool_deltas(mock_id(0), tool_name, tool_args.to_string()));
                d
            }
            MockBehavior::Malformed { name, raw_args } => tool_deltas(mock_id(0), name, raw_args),
        };

        Ok(Box::pin(stream! {
            for delta in deltas {
                yield Ok::<_, LlmError>(delta);
            }
            yield Ok(StreamDelta::Done { stop_reason: Some("end_turn".into()), usage: None });
        }))
    }
}
