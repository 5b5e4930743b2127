//! Session state: the turn history and workflow stage of one procurement
//! conversation

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use surgikit_core::{ConversationTurn, Role, WorkflowStage};
use surgikit_llm::{ContentBlock, LlmContent, LlmMessage};
use tokio::sync::Mutex;
use tracing::info;

pub use surgikit_core::SessionKey;

/// Sessions by key. The mutex is held for a whole turn, so turns on one
/// session never interleave.
pub struct SessionRegistry {
    sessions: DashMap<SessionKey, Arc<Mutex<Session>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self { Self::new() }
}

impl SessionRegistry {
    pub fn new() -> Self { Self { sessions: DashMap::new() } }

    pub fn get_or_create(&self, key: &SessionKey) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(key.clone())
            .or_insert_with(|| {
                info!("Session {} created", key);
                Arc::new(Mutex::new(Session::new(key.clone())))
            })
            .clone()
    }

    pub fn get(&self, key: &SessionKey) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(key).map(|s| s.clone())
    }

    pub fn list(&self) -> Vec<SessionKey> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }

    pub fn remove(&self, key: &SessionKey) -> Option<Arc<Mutex<Session>>> {
        self.sessions.remove(key).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize { self.sessions.len() }
    pub fn is_empty(&self) -> bool { self.sessions.is_empty() }
}

/// One procurement workflow: append-only turns plus the stage marker.
#[derive(Clone, Debug)]
pub struct Session {
    pub key: SessionKey,
    turns: Vec<ConversationTurn>,
    stage: WorkflowStage,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: SessionKey) -> Self {
        Self {
            key,
            turns: Vec::new(),
            stage: WorkflowStage::Identify,
            created_at: Utc::now(),
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] { &self.turns }
    pub fn last_turn(&self) -> Option<&ConversationTurn> { self.turns.last() }
    pub fn len(&self) -> usize { self.turns.len() }
    pub fn is_empty(&self) -> bool { self.turns.is_empty() }
    pub fn stage(&self) -> WorkflowStage { self.stage }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Move to a later stage. Returns false, leaving the stage untouched,
    /// when `to` is not after the current stage.
    pub fn advance(&mut self, to: WorkflowStage) -> bool {
        if to <= self.stage {
            return false;
        }
        info!("Session {} stage {} -> {}", self.key, self.stage, to);
        self.stage = to;
        true
    }

    /// Put back the stage recorded before an aborted turn.
    pub(crate) fn restore_stage(&mut self, stage: WorkflowStage) {
        self.stage = stage;
    }

    /// Empty the history and start over at IDENTIFY.
    pub fn reset(&mut self) {
        info!("Session {} reset ({} turns dropped)", self.key, self.turns.len());
        self.turns.clear();
        self.stage = WorkflowStage::Identify;
        self.created_at = Utc::now();
    }

    /// The history in Messages API form. Tool turns become user messages of
    /// tool_result blocks; adjacent messages of one role are merged.
    pub fn llm_messages(&self) -> Vec<LlmMessage> {
        let mut messages: Vec<LlmMessage> = Vec::new();
        for turn in &self.turns {
            let (role, blocks) = match turn.role {
                Role::User => ("user", text_block(&turn.content)),
                Role::Assistant => {
                    let mut blocks = text_block(&turn.content);
                    blocks.extend(turn.tool_invocations.iter().map(|c| ContentBlock::ToolUse {
                        id: c.id.clone(),
                        name: c.tool_name.clone(),
                        input: if c.arguments.is_object() {
                            c.arguments.clone()
                        } else {
                            Value::Object(Default::default())
                        },
                    }));
                    ("assistant", blocks)
                }
                Role::Tool => (
                    "user",
                    turn.tool_invocations
                        .iter()
                        .map(|c| {
                            let failed = c.result.as_ref().map(|r| r.is_failure()).unwrap_or(true);
                            ContentBlock::ToolResult {
                                tool_use_id: c.id.clone(),
                                content: c
                                    .result
                                    .as_ref()
                                    .map(|r| r.to_content_string())
                                    .unwrap_or_else(|| "Error: no result".to_string()),
                                is_error: if failed { Some(true) } else { None },
                            }
                        })
                        .collect(),
                ),
            };
            if blocks.is_empty() {
                continue;
            }
            push_merged(&mut messages, role, blocks);
        }
        messages
    }
}

fn text_block(text: &str) -> Vec<ContentBlock> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![ContentBlock::Text { text: text.to_string() }]
    }
}

fn push_merged(messages: &mut Vec<LlmMessage>, role: &str, blocks: Vec<ContentBlock>) {
    if let Some(last) = messages.last_mut() {
        if last.role == role {
            let previous = std::mem::replace(&mut last.content, LlmContent::Blocks(Vec::new()));
            let mut merged = match previous {
                LlmContent::Text(t) => text_block(&t),
                LlmContent::Blocks(b) => b,
            };
            merged.extend(blocks);
            last.content = LlmContent::Blocks(merged);
            return;
        }
    }
    let content = match blocks.as_slice() {
        [ContentBlock::Text { text }] => LlmContent::Text(text.clone()),
        _ => LlmContent::Blocks(blocks),
    };
    messages.push(LlmMessage { role: role.to_string(), content });
}
