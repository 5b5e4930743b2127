//! Error types for surgikit

use crate::types::WorkflowStage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("tool error: {name} - {message}")]
    ToolExecution { name: String, message: String },

    #[error("transport error: {provider} - {message}")]
    Transport { provider: String, message: String },

    #[error("{tool} blocked at stage {stage}")]
    GateBlocked { tool: String, stage: WorkflowStage },

    #[error("max tool iterations exceeded ({limit})")]
    MaxToolIterationsExceeded { limit: usize },

    #[error("empty message")]
    EmptyMessage,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_arguments(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn tool_execution(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the error ended the turn after it had already touched the session.
    pub fn is_turn_abort(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::MaxToolIterationsExceeded { .. }
        )
    }
}
