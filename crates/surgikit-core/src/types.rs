//! Core types for surgikit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Session identifier - cheaply cloneable
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct SessionKey(Arc<str>);

impl SessionKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Turn role
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// Coarse phase of the procurement workflow. Ordered: a session only ever
/// moves to a later stage until it is reset.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    #[default]
    Identify,
    Propose,
    AwaitConfirmation,
    Reconcile,
    Done,
}

impl WorkflowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identify => "IDENTIFY",
            Self::Propose => "PROPOSE",
            Self::AwaitConfirmation => "AWAIT_CONFIRMATION",
            Self::Reconcile => "RECONCILE",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four tools of the procurement workflow, by wire name.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ToolName {
    #[serde(rename = "Identify_Surgery_Type")]
    IdentifySurgeryType,
    #[serde(rename = "Get_Historical_Kit")]
    GetHistoricalKit,
    #[serde(rename = "Check_Inventory_And_Order_Status")]
    CheckInventoryAndOrderStatus,
    #[serde(rename = "Update_Historical_Data")]
    UpdateHistoricalData,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::IdentifySurgeryType,
        ToolName::GetHistoricalKit,
        ToolName::CheckInventoryAndOrderStatus,
        ToolName::UpdateHistoricalData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentifySurgeryType => "Identify_Surgery_Type",
            Self::GetHistoricalKit => "Get_Historical_Kit",
            Self::CheckInventoryAndOrderStatus => "Check_Inventory_And_Order_Status",
            Self::UpdateHistoricalData => "Update_Historical_Data",
        }
    }

    /// Tools that commit the finalized kit. They only run after the human
    /// confirmed it.
    pub fn is_reconciliation(&self) -> bool {
        matches!(
            self,
            Self::CheckInventoryAndOrderStatus | Self::UpdateHistoricalData
        )
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::Error::UnknownTool(s.to_string()))
    }
}

/// Why a tool call did not produce a payload.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownTool,
    InvalidArguments,
    Execution,
    Timeout,
    GateBlocked,
}

/// Result attached to a tool call once it was dispatched (or refused).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { payload: String },
    /// The lookup ran and found nothing. Not a failure.
    NoMatch { payload: String },
    Failed { kind: FailureKind, message: String },
}

impl ToolOutcome {
    pub fn success(payload: impl Into<String>) -> Self {
        Self::Success {
            payload: payload.into(),
        }
    }

    pub fn no_match(payload: impl Into<String>) -> Self {
        Self::NoMatch {
            payload: payload.into(),
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_gate_blocked(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                kind: FailureKind::GateBlocked,
                ..
            }
        )
    }

    /// Text fed back to the model.
    pub fn to_content_string(&self) -> String {
        match self {
            Self::Success { payload } | Self::NoMatch { payload } => payload.clone(),
            Self::Failed {
                kind: FailureKind::GateBlocked,
                message,
            } => format!("GateBlocked: {}", message),
            Self::Failed { message, .. } => format!("Error: {}", message),
        }
    }
}

/// One requested tool invocation and, once dispatched, its outcome.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ToolOutcome>,
}

impl ToolCall {
    pub fn new(
        id: impl Into<String>,
        tool_name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments,
            result: None,
        }
    }

    pub fn with_result(mut self, result: ToolOutcome) -> Self {
        self.result = Some(result);
        self
    }

    /// The typed tool name, if the requested name is one of ours.
    pub fn tool(&self) -> Option<ToolName> {
        self.tool_name.parse().ok()
    }
}

/// One exchange unit in a session. Never modified after it is appended.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolCall>,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_invocations: Vec::new(),
            at: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_invocations: Vec::new(),
            at: Utc::now(),
        }
    }

    /// Assistant turn requesting tool calls (results not yet set).
    pub fn assistant_with_tools(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_invocations: calls,
            at: Utc::now(),
        }
    }

    /// Tool turn carrying the dispatched calls with their outcomes.
    pub fn tool_results(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Tool,
            content: String::new(),
            tool_invocations: calls,
            at: Utc::now(),
        }
    }
}
