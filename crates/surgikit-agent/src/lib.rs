//! Surgikit Agent - sessions, the human gate and the bounded tool loop

pub mod gate;
pub mod runtime;
pub mod session;

pub use gate::{
    ConfirmationClassifier, GateDecision, HumanGate, ImplicitConfirmation, KeywordConfirmation,
};
pub use runtime::{AgentConfig, AgentEvent, AgentRuntime, TurnOutcome, WORKFLOW_PROMPT};
pub use session::{Session, SessionKey, SessionRegistry};
