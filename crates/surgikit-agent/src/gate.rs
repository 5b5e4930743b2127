//! Human gate - decides stage transitions and keeps reconciliation tools
//! closed until the human confirmed the kit
//!
//! The model never moves the stage itself. Stages advance from what the tool
//! results and the user's own words show, and the reconciliation group is
//! refused outside RECONCILE no matter what the model asks for.

use std::collections::HashSet;
use std::sync::Arc;
use surgikit_core::{ConversationTurn, Error, Result, Role, ToolName, ToolOutcome, WorkflowStage};

/// Decides whether a user message confirms the proposed kit.
pub trait ConfirmationClassifier: Send + Sync {
    fn is_confirmation(&self, text: &str) -> bool;
    fn name(&self) -> &'static str;
}

/// Any non-empty user message counts as confirmation.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImplicitConfirmation;

impl ConfirmationClassifier for ImplicitConfirmation {
    fn is_confirmation(&self, text: &str) -> bool {
        !text.trim().is_empty()
    }

    fn name(&self) -> &'static str { "implicit" }
}

const AFFIRMATIVES: &[&str] = &[
    "confirmo", "confirmado", "confirmada", "confirma", "confirmar", "sí", "ok", "okay",
    "vale", "apruebo", "aprobado", "aprobada", "acepto", "aceptado", "adelante", "correcto",
    "procede", "proceder", "listo", "yes", "confirm", "confirmed", "approve", "approved",
    "proceed", "de acuerdo", "está bien", "esta bien", "go ahead",
];

const NEGATIONS: &[&str] = &[
    "no", "cancel", "cancela", "cancelar", "cancelo", "espera", "esperar", "todavía", "todavia",
    "wait", "stop", "not", "nunca",
];

/// Affirmative words or phrases confirm; any negation or question vetoes.
///
/// Unaccented "si" is the conditional "if" and only confirms when it is the
/// whole message.
#[derive(Clone, Debug)]
pub struct KeywordConfirmation {
    affirmatives: Vec<String>,
    negations: HashSet<String>,
}

impl Default for KeywordConfirmation {
    fn default() -> Self {
        Self::new(
            AFFIRMATIVES.iter().map(|s| s.to_string()),
            NEGATIONS.iter().map(|s| s.to_string()),
        )
    }
}

impl KeywordConfirmation {
    pub fn new<A, N>(affirmatives: A, negations: N) -> Self
    where
        A: IntoIterator<Item = String>,
        N: IntoIterator<Item = String>,
    {
        Self {
            affirmatives: normalize_all(affirmatives),
            negations: normalize_all(negations),
        }
    }

    /// Default word lists plus extra entries.
    pub fn extended(extra_affirmatives: &[String], extra_negations: &[String]) -> Self {
        Self::new(
            AFFIRMATIVES.iter().map(|s| s.to_string()).chain(extra_affirmatives.iter().cloned()),
            NEGATIONS.iter().map(|s| s.to_string()).chain(extra_negations.iter().cloned()),
        )
    }
}

fn normalize_all<C: FromIterator<String>>(words: impl IntoIterator<Item = String>) -> C {
    words.into_iter().map(|s| normalize(&s)).filter(|s| !s.is_empty()).collect()
}

/// Lowercase words joined by single spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ConfirmationClassifier for KeywordConfirmation {
    fn is_confirmation(&self, text: &str) -> bool {
        if text.contains(['?', '¿']) {
            return false;
        }
        let normalized = normalize(text);
        if normalized.is_empty() {
            return false;
        }
        if normalized == "si" {
            return true;
        }
        if normalized.split(' ').any(|w| self.negations.contains(w)) {
            return false;
        }
        let padded = format!(" {} ", normalized);
        self.affirmatives
            .iter()
            .any(|a| padded.contains(&format!(" {} ", a)))
    }

    fn name(&self) -> &'static str { "keyword" }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Advance(WorkflowStage),
    Hold,
}

#[derive(Clone)]
pub struct HumanGate {
    classifier: Arc<dyn ConfirmationClassifier>,
}

impl Default for HumanGate {
    fn default() -> Self { Self::new(Arc::new(KeywordConfirmation::default())) }
}

impl HumanGate {
    pub fn new(classifier: Arc<dyn ConfirmationClassifier>) -> Self {
        Self { classifier }
    }

    pub fn implicit() -> Self {
        Self::new(Arc::new(ImplicitConfirmation))
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    /// Stage transition implied by the latest turn.
    pub fn evaluate(&self, stage: WorkflowStage, turn: &ConversationTurn) -> GateDecision {
        let target = match turn.role {
            Role::User => (stage == WorkflowStage::AwaitConfirmation
                && self.classifier.is_confirmation(&turn.content))
            .then_some(WorkflowStage::Reconcile),
            Role::Tool => turn
                .tool_invocations
                .iter()
                .filter_map(|call| {
                    let outcome = call.result.as_ref()?;
                    match (call.tool()?, outcome) {
                        (ToolName::IdentifySurgeryType, ToolOutcome::Success { .. }) => {
                            Some(WorkflowStage::Propose)
                        }
                        (ToolName::GetHistoricalKit, o) if !o.is_failure() => {
                            Some(WorkflowStage::AwaitConfirmation)
                        }
                        (ToolName::UpdateHistoricalData, ToolOutcome::Success { .. })
                            if stage >= WorkflowStage::Reconcile =>
                        {
                            Some(WorkflowStage::Done)
                        }
                        _ => None,
                    }
                })
                .max(),
            Role::Assistant => None,
        };
        match target {
            Some(to) if to > stage => GateDecision::Advance(to),
            _ => GateDecision::Hold,
        }
    }

    /// Refuse reconciliation-group tools outside RECONCILE. A finished
    /// workflow needs a reset before another kit can be reconciled.
    pub fn authorize(&self, stage: WorkflowStage, tool: ToolName) -> Result<()> {
        if tool.is_reconciliation() && stage != WorkflowStage::Reconcile {
            return Err(Error::GateBlocked { tool: tool.to_string(), stage });
        }
        Ok(())
    }
}
