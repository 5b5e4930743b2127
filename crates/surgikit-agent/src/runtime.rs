//! Agent runtime - the bounded tool loop behind one conversational turn

use crate::gate::{GateDecision, HumanGate};
use crate::session::{Session, SessionKey, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;
use surgikit_core::{
    ConversationTurn, Error, FailureKind, Result, ToolCall, ToolName, ToolOutcome, WorkflowStage,
};
use surgikit_llm::{
    AnthropicProvider, LlmError, LlmProvider, LlmRequest, LlmTool, ModelResponse, RequestedCall,
    DEFAULT_MODEL,
};
use surgikit_tools::ToolRegistry;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub enum AgentEvent {
    Text(String),
    StageChanged {
        from: WorkflowStage,
        to: WorkflowStage,
    },
    ToolExecuting {
        id: String,
        name: String,
    },
    ToolResult {
        id: String,
        name: String,
        result: String,
        is_error: bool,
    },
    GateBlocked {
        id: String,
        tool: String,
        stage: WorkflowStage,
    },
    Done {
        stage: WorkflowStage,
    },
    Error(String),
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Model calls allowed per user turn.
    pub max_tool_iterations: usize,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
    /// Tool results longer than this many characters are truncated.
    pub max_result_chars: usize,
    /// Replaces the built-in workflow instructions when set.
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            max_tool_iterations: 8,
            model_timeout: Duration::from_secs(120),
            tool_timeout: Duration::from_secs(30),
            max_result_chars: 50_000,
            system_prompt: None,
        }
    }
}

/// What a completed turn produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub stage: WorkflowStage,
    /// Tool calls handled this turn, refused ones included.
    pub tool_calls: usize,
    pub model_calls: usize,
}

pub const WORKFLOW_PROMPT: &str = "\
Eres un agente senior de gestión de insumos quirúrgicos. Armas un kit quirúrgico \
personalizado siguiendo siempre estas cuatro etapas:

1. IDENTIFICACIÓN: el usuario entrega un código FONASA o el nombre de una cirugía \
(ej: 012546). Llama de inmediato a Identify_Surgery_Type.
2. PROPUESTA: con la cirugía identificada, llama a Get_Historical_Kit y presenta el kit \
propuesto al usuario de forma clara, un insumo por línea.
3. CONFIRMACIÓN HUMANA: espera a que el profesional confirme el kit o entregue la lista \
final modificada. No pases a la etapa 4 sin una confirmación explícita; las herramientas \
de la etapa 4 serán rechazadas hasta entonces.
4. PROCESAMIENTO FINAL: con la lista confirmada, llama a Check_Inventory_And_Order_Status \
para cruzarla contra el stock, entrega el informe de compra final y llama a \
Update_Historical_Data con la lista final de compra/uso.

Responde siempre de forma clara y profesional, en español.";

fn stage_hint(stage: WorkflowStage) -> &'static str {
    match stage {
        WorkflowStage::Identify => "identifica la cirugía.",
        WorkflowStage::Propose => "propón el kit histórico.",
        WorkflowStage::AwaitConfirmation => "espera la confirmación del usuario.",
        WorkflowStage::Reconcile => "cruza la lista final con el inventario y registra el uso.",
        WorkflowStage::Done => "el flujo está completo; responde consultas o espera un reinicio.",
    }
}

pub struct AgentRuntime {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    gate: HumanGate,
    sessions: Arc<SessionRegistry>,
    config: AgentConfig,
}

impl AgentRuntime {
    pub fn new(api_key: &str, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self::with_provider(Arc::new(AnthropicProvider::new(api_key)), tools, config)
    }

    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools: Arc::new(tools),
            gate: HumanGate::default(),
            sessions: Arc::new(SessionRegistry::new()),
            config,
        }
    }

    pub fn with_gate(mut self, gate: HumanGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> { &self.sessions }
    pub fn provider(&self) -> &Arc<dyn LlmProvider> { &self.provider }
    pub fn tools(&self) -> &Arc<ToolRegistry> { &self.tools }
    pub fn gate(&self) -> &HumanGate { &self.gate }
    pub fn config(&self) -> &AgentConfig { &self.config }
    pub fn tool_definitions(&self) -> Vec<LlmTool> { self.tools.get_definitions() }

    /// System instruction for a MODEL_CALL at `stage`.
    pub fn system_prompt(&self, stage: WorkflowStage) -> String {
        let base = self.config.system_prompt.as_deref().unwrap_or(WORKFLOW_PROMPT);
        format!("{}\n\nEtapa actual: {} ({})", base, stage, stage_hint(stage))
    }

    /// Run a turn on a registered session, holding its lock for the whole turn.
    pub async fn run_session_turn(
        &self,
        key: &SessionKey,
        user_message: &str,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<TurnOutcome> {
        let session = self.sessions.get_or_create(key);
        let mut session = session.lock().await;
        self.run_turn(&mut session, user_message, events).await
    }

    /// Process one user message to a final answer.
    ///
    /// Tool failures, refusals and timeouts are fed back to the model and the
    /// turn continues. A transport failure ends the turn with an error turn
    /// appended and the stage put back where it was; exceeding the model
    /// call bound ends it with `MaxToolIterationsExceeded`.
    pub async fn run_turn(
        &self,
        session: &mut Session,
        user_message: &str,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Result<TurnOutcome> {
        if user_message.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        let stage_before = session.stage();
        self.append_and_gate(session, ConversationTurn::user(user_message), events)
            .await;

        let definitions = self.tools.get_definitions();
        let limit = self.config.max_tool_iterations;
        let mut model_calls = 0;
        let mut tool_calls = 0;

        loop {
            if model_calls >= limit {
                let message = format!(
                    "Se alcanzó el límite de {} llamadas al modelo en este turno. Intenta reformular la solicitud.",
                    limit
                );
                warn!("Session {}: max tool iterations ({}) exceeded", session.key, limit);
                session.append(ConversationTurn::assistant(format!("Error: {}", message)));
                emit(events, AgentEvent::Error(message)).await;
                return Err(Error::MaxToolIterationsExceeded { limit });
            }
            model_calls += 1;

            let request = LlmRequest {
                model: self.config.model.clone(),
                messages: session.llm_messages(),
                tools: Some(definitions.clone()),
                max_tokens: Some(self.config.max_tokens),
                system: Some(self.system_prompt(session.stage())),
                ..Default::default()
            };

            let response = match tokio::time::timeout(
                self.config.model_timeout,
                self.provider.generate(request),
            )
            .await
            {
                Ok(Ok(r)) => r,
                Ok(Err(e)) => return Err(self.abort_turn(session, stage_before, e, events).await),
                Err(_) => {
                    let e = LlmError::Timeout(self.config.model_timeout.as_secs());
                    return Err(self.abort_turn(session, stage_before, e, events).await);
                }
            };

            let (text, calls) = match response {
                ModelResponse::FinalAnswer(text) => {
                    session.append(ConversationTurn::assistant(text.clone()));
                    emit(events, AgentEvent::Text(text.clone())).await;
                    emit(events, AgentEvent::Done { stage: session.stage() }).await;
                    info!(
                        "Turn complete: session={}, stage={}, model_calls={}, tool_calls={}",
                        session.key,
                        session.stage(),
                        model_calls,
                        tool_calls
                    );
                    return Ok(TurnOutcome {
                        reply: text,
                        stage: session.stage(),
                        tool_calls,
                        model_calls,
                    });
                }
                ModelResponse::ToolRequest { text, calls } => (text, calls),
            };

            if !text.is_empty() {
                emit(events, AgentEvent::Text(text.clone())).await;
            }
            let requested: Vec<ToolCall> = calls
                .iter()
                .map(|c| ToolCall::new(c.id.clone(), c.name.clone(), c.arguments.clone()))
                .collect();
            session.append(ConversationTurn::assistant_with_tools(text, requested));

            // Every call in one response is checked against the same stage.
            let stage = session.stage();
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                emit(
                    events,
                    AgentEvent::ToolExecuting { id: call.id.clone(), name: call.name.clone() },
                )
                .await;
                let outcome = self.dispatch(stage, &call, events).await;
                let outcome = truncate_outcome(outcome, self.config.max_result_chars);
                emit(
                    events,
                    AgentEvent::ToolResult {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        result: outcome.to_content_string(),
                        is_error: outcome.is_failure(),
                    },
                )
                .await;
                tool_calls += 1;
                results.push(
                    ToolCall::new(call.id, call.name, call.arguments).with_result(outcome),
                );
            }
            self.append_and_gate(session, ConversationTurn::tool_results(results), events)
                .await;

            debug!("Tool calls executed, continuing loop (iteration {})", model_calls);
        }
    }

    /// Gate check, resolution, validation and isolated execution of one call.
    async fn dispatch(
        &self,
        stage: WorkflowStage,
        call: &RequestedCall,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> ToolOutcome {
        let name = match call.name.parse::<ToolName>() {
            Ok(n) => n,
            Err(e) => return ToolOutcome::failed(FailureKind::UnknownTool, e.to_string()),
        };

        if let Err(e) = self.gate.authorize(stage, name) {
            info!("{} refused at stage {}", name, stage);
            emit(
                events,
                AgentEvent::GateBlocked { id: call.id.clone(), tool: name.to_string(), stage },
            )
            .await;
            let hint = if stage == WorkflowStage::Done {
                "El flujo ya terminó; el usuario debe reiniciar la sesión (/reset) para una nueva cirugía."
            } else {
                "Espera la confirmación explícita del usuario sobre el kit."
            };
            return ToolOutcome::failed(FailureKind::GateBlocked, format!("{}. {}", e, hint));
        }

        let tool = match self.tools.resolve(name) {
            Ok(t) => t,
            Err(e) => return ToolOutcome::failed(FailureKind::UnknownTool, e.to_string()),
        };
        if let Err(e) = self.tools.validate(name, &call.arguments) {
            return ToolOutcome::failed(FailureKind::InvalidArguments, e.to_string());
        }

        let args = call.arguments.clone();
        let mut handle = tokio::spawn(async move { tool.execute(args).await });
        match tokio::time::timeout(self.config.tool_timeout, &mut handle).await {
            Ok(Ok(result)) => result.into_outcome(),
            Ok(Err(e)) => {
                warn!("{} handler failed: {}", name, e);
                ToolOutcome::failed(FailureKind::Execution, format!("{} failed: {}", name, e))
            }
            Err(_) => {
                handle.abort();
                warn!("{} timed out after {:?}", name, self.config.tool_timeout);
                ToolOutcome::failed(
                    FailureKind::Timeout,
                    format!("{} timed out after {}s", name, self.config.tool_timeout.as_secs()),
                )
            }
        }
    }

    async fn append_and_gate(
        &self,
        session: &mut Session,
        turn: ConversationTurn,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) {
        let from = session.stage();
        let decision = self.gate.evaluate(from, &turn);
        session.append(turn);
        if let GateDecision::Advance(to) = decision {
            if session.advance(to) {
                emit(events, AgentEvent::StageChanged { from, to }).await;
            }
        }
    }

    async fn abort_turn(
        &self,
        session: &mut Session,
        stage_before: WorkflowStage,
        error: LlmError,
        events: Option<&mpsc::Sender<AgentEvent>>,
    ) -> Error {
        let error: Error = error.into();
        warn!("Session {}: turn aborted: {}", session.key, error);
        session.append(ConversationTurn::assistant(format!(
            "Error: no se pudo obtener respuesta del modelo ({}). Intenta nuevamente.",
            error
        )));
        let current = session.stage();
        if current != stage_before {
            session.restore_stage(stage_before);
            emit(events, AgentEvent::StageChanged { from: current, to: stage_before }).await;
        }
        emit(events, AgentEvent::Error(error.to_string())).await;
        error
    }
}

async fn emit(events: Option<&mpsc::Sender<AgentEvent>>, event: AgentEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

fn truncate_text(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!(
            "{}...\n[truncated, {} total chars]",
            &text[..cut],
            text.chars().count()
        ),
        None => text,
    }
}

fn truncate_outcome(outcome: ToolOutcome, max_chars: usize) -> ToolOutcome {
    match outcome {
        ToolOutcome::Success { payload } => ToolOutcome::Success {
            payload: truncate_text(payload, max_chars),
        },
        ToolOutcome::NoMatch { payload } => ToolOutcome::NoMatch {
            payload: truncate_text(payload, max_chars),
        },
        ToolOutcome::Failed { kind, message } => ToolOutcome::Failed {
            kind,
            message: truncate_text(message, max_chars),
        },
    }
}
