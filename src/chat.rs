//! Terminal chat over one session
//!
//! Plain line-oriented REPL: every line is a user turn unless it starts with
//! `/`. Agent events are printed as the turn runs.

use anyhow::Result;
use surgikit_agent::{AgentEvent, AgentRuntime, Session, SessionKey};
use surgikit_core::{Role, ToolOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

const HELP: &str = "\
Comandos:
  /reset     reinicia la sesión (vuelve a IDENTIFY)
  /stage     muestra la etapa actual
  /history   muestra el historial de la sesión
  /help      muestra esta ayuda
  /quit      termina
Cualquier otra línea se envía al agente.";

/// Error lines in event output are cut to this many characters.
const PREVIEW_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Message(String),
    Reset,
    Stage,
    History,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Message(line.to_string());
        }
        match line.to_lowercase().as_str() {
            "/reset" => Self::Reset,
            "/stage" => Self::Stage,
            "/history" => Self::History,
            "/help" | "/?" => Self::Help,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Run the REPL until `/quit` or end of input.
pub async fn run<R>(runtime: &AgentRuntime, key: &SessionKey, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    println!("surgikit v{} - sesión {}", env!("CARGO_PKG_VERSION"), key);
    println!("Ingresa el código FONASA o el nombre de la cirugía. /help para ayuda.");
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match ChatCommand::parse(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Quit => break,
            ChatCommand::Help => println!("{}", HELP),
            ChatCommand::Unknown(cmd) => println!("Comando desconocido: {} (/help)", cmd),
            ChatCommand::Stage => {
                let session = runtime.sessions().get_or_create(key);
                let stage = session.lock().await.stage();
                println!("Etapa actual: {}", stage);
            }
            ChatCommand::History => {
                let session = runtime.sessions().get_or_create(key);
                let rendered = render_history(&*session.lock().await);
                println!("{}", rendered);
            }
            ChatCommand::Reset => {
                let session = runtime.sessions().get_or_create(key);
                session.lock().await.reset();
                println!("Sesión reiniciada.");
            }
            ChatCommand::Message(text) => send(runtime, key, &text).await,
        }
    }
    Ok(())
}

async fn send(runtime: &AgentRuntime, key: &SessionKey, text: &str) {
    let (tx, rx) = mpsc::channel(256);
    let turn = async move {
        let result = runtime.run_session_turn(key, text, Some(&tx)).await;
        drop(tx);
        result
    };
    let (result, ()) = tokio::join!(turn, print_events(rx));
    if let Err(e) = result {
        // Aborted turns already reported themselves through an Error event.
        if !e.is_turn_abort() {
            println!("Error: {}", e);
        }
    }
}

async fn print_events(mut rx: mpsc::Receiver<AgentEvent>) {
    while let Some(event) = rx.recv().await {
        if let Some(line) = render_event(&event) {
            println!("{}", line);
        }
    }
}

/// Terminal line for an event, if it shows anything.
pub fn render_event(event: &AgentEvent) -> Option<String> {
    match event {
        AgentEvent::Text(text) => Some(text.clone()),
        AgentEvent::StageChanged { from, to } => Some(format!("[etapa] {} -> {}", from, to)),
        AgentEvent::ToolExecuting { name, .. } => Some(format!("  [tool:{}]", name)),
        AgentEvent::ToolResult { name, result, is_error: true, .. } => {
            Some(format!("  error en {}: {}", name, preview(result)))
        }
        AgentEvent::ToolResult { .. } => None,
        AgentEvent::GateBlocked { tool, stage, .. } => Some(format!(
            "  [bloqueado] {} requiere confirmación del kit (etapa {})",
            tool, stage
        )),
        AgentEvent::Done { .. } => None,
        AgentEvent::Error(e) => Some(format!("Error: {}", e)),
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

/// Numbered transcript of the session, tool calls included.
pub fn render_history(session: &Session) -> String {
    if session.is_empty() {
        return format!("(sin turnos, etapa {})", session.stage());
    }
    let mut out = String::new();
    for (i, turn) in session.turns().iter().enumerate() {
        let role = match turn.role {
            Role::User => "usuario",
            Role::Assistant => "agente",
            Role::Tool => "herramienta",
        };
        if !turn.content.is_empty() {
            out.push_str(&format!("[{}] {}: {}\n", i + 1, role, turn.content));
        } else {
            out.push_str(&format!("[{}] {}:\n", i + 1, role));
        }
        for call in &turn.tool_invocations {
            match &call.result {
                None => out.push_str(&format!("    -> {}({})\n", call.tool_name, call.arguments)),
                Some(outcome) => {
                    let status = match outcome {
                        ToolOutcome::Success { .. } => "ok",
                        ToolOutcome::NoMatch { .. } => "sin coincidencia",
                        ToolOutcome::Failed { .. } => "falló",
                    };
                    out.push_str(&format!(
                        "    <- {} [{}]: {}\n",
                        call.tool_name,
                        status,
                        preview(&outcome.to_content_string())
                    ));
                }
            }
        }
    }
    out.push_str(&format!("Etapa actual: {}", session.stage()));
    out
}
