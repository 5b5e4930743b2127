//! surgikit - conversational surgical-supply procurement agent
//!
//! The binary wires configuration, the inventory resolver, the four tools and
//! the agent runtime together, then runs a terminal chat over one session.

pub mod chat;
pub mod config;

use std::sync::Arc;
use surgikit_agent::AgentRuntime;
use surgikit_llm::LlmProvider;

pub use config::SurgikitConfig;

/// Build a runtime from config around an already constructed provider.
pub fn build_runtime(
    config: &SurgikitConfig,
    provider: Arc<dyn LlmProvider>,
) -> surgikit_core::Result<AgentRuntime> {
    let resolver = Arc::new(config.build_resolver()?);
    let tools = surgikit_tools::create_default_registry(resolver)?;
    tracing::info!(
        "Runtime ready: model={}, tools={}, gate={}",
        config.model.name,
        tools.len(),
        config.gate.classifier.as_str()
    );
    Ok(AgentRuntime::with_provider(provider, tools, config.agent_config()).with_gate(config.gate()))
}
