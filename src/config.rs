//! Surgikit configuration
//!
//! Loaded from TOML at startup, falls back to defaults if no config file
//! exists or it does not parse. Secrets never live here: the API key comes
//! from the environment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use surgikit_agent::{AgentConfig, HumanGate, KeywordConfirmation};
use surgikit_core::{Error, Result};
use surgikit_inventory::{
    catalog, kit, stock, HttpFetcher, InMemoryLedger, InMemoryStock, JsonlLedger, KitResolver,
    KitTemplate, ReferenceUrls, SurgeryCatalog, SurgeryType, UsageLedger,
};

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurgikitConfig {
    pub model: ModelConfig,
    pub agent: AgentSection,
    pub gate: GateConfig,
    pub inventory: InventoryConfig,
    pub reference: ReferenceConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Anthropic model id.
    pub name: String,
    pub max_tokens: u32,
    /// A model call slower than this fails the turn.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Model calls allowed per user turn.
    pub max_tool_iterations: usize,
    pub tool_timeout_secs: u64,
    pub max_result_chars: usize,
    /// Replaces the built-in workflow instructions.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    #[default]
    Keyword,
    Implicit,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Implicit => "implicit",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub classifier: ClassifierKind,
    /// Added to the keyword classifier's affirmative words.
    pub extra_affirmatives: Vec<String>,
    /// Added to the keyword classifier's vetoes.
    pub extra_negations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// JSON-lines usage ledger. In memory when unset.
    pub ledger_path: Option<PathBuf>,
    /// Stock level per item.
    pub stock: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Fetch the reference documents during kit and inventory lookups.
    pub enabled: bool,
    pub timeout_secs: u64,
    pub urls: ReferenceUrls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub surgeries: Vec<SurgeryType>,
    pub kits: Vec<KitTemplate>,
}

// ============================================================
// Defaults
// ============================================================

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: surgikit_llm::DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_tool_iterations: 8,
            tool_timeout_secs: 30,
            max_result_chars: 50_000,
            system_prompt: None,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            ledger_path: None,
            stock: stock::demo_stock().into_iter().collect(),
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_secs: 10,
            urls: ReferenceUrls::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            surgeries: catalog::demo_surgeries(),
            kits: kit::demo_kits(),
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl SurgikitConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            model: self.model.name.clone(),
            max_tokens: self.model.max_tokens,
            max_tool_iterations: self.agent.max_tool_iterations,
            model_timeout: Duration::from_secs(self.model.timeout_secs),
            tool_timeout: Duration::from_secs(self.agent.tool_timeout_secs),
            max_result_chars: self.agent.max_result_chars,
            system_prompt: self.agent.system_prompt.clone(),
        }
    }

    pub fn gate(&self) -> HumanGate {
        match self.gate.classifier {
            ClassifierKind::Implicit => HumanGate::implicit(),
            ClassifierKind::Keyword => HumanGate::new(Arc::new(KeywordConfirmation::extended(
                &self.gate.extra_affirmatives,
                &self.gate.extra_negations,
            ))),
        }
    }

    pub fn build_resolver(&self) -> Result<KitResolver> {
        let ledger: Arc<dyn UsageLedger> = match &self.inventory.ledger_path {
            Some(path) => Arc::new(JsonlLedger::new(path)),
            None => Arc::new(InMemoryLedger::new()),
        };
        let stock = InMemoryStock::from_levels(self.inventory.stock.clone());
        let resolver = KitResolver::new(
            SurgeryCatalog::new(self.catalog.surgeries.clone()),
            self.catalog.kits.clone(),
            Arc::new(stock),
            ledger,
        );
        if !self.reference.enabled {
            return Ok(resolver);
        }
        let fetcher = HttpFetcher::new(Duration::from_secs(self.reference.timeout_secs))
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(resolver.with_reference(Arc::new(fetcher), self.reference.urls.clone()))
    }
}

/// The API key, from a raw environment value. Missing or blank is fatal.
pub fn api_key_from(value: Option<String>) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} not set", API_KEY_ENV)))
}

pub fn api_key() -> Result<String> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}
