//! Surgery catalog - maps FONASA codes and free-text names to surgery types

use serde::{Deserialize, Serialize};

/// A surgery the procurement workflow knows a kit for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurgeryType {
    /// FONASA code, e.g. "012546".
    pub code: String,
    /// Display name, e.g. "Cirugía de Cráneo (Neurocirugía)".
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl SurgeryType {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            aliases: Vec::new(),
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a lowercased query mentions this surgery.
    fn matches(&self, query: &str) -> bool {
        if !self.code.is_empty() && query.contains(&self.code.to_lowercase()) {
            return true;
        }
        if query.contains(&self.name.to_lowercase()) {
            return true;
        }
        self.aliases
            .iter()
            .filter(|a| !a.trim().is_empty())
            .any(|a| query.contains(&a.to_lowercase()))
    }
}

/// Result of identifying a surgery. `Unidentified` is a normal outcome: the
/// assistant asks the user to clarify.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identification {
    Identified(SurgeryType),
    Unidentified,
}

impl Identification {
    pub fn surgery(&self) -> Option<&SurgeryType> {
        match self {
            Self::Identified(s) => Some(s),
            Self::Unidentified => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SurgeryCatalog {
    entries: Vec<SurgeryType>,
}

impl SurgeryCatalog {
    pub fn new(entries: Vec<SurgeryType>) -> Self {
        Self { entries }
    }

    /// Catalog with the neurosurgery demo entry.
    pub fn demo() -> Self {
        Self::new(demo_surgeries())
    }

    pub fn entries(&self) -> &[SurgeryType] {
        &self.entries
    }

    /// First entry whose code, name or an alias occurs in the query,
    /// compared case-insensitively.
    pub fn identify(&self, code_or_name: &str) -> Identification {
        let query = code_or_name.trim().to_lowercase();
        if query.is_empty() {
            return Identification::Unidentified;
        }
        self.entries
            .iter()
            .find(|s| s.matches(&query))
            .cloned()
            .map(Identification::Identified)
            .unwrap_or(Identification::Unidentified)
    }
}

pub fn demo_surgeries() -> Vec<SurgeryType> {
    vec![SurgeryType::new("012546", "Cirugía de Cráneo (Neurocirugía)")
        .with_aliases(["craneo", "cráneo", "neurocirugia", "neurocirugía"])]
}
