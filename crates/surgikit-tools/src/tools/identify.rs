//! Identify_Surgery_Type - FONASA code or surgery name to a surgery type

use crate::registry::{ParamSpec, Tool, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use surgikit_core::ToolName;
use surgikit_inventory::{Identification, KitResolver};
use tracing::debug;

pub struct IdentifySurgeryTool {
    resolver: Arc<KitResolver>,
}

impl IdentifySurgeryTool {
    pub fn new(resolver: Arc<KitResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait::async_trait]
impl Tool for IdentifySurgeryTool {
    fn name(&self) -> ToolName { ToolName::IdentifySurgeryType }

    fn description(&self) -> &str {
        "Identifica el tipo de cirugía asociado a un código FONASA o a un nombre descriptivo."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required_string(
            "code_or_name",
            "Código FONASA (ej: 012546) o nombre de la cirugía",
        )]
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let query = match args["code_or_name"].as_str() {
            Some(q) => q,
            None => return ToolResult::error("Missing required parameter: code_or_name"),
        };

        match self.resolver.identify_surgery(query) {
            Identification::Identified(surgery) => {
                debug!("identified '{}' as {}", query, surgery.code);
                ToolResult::text(format!(
                    "Cirugía identificada: {} (código FONASA {})",
                    surgery.name, surgery.code
                ))
            }
            Identification::Unidentified => ToolResult::no_match(format!(
                "No se pudo identificar la cirugía para '{}'. Cirugía Genérica (Requerida Definición Manual): \
                 pide al usuario un código FONASA o nombre más preciso.",
                query
            )),
        }
    }
}
