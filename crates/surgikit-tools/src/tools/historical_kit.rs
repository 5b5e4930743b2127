//! Get_Historical_Kit - the standard supply kit for a surgery type

use crate::registry::{ParamSpec, Tool, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use surgikit_core::ToolName;
use surgikit_inventory::{KitLookup, KitResolver, ReferenceDoc};

pub struct HistoricalKitTool {
    resolver: Arc<KitResolver>,
}

impl HistoricalKitTool {
    pub fn new(resolver: Arc<KitResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait::async_trait]
impl Tool for HistoricalKitTool {
    fn name(&self) -> ToolName { ToolName::GetHistoricalKit }

    fn description(&self) -> &str {
        "Devuelve el kit de insumos estándar y sus cantidades según el tipo de cirugía. \
         Presenta el kit al usuario y espera su confirmación o sus modificaciones."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required_string(
            "surgery_type",
            "Tipo de cirugía devuelto por Identify_Surgery_Type",
        )]
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let surgery_type = match args["surgery_type"].as_str() {
            Some(s) => s,
            None => return ToolResult::error("Missing required parameter: surgery_type"),
        };

        if let Err(e) = self.resolver.fetch_reference(ReferenceDoc::Historical).await {
            return ToolResult::error(format!("No se pudo consultar el registro histórico: {}", e));
        }

        match self.resolver.get_historical_kit(surgery_type) {
            KitLookup::Found { surgery, kit } => ToolResult::text(kit.render(&surgery.name)),
            KitLookup::NotFound => ToolResult::no_match(format!(
                "No se encontró un kit histórico definido para '{}'. Se requiere definición manual.",
                surgery_type
            )),
        }
    }
}
