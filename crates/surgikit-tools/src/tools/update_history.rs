//! Update_Historical_Data - records the final purchase/usage list

use super::inventory::KIT_FORMAT_HINT;
use crate::registry::{ParamSpec, Tool, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use surgikit_core::ToolName;
use surgikit_inventory::{has_content, parse_kit, KitResolver};
use tracing::warn;

pub struct UpdateHistoryTool {
    resolver: Arc<KitResolver>,
}

impl UpdateHistoryTool {
    pub fn new(resolver: Arc<KitResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait::async_trait]
impl Tool for UpdateHistoryTool {
    fn name(&self) -> ToolName { ToolName::UpdateHistoricalData }

    fn description(&self) -> &str {
        "Guarda la lista final de compra y uso para actualizar el registro histórico. \
         Cada llamada agrega un registro nuevo."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required_string(
            "final_purchase_list",
            "Lista final de compra/uso, un insumo por línea: '- Nombre (unidad): cantidad'",
        )]
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let list = match args["final_purchase_list"].as_str() {
            Some(l) => l,
            None => return ToolResult::error("Missing required parameter: final_purchase_list"),
        };

        let kit = parse_kit(list);
        if kit.is_empty() && has_content(list) {
            return ToolResult::error(format!(
                "No se reconoció ningún insumo con cantidad en la lista de compra. {}",
                KIT_FORMAT_HINT
            ));
        }
        let report = (!kit.is_empty()).then(|| self.resolver.check_inventory(&kit));
        match self.resolver.record_usage(&kit, report).await {
            Ok(record) => ToolResult::text(format!(
                "Registro Histórico Actualizado: {} artículos guardados (registro {}).",
                record.items.len(),
                record.id
            )),
            Err(e) => {
                warn!("update_historical_data failed: {}", e);
                ToolResult::error(format!("No se pudo actualizar la data histórica: {}", e))
            }
        }
    }
}
