//! Check_Inventory_And_Order_Status - finalized kit against stock, producing
//! the purchase order

use crate::registry::{ParamSpec, Tool, ToolResult};
use serde_json::Value;
use std::sync::Arc;
use surgikit_core::ToolName;
use surgikit_inventory::{has_content, parse_kit, KitResolver, ReferenceDoc};

pub(crate) const KIT_FORMAT_HINT: &str =
    "Escribe un insumo por línea con la forma '- Nombre (unidad): cantidad'.";
use tracing::debug;

pub struct CheckInventoryTool {
    resolver: Arc<KitResolver>,
}

impl CheckInventoryTool {
    pub fn new(resolver: Arc<KitResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait::async_trait]
impl Tool for CheckInventoryTool {
    fn name(&self) -> ToolName { ToolName::CheckInventoryAndOrderStatus }

    fn description(&self) -> &str {
        "Cruza la lista de insumos FINALIZADA contra el stock actual y genera la Solicitud de Pedido. \
         Solo disponible después de la confirmación del usuario."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required_string(
            "finalized_kit_description",
            "Lista final confirmada, un insumo por línea: '- Nombre (unidad): cantidad'",
        )]
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let description = match args["finalized_kit_description"].as_str() {
            Some(d) => d,
            None => {
                return ToolResult::error("Missing required parameter: finalized_kit_description")
            }
        };

        if let Err(e) = self.resolver.fetch_reference(ReferenceDoc::Inventory).await {
            return ToolResult::error(format!("No se pudo consultar el inventario: {}", e));
        }

        let kit = parse_kit(description);
        debug!("check_inventory: {} items parsed", kit.len());
        if kit.is_empty() && has_content(description) {
            return ToolResult::error(format!(
                "No se reconoció ningún insumo con cantidad en la lista final. {}",
                KIT_FORMAT_HINT
            ));
        }
        let report = self.resolver.check_inventory(&kit);
        ToolResult::text(report.render(self.resolver.quotations_url()))
    }
}
