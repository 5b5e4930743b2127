//! Surgikit Tools - the four procurement tools and their registry
//!
//! Each tool is a self-contained file in src/tools/ adapting one
//! [`KitResolver`] function.

pub mod registry;
pub mod tools;

pub use registry::{ParamSpec, Tool, ToolRegistry, ToolResult, ToolSchema};
pub use tools::historical_kit::HistoricalKitTool;
pub use tools::identify::IdentifySurgeryTool;
pub use tools::inventory::CheckInventoryTool;
pub use tools::update_history::UpdateHistoryTool;

use std::sync::Arc;
use surgikit_core::Result;
use surgikit_inventory::KitResolver;

/// Create the registry with the four workflow tools, in workflow order.
pub fn create_default_registry(resolver: Arc<KitResolver>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    // --- Identification and proposal ---
    registry.register(IdentifySurgeryTool::new(resolver.clone()))?;
    registry.register(HistoricalKitTool::new(resolver.clone()))?;

    // --- Reconciliation (gated on human confirmation) ---
    registry.register(CheckInventoryTool::new(resolver.clone()))?;
    registry.register(UpdateHistoryTool::new(resolver))?;

    Ok(registry)
}
