//! Tests for surgikit-tools: ToolResult, ToolRegistry validation, and the four
//! workflow tools against the demo resolver

use serde_json::json;
use std::sync::Arc;
use surgikit_core::{Error, FailureKind, ToolName, ToolOutcome};
use surgikit_inventory::{KitResolver, ReferenceUrls};
use surgikit_tools::*;

fn demo_registry() -> (Arc<KitResolver>, ToolRegistry) {
    let resolver = Arc::new(KitResolver::demo());
    let registry = create_default_registry(resolver.clone()).unwrap();
    (resolver, registry)
}

// ===========================================================================
// ToolResult
// ===========================================================================

#[test]
fn tool_result_text() {
    let r = ToolResult::text("hola");
    assert!(!r.is_error());
    assert_eq!(r.to_content_string(), "hola");
    assert_eq!(r.into_outcome(), ToolOutcome::success("hola"));
}

#[test]
fn tool_result_error() {
    let r = ToolResult::error("boom");
    assert!(r.is_error());
    assert_eq!(r.to_content_string(), "Error: boom");
    assert_eq!(r.into_outcome(), ToolOutcome::failed(FailureKind::Execution, "boom"));
}

#[test]
fn tool_result_no_match_is_not_a_failure() {
    let outcome = ToolResult::no_match("nada").into_outcome();
    assert!(!outcome.is_failure());
    assert_eq!(outcome, ToolOutcome::no_match("nada"));
}

// ===========================================================================
// ToolRegistry
// ===========================================================================

#[test]
fn registry_default_is_empty() {
    let reg = ToolRegistry::new();
    assert!(reg.is_empty());
    assert!(reg.get_definitions().is_empty());
    assert!(matches!(
        reg.resolve(ToolName::GetHistoricalKit),
        Err(Error::UnknownTool(_))
    ));
}

#[test]
fn default_registry_lists_tools_in_workflow_order() {
    let (_, reg) = demo_registry();
    assert_eq!(
        reg.list(),
        vec![
            "Identify_Surgery_Type",
            "Get_Historical_Kit",
            "Check_Inventory_And_Order_Status",
            "Update_Historical_Data",
        ]
    );
    let schemas = reg.list_schemas();
    assert_eq!(schemas[1].name, ToolName::GetHistoricalKit);
    assert_eq!(schemas[1].parameters[0].name, "surgery_type");
    assert!(!schemas[1].description.is_empty());
}

#[test]
fn duplicate_registration_fails() {
    let resolver = Arc::new(KitResolver::demo());
    let mut reg = ToolRegistry::new();
    reg.register(IdentifySurgeryTool::new(resolver.clone())).unwrap();
    let err = reg.register(IdentifySurgeryTool::new(resolver)).unwrap_err();
    assert!(matches!(err, Error::DuplicateTool(ref n) if n == "Identify_Surgery_Type"));
    assert_eq!(reg.len(), 1);
}

#[test]
fn unknown_wire_names_never_reach_the_registry() {
    let (_, reg) = demo_registry();
    let name: ToolName = "Update_Historical_Data".parse().unwrap();
    assert!(reg.resolve(name).is_ok());
    assert!(matches!("bash".parse::<ToolName>(), Err(Error::UnknownTool(_))));
}

#[test]
fn definitions_carry_json_schema() {
    let (_, reg) = demo_registry();
    let defs = reg.get_definitions();
    assert_eq!(defs.len(), 4);
    let check = &defs[2];
    assert_eq!(check.name, "Check_Inventory_And_Order_Status");
    assert_eq!(check.input_schema["type"], "object");
    assert_eq!(
        check.input_schema["properties"]["finalized_kit_description"]["type"],
        "string"
    );
    assert_eq!(check.input_schema["required"], json!(["finalized_kit_description"]));
}

#[test]
fn validate_accepts_well_formed_arguments() {
    let (_, reg) = demo_registry();
    reg.validate(ToolName::IdentifySurgeryType, &json!({"code_or_name": "012546"}))
        .unwrap();
}

#[test]
fn validate_rejects_missing_wrong_type_and_unknown() {
    let (_, reg) = demo_registry();
    let name = ToolName::GetHistoricalKit;
    for args in [
        json!({}),
        json!({"surgery_type": null}),
        json!({"surgery_type": 12}),
        json!({"surgery_type": "craneo", "urgent": true}),
        json!("surgery_type=craneo"),
    ] {
        let err = reg.validate(name, &args).unwrap_err();
        assert!(
            matches!(err, Error::InvalidArguments { ref tool, .. } if tool == "Get_Historical_Kit"),
            "args {} gave {:?}",
            args,
            err
        );
    }
}

// ===========================================================================
// Workflow tools
// ===========================================================================

#[tokio::test]
async fn identify_tool_resolves_code_and_name() {
    let (_, reg) = demo_registry();
    let tool = reg.resolve(ToolName::IdentifySurgeryType).unwrap();
    let by_code = tool.execute(json!({"code_or_name": "012546"})).await;
    let by_name = tool.execute(json!({"code_or_name": "craneo"})).await;
    assert_eq!(by_code.to_content_string(), by_name.to_content_string());
    assert!(by_code.to_content_string().contains("Cirugía de Cráneo (Neurocirugía)"));
}

#[tokio::test]
async fn identify_tool_unknown_is_no_match() {
    let (_, reg) = demo_registry();
    let tool = reg.resolve(ToolName::IdentifySurgeryType).unwrap();
    let r = tool.execute(json!({"code_or_name": "unknown-code"})).await;
    assert!(matches!(r, ToolResult::NoMatch(_)));
}

#[tokio::test]
async fn historical_kit_tool_renders_demo_kit() {
    let (_, reg) = demo_registry();
    let tool = reg.resolve(ToolName::GetHistoricalKit).unwrap();
    let r = tool
        .execute(json!({"surgery_type": "Cirugía de Cráneo (Neurocirugía)"}))
        .await;
    let text = r.to_content_string();
    assert!(text.contains("- Suturas de Nylon (unidades): 20"));
    assert!(text.contains("- Gasa Quirúrgica (paquetes): 8"));

    let missing = tool.execute(json!({"surgery_type": "Apendicectomía"})).await;
    assert!(matches!(missing, ToolResult::NoMatch(ref s) if s.contains("definición manual")));
}

#[tokio::test]
async fn check_inventory_tool_reports_deficits() {
    let (_, reg) = demo_registry();
    let tool = reg.resolve(ToolName::CheckInventoryAndOrderStatus).unwrap();
    let r = tool
        .execute(json!({
            "finalized_kit_description": "- Suturas de Nylon (unidades): 20\n- Grapas Quirúrgicas (unidades): 10\n- Gasa Quirúrgica (paquetes): 8"
        }))
        .await;
    let text = r.to_content_string();
    assert!(!r.is_error());
    assert!(text.contains("Suturas de Nylon: Faltan 5 unidades"));
    assert!(text.contains("Grapas Quirúrgicas: Faltan 5 unidades"));
    assert!(!text.contains("Gasa Quirúrgica: Faltan"));
}

#[tokio::test]
async fn check_inventory_tool_rejects_unreadable_lists() {
    let (_, reg) = demo_registry();
    let tool = reg.resolve(ToolName::CheckInventoryAndOrderStatus).unwrap();
    let r = tool
        .execute(json!({"finalized_kit_description": "Confirmo el kit propuesto tal cual"}))
        .await;
    assert!(r.is_error());
    assert!(r.to_content_string().contains("- Nombre (unidad): cantidad"));
    assert!(!r.to_content_string().contains("no se requiere pedido"));

    // an empty list is still a valid, empty reconciliation
    let empty = tool.execute(json!({"finalized_kit_description": "  "})).await;
    assert!(!empty.is_error());
    assert!(empty.to_content_string().contains("no contiene artículos"));
}

#[tokio::test]
async fn check_inventory_tool_reads_loosely_typed_edits() {
    let (_, reg) = demo_registry();
    let tool = reg.resolve(ToolName::CheckInventoryAndOrderStatus).unwrap();
    let r = tool
        .execute(json!({
            "finalized_kit_description": "Suturas de Nylon - 20 unidades\nGrapas Quirúrgicas 10 unidades"
        }))
        .await;
    assert!(!r.is_error());
    let text = r.to_content_string();
    assert!(text.contains("Suturas de Nylon: Faltan 5 unidades"));
    assert!(text.contains("Grapas Quirúrgicas: Faltan 5 unidades"));
}

#[tokio::test]
async fn update_history_tool_refuses_unreadable_lists() {
    let (resolver, reg) = demo_registry();
    let tool = reg.resolve(ToolName::UpdateHistoricalData).unwrap();
    let r = tool
        .execute(json!({"final_purchase_list": "la misma lista de antes"}))
        .await;
    assert!(r.is_error());
    assert!(r.to_content_string().contains("- Nombre (unidad): cantidad"));
    assert!(resolver.ledger().records().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_history_tool_records_and_rejects_empty() {
    let (resolver, reg) = demo_registry();
    let tool = reg.resolve(ToolName::UpdateHistoricalData).unwrap();

    let ok = tool
        .execute(json!({"final_purchase_list": "- Suturas de Nylon (unidades): 5\n- Grapas Quirúrgicas (unidades): 5"}))
        .await;
    assert!(ok.to_content_string().starts_with("Registro Histórico Actualizado: 2 artículos"));

    let empty = tool.execute(json!({"final_purchase_list": ""})).await;
    assert!(empty.is_error());

    let records = resolver.ledger().records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].report.as_ref().map(|r| r.has_deficit), Some(false));
}

struct DownFetcher;

#[async_trait::async_trait]
impl surgikit_inventory::ReferenceFetcher for DownFetcher {
    async fn fetch(&self, url: &str) -> surgikit_inventory::InventoryResult<bytes::Bytes> {
        Err(surgikit_inventory::InventoryError::fetch(url, "unreachable"))
    }
}

#[tokio::test]
async fn reference_failure_becomes_tool_error() {
    let resolver = Arc::new(KitResolver::demo().with_reference(Arc::new(DownFetcher), ReferenceUrls::default()));
    let reg = create_default_registry(resolver).unwrap();
    let r = reg
        .resolve(ToolName::GetHistoricalKit)
        .unwrap()
        .execute(json!({"surgery_type": "craneo"}))
        .await;
    assert!(r.is_error());
    assert!(r.to_content_string().contains("unreachable"));
}
