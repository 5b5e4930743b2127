//! Tests for surgikit-core: types and errors

use surgikit_core::*;

// ===========================================================================
// SessionKey
// ===========================================================================

#[test]
fn session_key_new_and_display() {
    let key = SessionKey::new("abc-123");
    assert_eq!(key.as_str(), "abc-123");
    assert_eq!(format!("{}", key), "abc-123");
}

#[test]
fn session_key_equality_and_hash() {
    use std::collections::HashSet;
    let a = SessionKey::new("same");
    let b: SessionKey = "same".into();
    let c = SessionKey::from(String::from("different"));
    assert_eq!(a, b);
    assert_ne!(a, c);
    let mut set = HashSet::new();
    set.insert(a.clone());
    assert!(set.contains(&b));
    assert!(!set.contains(&c));
}

// ===========================================================================
// WorkflowStage
// ===========================================================================

#[test]
fn stages_are_ordered_along_the_workflow() {
    assert!(WorkflowStage::Identify < WorkflowStage::Propose);
    assert!(WorkflowStage::Propose < WorkflowStage::AwaitConfirmation);
    assert!(WorkflowStage::AwaitConfirmation < WorkflowStage::Reconcile);
    assert!(WorkflowStage::Reconcile < WorkflowStage::Done);
    assert_eq!(WorkflowStage::default(), WorkflowStage::Identify);
}

#[test]
fn stage_display_uses_upper_case_names() {
    assert_eq!(WorkflowStage::AwaitConfirmation.to_string(), "AWAIT_CONFIRMATION");
    assert_eq!(
        serde_json::to_string(&WorkflowStage::AwaitConfirmation).unwrap(),
        r#""await_confirmation""#
    );
}

// ===========================================================================
// ToolName
// ===========================================================================

#[test]
fn tool_name_parses_wire_names() {
    for tool in ToolName::ALL {
        let parsed: ToolName = tool.as_str().parse().unwrap();
        assert_eq!(parsed, tool);
    }
    assert_eq!(
        "Check_Inventory_And_Order_Status".parse::<ToolName>().unwrap(),
        ToolName::CheckInventoryAndOrderStatus
    );
}

#[test]
fn tool_name_rejects_unknown_names() {
    let err = "Delete_Everything".parse::<ToolName>().unwrap_err();
    assert!(matches!(err, Error::UnknownTool(ref n) if n == "Delete_Everything"));
    // case matters on the wire
    assert!("identify_surgery_type".parse::<ToolName>().is_err());
}

#[test]
fn reconciliation_group_is_the_last_two_tools() {
    assert!(!ToolName::IdentifySurgeryType.is_reconciliation());
    assert!(!ToolName::GetHistoricalKit.is_reconciliation());
    assert!(ToolName::CheckInventoryAndOrderStatus.is_reconciliation());
    assert!(ToolName::UpdateHistoricalData.is_reconciliation());
}

// ===========================================================================
// ToolOutcome / ToolCall / ConversationTurn
// ===========================================================================

#[test]
fn outcome_content_strings() {
    assert_eq!(ToolOutcome::success("ok").to_content_string(), "ok");
    assert_eq!(ToolOutcome::no_match("nothing").to_content_string(), "nothing");
    assert_eq!(
        ToolOutcome::failed(FailureKind::Execution, "boom").to_content_string(),
        "Error: boom"
    );
    let blocked = ToolOutcome::failed(FailureKind::GateBlocked, "wait for the human");
    assert!(blocked.is_failure());
    assert!(blocked.is_gate_blocked());
    assert!(blocked.to_content_string().starts_with("GateBlocked"));
}

#[test]
fn outcome_serializes_with_status_tag() {
    let json = serde_json::to_value(ToolOutcome::failed(FailureKind::InvalidArguments, "x")).unwrap();
    assert_eq!(json["status"], "failed");
    assert_eq!(json["kind"], "invalid_arguments");
}

#[test]
fn tool_call_typed_name() {
    let call = ToolCall::new("tc-1", "Get_Historical_Kit", serde_json::json!({}));
    assert_eq!(call.tool(), Some(ToolName::GetHistoricalKit));
    assert!(call.result.is_none());

    let call = ToolCall::new("tc-2", "nope", serde_json::json!({}))
        .with_result(ToolOutcome::failed(FailureKind::UnknownTool, "nope"));
    assert_eq!(call.tool(), None);
    assert!(call.result.unwrap().is_failure());
}

#[test]
fn turn_constructors_set_roles() {
    assert_eq!(ConversationTurn::user("hola").role, Role::User);
    assert_eq!(ConversationTurn::assistant("hola").role, Role::Assistant);
    let t = ConversationTurn::tool_results(vec![ToolCall::new("a", "b", serde_json::Value::Null)]);
    assert_eq!(t.role, Role::Tool);
    assert!(t.content.is_empty());
    assert_eq!(t.tool_invocations.len(), 1);
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display() {
    let e = Error::invalid_arguments("Get_Historical_Kit", "missing surgery_type");
    assert_eq!(
        e.to_string(),
        "invalid arguments for Get_Historical_Kit: missing surgery_type"
    );
    let e = Error::GateBlocked {
        tool: "Update_Historical_Data".into(),
        stage: WorkflowStage::AwaitConfirmation,
    };
    assert!(e.to_string().contains("AWAIT_CONFIRMATION"));
    assert_eq!(
        Error::MaxToolIterationsExceeded { limit: 8 }.to_string(),
        "max tool iterations exceeded (8)"
    );
}

#[test]
fn turn_aborting_errors() {
    assert!(Error::transport("anthropic", "down").is_turn_abort());
    assert!(Error::MaxToolIterationsExceeded { limit: 1 }.is_turn_abort());
    assert!(!Error::EmptyMessage.is_turn_abort());
    assert!(!Error::Config("x".into()).is_turn_abort());
}

#[test]
fn error_from_io_and_json() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    assert!(matches!(Error::from(io), Error::Io(_)));
    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(Error::from(json), Error::Json(_)));
}
