//! Tool outputs against a scripted transport.

use siteflow::config::SiteflowConfig;
use siteflow::tools::{
    AddPhaseRequest, AddStepRequest, CreateFlowRequest, FlowPhasesRequest, LooseValue, Toolbox,
    UpdateStepTextRequest,
};
use siteflow_api::test_utils::ScriptedTransport;

const TOKEN: &str = r#"{"accessToken":"tok1"}"#;

fn toolbox() -> (Toolbox, ScriptedTransport) {
    let config = SiteflowConfig::from_lookup(|key| {
        match key {
            "SITEFLOW_SERVER_URL" => Some("https://sf.test"),
            "SITEFLOW_CLIENT_ID" => Some("id"),
            "SITEFLOW_CLIENT_SECRET" => Some("secret"),
            "SITEFLOW_PROJECT_ID" => Some("p1"),
            "SITEFLOW_FAMILY_ID" => Some("fam"),
            _ => None,
        }
        .map(str::to_string)
    })
    .unwrap();
    let transport = ScriptedTransport::new();
    (
        Toolbox::with_transport(&config, Box::new(transport.clone())),
        transport,
    )
}

#[test]
fn test_authenticate_messages() {
    let (tools, transport) = toolbox();
    transport.reply(200, TOKEN).reply(401, "");
    assert_eq!(
        tools.authenticate(),
        "Authentication successful! Working with project ID: p1"
    );
    assert_eq!(
        tools.authenticate(),
        "Authentication failed. Please check your credentials."
    );
}

#[test]
fn test_get_flows_empty_and_failed_look_the_same() {
    let (tools, transport) = toolbox();
    transport
        .reply(200, TOKEN)
        .reply(200, r#"{"data":[]}"#)
        .reply(500, "oops");
    let empty = tools.get_flows();
    let failed = tools.get_flows();
    assert_eq!(empty, "No flows found for project ID: p1");
    assert_eq!(failed, empty);
}

#[test]
fn test_get_flow_phases() {
    let (tools, transport) = toolbox();
    transport.reply(200, TOKEN).reply(
        200,
        r#"{"data":[{"identifier":"ph1","name":"Intake","orderingNumber":1}]}"#,
    );
    let text = tools.get_flow_phases(&FlowPhasesRequest {
        flow_id: "f1".to_string(),
    });
    assert!(text.starts_with("=== Flow Phases for Flow f1 in Project p1 ===\n"));
    assert!(text.contains("1. Intake (ID: ph1, Order: 1)"));
}

#[test]
fn test_add_phase_rejects_bad_ordering_number() {
    let (tools, transport) = toolbox();
    let text = tools.add_phase_to_flow(&AddPhaseRequest {
        flow_id: "f1".to_string(),
        phase_name: "Intake".to_string(),
        ordering_number: Some(LooseValue::Text("two".to_string())),
        ..Default::default()
    });
    assert_eq!(text, "Error: ordering_number must be an integer, got 'two'");
    assert_eq!(transport.sent_count(), 0);
}

#[test]
fn test_add_phase_success() {
    let (tools, transport) = toolbox();
    transport
        .reply(200, TOKEN)
        .reply(201, r#"{"identifier":"ph7"}"#);
    let text = tools.add_phase_to_flow(&AddPhaseRequest {
        flow_id: "f1".to_string(),
        phase_name: "Review".to_string(),
        ordering_number: Some(LooseValue::Text("4".to_string())),
        auto_advance: Some(LooseValue::Text("True".to_string())),
        ..Default::default()
    });
    assert_eq!(
        text,
        "Successfully added phase 'Review' to flow f1.\nPhase ID: ph7\nAuto-advance: true\nCan be skipped: false"
    );
    let body = transport.sent()[1].body.clone().unwrap();
    assert!(body.contains(r#""customOrderingNumber":"4""#));
    assert!(body.contains(r#""usageProperties":{"autoAdvance":true}"#));
}

#[test]
fn test_add_phase_failure_shows_debug_info() {
    let (tools, transport) = toolbox();
    transport
        .reply(200, TOKEN)
        .reply(422, r#"{"message":"name required"}"#);
    let text = tools.add_phase_to_flow(&AddPhaseRequest {
        flow_id: "f1".to_string(),
        phase_name: String::new(),
        ..Default::default()
    });
    assert!(text.starts_with("Failed to add phase to flow: API error: 422\n"));
    assert!(text.contains("Details: {\"message\":\"name required\"}"));
    assert!(text.contains("\nRequest payload: {\"data\":"));
    assert!(text.ends_with("\nRequest URL: https://sf.test/ext/api/2.0/flows/f1/add-phases"));
}

#[test]
fn test_add_step_honors_requested_blocks() {
    let (tools, transport) = toolbox();
    transport.reply(200, TOKEN).reply(201, r#"{"identifier":"s1"}"#);
    let text = tools.add_step_to_phase(&AddStepRequest {
        phase_id: "ph1".to_string(),
        step_name: "Check".to_string(),
        enabled_thematic_blocks: Some("instruction, checklist".to_string()),
        ..Default::default()
    });
    assert!(text.ends_with("Enabled thematic blocks: INSTRUCTION, CHECKLIST"));
    let body = transport.sent()[1].body.clone().unwrap();
    assert!(body.contains(r#""listEnabledThematicBlocks":["INSTRUCTION","CHECKLIST"]"#));
}

#[test]
fn test_add_step_invalid_block_never_hits_network() {
    let (tools, transport) = toolbox();
    let text = tools.add_step_to_phase(&AddStepRequest {
        phase_id: "ph1".to_string(),
        step_name: "Check".to_string(),
        enabled_thematic_blocks: Some("INSTRUCTION,VIDEO".to_string()),
        ..Default::default()
    });
    assert!(text.starts_with("Failed to add step to phase: Invalid thematic block types\n"));
    assert!(text.contains("Invalid block types: VIDEO"));
    assert_eq!(transport.sent_count(), 0);
}

#[test]
fn test_create_flow_bad_type() {
    let (tools, transport) = toolbox();
    let text = tools.create_flow(&CreateFlowRequest {
        flow_name: "Audit".to_string(),
        project_id: "p1".to_string(),
        flow_type: Some("PIPELINE".to_string()),
        ..Default::default()
    });
    assert_eq!(
        text,
        "Error: flow_type must be one of CORE, HEAD, GENERIC, FORM, got 'PIPELINE'"
    );
    assert_eq!(transport.sent_count(), 0);
}

#[test]
fn test_create_flow_success() {
    let (tools, transport) = toolbox();
    transport
        .reply(200, TOKEN)
        .reply(201, r#"[{"identifier":"fl1"}]"#);
    let text = tools.create_flow(&CreateFlowRequest {
        flow_name: "Audit".to_string(),
        project_id: "p2".to_string(),
        ..Default::default()
    });
    assert_eq!(
        text,
        "Successfully created flow 'Audit'.\nFlow ID: fl1\nFlow Type: GENERIC\nProject ID: p2"
    );
    let body = transport.sent()[1].body.clone().unwrap();
    assert!(body.contains(r#""familyIdentifier":"fam""#));
    assert!(body.contains(r#""projectIdentifier":"p2""#));
}

#[test]
fn test_update_step_text() {
    let (tools, transport) = toolbox();
    transport.reply(200, TOKEN).reply(204, "").fail("reset");
    let request = UpdateStepTextRequest {
        step_id: "s1".to_string(),
        text_content: "<b>Wear gloves</b>".to_string(),
    };
    assert_eq!(
        tools.update_step_text(&request),
        "Successfully updated text for step s1."
    );
    let failed = tools.update_step_text(&request);
    assert!(failed.starts_with("Failed to update step text: connection failed: reset\n"));
    assert!(failed.contains("Request URL: https://sf.test/ext/api/2.0/steps/s1/update-text-block"));
}
