//! Text rendering of operation results for tool callers.
//!
//! Failures are verbose on purpose: they carry the request URL and payload so
//! the caller can adjust fields the upstream API does not document.

use serde_json::Value;
use siteflow_api::{
    ApiError, Created, Flow, FlowType, Phase, PhaseFieldNames, Step, ThematicBlock,
};
use std::fmt::Write;

/// Strings without quotes, everything else as JSON.
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field(value: &Value, key: &str, fallback: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => fallback.to_string(),
        Some(v) => plain(v),
    }
}

pub fn authentication(success: bool, project_id: &str) -> String {
    if success {
        format!(
            "Authentication successful! Working with project ID: {}",
            project_id
        )
    } else {
        "Authentication failed. Please check your credentials.".to_string()
    }
}

pub fn flows(project_id: &str, flows: &[Flow]) -> String {
    if flows.is_empty() {
        return format!("No flows found for project ID: {}", project_id);
    }
    let mut out = format!("=== Available Flows for Project {} ===\n", project_id);
    for (i, flow) in flows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} (ID: {}, Type: {})",
            i + 1,
            flow.name.as_deref().unwrap_or("Unnamed Flow"),
            flow.identifier.as_deref().unwrap_or("Unknown"),
            flow.flow_type.as_deref().unwrap_or("Unknown Type"),
        );
    }
    out
}

pub fn phases(
    flow_id: &str,
    project_id: &str,
    phases: &[Phase],
    fields: &PhaseFieldNames,
) -> String {
    if phases.is_empty() {
        return format!(
            "No phases found for flow ID: {} in project: {}",
            flow_id, project_id
        );
    }
    let mut out = format!(
        "=== Flow Phases for Flow {} in Project {} ===\n",
        flow_id, project_id
    );
    for (i, phase) in phases.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n{}. {} (ID: {}, Order: {})",
            i + 1,
            phase.name.as_deref().unwrap_or("Unnamed Phase"),
            phase.identifier.as_deref().unwrap_or("Unknown"),
            phase.ordering_number.as_deref().unwrap_or("Unknown"),
        );

        if let Some(mgmt) = &phase.management_properties {
            let _ = writeln!(out, "   Enabled: {}", mgmt.enabled());
            let _ = writeln!(out, "   Auto-advance: {}", mgmt.flag(&fields.auto_advance));
            let _ = writeln!(out, "   Can be skipped: {}", mgmt.flag(&fields.can_be_skipped));
        }

        if let Some(props) = &phase.properties {
            out.push_str("\n   Properties:\n");
            for (key, value) in props {
                let _ = writeln!(out, "     - {}: {}", key, plain(value));
            }
        }

        if !phase.actions.is_empty() {
            out.push_str("\n   Available Actions:\n");
            for action in &phase.actions {
                let _ = writeln!(
                    out,
                    "     - {} (ID: {})",
                    field(action, "name", "Unnamed Action"),
                    field(action, "identifier", "Unknown"),
                );
            }
        }

        if !phase.transitions.is_empty() {
            out.push_str("\n   Transitions:\n");
            for transition in &phase.transitions {
                let _ = writeln!(
                    out,
                    "     - To: {}, Condition: {}",
                    field(transition, "targetPhase", "Unknown"),
                    field(transition, "condition", "No condition"),
                );
            }
        }
    }
    out
}

/// Error line, details, and whatever request context is known.
pub fn failure(action: &str, err: &ApiError) -> String {
    let mut out = format!(
        "Failed to {}: {}\nDetails: {}",
        action,
        err,
        err.details().unwrap_or("No details available")
    );
    if let Some(request) = err.request() {
        if !request.payload.is_empty() {
            let _ = write!(out, "\nRequest payload: {}", request.payload);
        }
        let _ = write!(out, "\nRequest URL: {}", request.url);
    }
    out
}

fn identifier(created: &Created) -> String {
    created.identifier().unwrap_or_else(|| "Unknown".to_string())
}

pub fn phase_added(
    name: &str,
    flow_id: &str,
    created: &Created,
    auto_advance: bool,
    can_be_skipped: bool,
) -> String {
    format!(
        "Successfully added phase '{}' to flow {}.\nPhase ID: {}\nAuto-advance: {}\nCan be skipped: {}",
        name,
        flow_id,
        identifier(created),
        auto_advance,
        can_be_skipped
    )
}

/// Blocks come from the created step when the server echoes them, else from the request.
pub fn step_added(
    name: &str,
    phase_id: &str,
    created: &Created,
    requested: &[ThematicBlock],
) -> String {
    let echoed = created
        .record::<Step>()
        .map(|step| step.thematic_blocks().to_vec())
        .unwrap_or_default();
    let blocks: Vec<String> = if echoed.is_empty() {
        requested.iter().map(|b| b.as_str().to_string()).collect()
    } else {
        echoed
    };
    format!(
        "Successfully added step '{}' to phase {}.\nStep ID: {}\nEnabled thematic blocks: {}",
        name,
        phase_id,
        identifier(created),
        blocks.join(", ")
    )
}

pub fn flow_created(
    name: &str,
    created: &Created,
    flow_type: FlowType,
    project_id: &str,
) -> String {
    format!(
        "Successfully created flow '{}'.\nFlow ID: {}\nFlow Type: {}\nProject ID: {}",
        name,
        identifier(created),
        flow_type,
        project_id
    )
}

pub fn step_text_updated(step_id: &str) -> String {
    format!("Successfully updated text for step {}.", step_id)
}
