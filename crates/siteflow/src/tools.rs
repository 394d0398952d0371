//! Tool surface: loosely typed arguments in, formatted text out.
//!
//! Each tool converts caller arguments (often strings, even for numbers and
//! flags) into typed drafts, runs one client operation, and renders the result
//! with [`crate::format`].

use crate::config::SiteflowConfig;
use crate::format;
use schemars::JsonSchema;
use serde::Deserialize;
use siteflow_api::{
    ApiError, FlowDraft, PhaseDraft, Session, SiteflowClient, StepDraft, Transport,
    UreqTransport,
};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// Client over any transport, as shared by the tools.
pub type SharedClient = SiteflowClient<Box<dyn Transport>>;

/// A number or flag that may arrive as JSON or as text.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum LooseValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl LooseValue {
    /// Integer value, or the message shown to the caller.
    pub fn as_integer(&self, name: &str) -> Result<i64, String> {
        let invalid = |got: &str| format!("Error: {} must be an integer, got '{}'", name, got);
        match self {
            LooseValue::Int(n) => Ok(*n),
            LooseValue::Text(s) => s.trim().parse().map_err(|_| invalid(s)),
            LooseValue::Bool(b) => Err(invalid(&b.to_string())),
        }
    }

    /// Only `true` (any case) counts as set.
    pub fn as_flag(&self) -> bool {
        match self {
            LooseValue::Bool(b) => *b,
            LooseValue::Int(n) => *n != 0,
            LooseValue::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }
}

fn integer(value: &Option<LooseValue>, name: &str) -> Result<Option<i64>, String> {
    value.as_ref().map(|v| v.as_integer(name)).transpose()
}

fn flag(value: &Option<LooseValue>) -> bool {
    value.as_ref().is_some_and(LooseValue::as_flag)
}

/// Split "INSTRUCTION, checklist" into upper-cased names.
pub fn split_blocks(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(|block| block.trim().to_uppercase())
            .filter(|block| !block.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct FlowPhasesRequest {
    /// ID of the flow to get phases for
    pub flow_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AddPhaseRequest {
    /// ID of the flow to add the phase to
    pub flow_id: String,
    /// Name of the new phase
    pub phase_name: String,
    /// Optional description of the phase
    #[serde(default)]
    pub phase_description: Option<String>,
    /// Optional ordering number for the phase (position in the flow)
    #[serde(default)]
    pub ordering_number: Option<LooseValue>,
    /// Whether the phase should automatically advance to the next phase
    #[serde(default)]
    pub auto_advance: Option<LooseValue>,
    /// Whether the phase can be skipped
    #[serde(default)]
    pub can_be_skipped: Option<LooseValue>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AddStepRequest {
    /// ID of the phase to add the step to
    pub phase_id: String,
    /// Name of the new step
    pub step_name: String,
    /// Optional description of the step
    #[serde(default)]
    pub step_description: Option<String>,
    /// Optional ordering number for the step (position in the phase)
    #[serde(default)]
    pub ordering_number: Option<LooseValue>,
    /// Comma-separated thematic blocks: INSTRUCTION, CHECKLIST, FORM, SIGNATURE.
    /// Example: "INSTRUCTION,CHECKLIST". Defaults to INSTRUCTION.
    #[serde(default)]
    pub enabled_thematic_blocks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct CreateFlowRequest {
    /// Name of the flow
    pub flow_name: String,
    /// ID of the project to create the flow in
    pub project_id: String,
    /// Type of flow (CORE, HEAD, GENERIC, FORM), defaults to GENERIC
    #[serde(default)]
    pub flow_type: Option<String>,
    /// Optional description of the flow
    #[serde(default)]
    pub description: Option<String>,
    /// Optional category identifier
    #[serde(default)]
    pub category_id: Option<String>,
    /// Optional family identifier (defaults to SITEFLOW_FAMILY_ID)
    #[serde(default)]
    pub family_id: Option<String>,
    /// Optional family custom code
    #[serde(default)]
    pub family_custom_code: Option<String>,
    /// Optional reference
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UpdateStepTextRequest {
    /// ID of the step to update
    pub step_id: String,
    /// New text content for the step. May include HTML formatting.
    pub text_content: String,
}

/// The tool set over one shared client. Calls are serialized by a mutex.
#[derive(Clone)]
pub struct Toolbox {
    client: Arc<Mutex<SharedClient>>,
}

impl Toolbox {
    pub fn new(client: SharedClient) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
        }
    }

    /// Toolbox over a real HTTP connection.
    pub fn from_config(config: &SiteflowConfig) -> Self {
        Self::with_transport(config, Box::new(UreqTransport::new()))
    }

    pub fn with_transport(config: &SiteflowConfig, transport: Box<dyn Transport>) -> Self {
        let session = Session::new(config.session_config());
        let client = SiteflowClient::new(session, transport)
            .with_phase_fields(config.phase_fields.clone());
        Self::new(client)
    }

    fn with_client<R>(&self, call: impl FnOnce(&mut SharedClient) -> R) -> R {
        let mut client = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        call(&mut client)
    }

    /// Always performs a fresh authentication exchange.
    pub fn authenticate(&self) -> String {
        self.with_client(|client| {
            let success = client.authenticate();
            format::authentication(success, client.session().project_id())
        })
    }

    pub fn get_flows(&self) -> String {
        self.with_client(|client| {
            let listing = client.flows();
            if let Some(reason) = listing.reason() {
                warn!(error = %reason, "flows unavailable");
            }
            let project_id = client.session().project_id().to_string();
            format::flows(&project_id, &listing.into_items())
        })
    }

    pub fn get_flow_phases(&self, request: &FlowPhasesRequest) -> String {
        self.with_client(|client| {
            let listing = client.flow_phases(&request.flow_id);
            if let Some(reason) = listing.reason() {
                warn!(flow = %request.flow_id, error = %reason, "phases unavailable");
            }
            let project_id = client.session().project_id().to_string();
            format::phases(
                &request.flow_id,
                &project_id,
                &listing.into_items(),
                client.phase_fields(),
            )
        })
    }

    pub fn add_phase_to_flow(&self, request: &AddPhaseRequest) -> String {
        let ordering_number = match integer(&request.ordering_number, "ordering_number") {
            Ok(n) => n,
            Err(message) => return message,
        };
        let draft = PhaseDraft {
            description: request.phase_description.clone(),
            ordering_number,
            auto_advance: flag(&request.auto_advance),
            can_be_skipped: flag(&request.can_be_skipped),
            ..PhaseDraft::new(&request.flow_id, &request.phase_name)
        };

        match self.with_client(|client| client.add_phase_to_flow(&draft)) {
            Ok(created) => format::phase_added(
                &draft.name,
                &draft.flow_id,
                &created,
                draft.auto_advance,
                draft.can_be_skipped,
            ),
            Err(e) => format::failure("add phase to flow", &e),
        }
    }

    pub fn add_step_to_phase(&self, request: &AddStepRequest) -> String {
        let ordering_number = match integer(&request.ordering_number, "ordering_number") {
            Ok(n) => n,
            Err(message) => return message,
        };
        let draft = StepDraft {
            description: request.step_description.clone(),
            ordering_number,
            thematic_blocks: split_blocks(request.enabled_thematic_blocks.as_deref()),
            ..StepDraft::new(&request.phase_id, &request.step_name)
        };

        let outcome = self.with_client(|client| client.add_step_to_phase(&draft));
        match outcome.and_then(|created| Ok((created, draft.blocks()?))) {
            Ok((created, blocks)) => {
                format::step_added(&draft.name, &draft.phase_id, &created, &blocks)
            }
            Err(e) => format::failure("add step to phase", &e),
        }
    }

    pub fn create_flow(&self, request: &CreateFlowRequest) -> String {
        let draft = FlowDraft {
            flow_type: request.flow_type.clone(),
            description: request.description.clone(),
            category_id: request.category_id.clone(),
            family_id: request.family_id.clone().filter(|f| !f.is_empty()),
            family_custom_code: request.family_custom_code.clone(),
            reference: request.reference.clone(),
            ..FlowDraft::new(&request.flow_name, &request.project_id)
        };
        let flow_type = match draft.resolved_type() {
            Ok(flow_type) => flow_type,
            Err(ApiError::InvalidArgument { details, .. }) => return format!("Error: {}", details),
            Err(e) => return format::failure("create flow", &e),
        };

        match self.with_client(|client| client.create_flow(&draft)) {
            Ok(created) => {
                format::flow_created(&draft.name, &created, flow_type, &draft.project_id)
            }
            Err(e) => format::failure("create flow", &e),
        }
    }

    pub fn update_step_text(&self, request: &UpdateStepTextRequest) -> String {
        let outcome = self
            .with_client(|client| client.update_step_text(&request.step_id, &request.text_content));
        match outcome {
            Ok(_) => format::step_text_updated(&request.step_id),
            Err(e) => format::failure("update step text", &e),
        }
    }
}
