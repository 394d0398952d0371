//! Run single tools from the command line.
//!
//! Each subcommand maps onto one tool and prints the same text an MCP caller
//! would receive.

use crate::tools::{
    AddPhaseRequest, AddStepRequest, CreateFlowRequest, FlowPhasesRequest, LooseValue, Toolbox,
    UpdateStepTextRequest,
};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ToolCommand {
    /// Authenticate and report the configured project
    Auth,

    /// List flows of the configured project
    Flows,

    /// List phases of a flow
    Phases {
        /// Flow ID
        flow_id: String,
    },

    /// Add a phase to a flow
    AddPhase {
        /// Flow ID
        flow_id: String,
        /// Name of the new phase
        name: String,
        /// Description of the phase
        #[arg(short, long)]
        description: Option<String>,
        /// Position in the flow
        #[arg(short, long, allow_hyphen_values = true)]
        order: Option<String>,
        /// Advance to the next phase automatically
        #[arg(long)]
        auto_advance: bool,
        /// Allow skipping the phase
        #[arg(long)]
        can_be_skipped: bool,
    },

    /// Add a step to a phase
    AddStep {
        /// Phase ID
        phase_id: String,
        /// Name of the new step
        name: String,
        /// Description of the step
        #[arg(short, long)]
        description: Option<String>,
        /// Position in the phase
        #[arg(short, long, allow_hyphen_values = true)]
        order: Option<String>,
        /// Comma-separated thematic blocks (INSTRUCTION, CHECKLIST, FORM, SIGNATURE)
        #[arg(short, long)]
        blocks: Option<String>,
    },

    /// Create a flow
    CreateFlow {
        /// Name of the flow
        name: String,
        /// Project ID (defaults to SITEFLOW_PROJECT_ID)
        #[arg(short, long)]
        project: Option<String>,
        /// CORE, HEAD, GENERIC or FORM
        #[arg(short = 't', long = "type")]
        flow_type: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Family ID (defaults to SITEFLOW_FAMILY_ID)
        #[arg(long)]
        family: Option<String>,
        #[arg(long)]
        family_code: Option<String>,
        #[arg(long)]
        reference: Option<String>,
    },

    /// Replace the text block of a step (HTML allowed)
    UpdateStepText {
        /// Step ID
        step_id: String,
        /// New text content
        text: String,
    },
}

/// Run one tool and print its output. Returns the process exit code.
pub fn run(command: ToolCommand, toolbox: &Toolbox, default_project: &str) -> i32 {
    let output = match command {
        ToolCommand::Auth => toolbox.authenticate(),
        ToolCommand::Flows => toolbox.get_flows(),
        ToolCommand::Phases { flow_id } => toolbox.get_flow_phases(&FlowPhasesRequest { flow_id }),
        ToolCommand::AddPhase {
            flow_id,
            name,
            description,
            order,
            auto_advance,
            can_be_skipped,
        } => toolbox.add_phase_to_flow(&AddPhaseRequest {
            flow_id,
            phase_name: name,
            phase_description: description,
            ordering_number: order.map(LooseValue::Text),
            auto_advance: Some(LooseValue::Bool(auto_advance)),
            can_be_skipped: Some(LooseValue::Bool(can_be_skipped)),
        }),
        ToolCommand::AddStep {
            phase_id,
            name,
            description,
            order,
            blocks,
        } => toolbox.add_step_to_phase(&AddStepRequest {
            phase_id,
            step_name: name,
            step_description: description,
            ordering_number: order.map(LooseValue::Text),
            enabled_thematic_blocks: blocks,
        }),
        ToolCommand::CreateFlow {
            name,
            project,
            flow_type,
            description,
            category,
            family,
            family_code,
            reference,
        } => toolbox.create_flow(&CreateFlowRequest {
            flow_name: name,
            project_id: project.unwrap_or_else(|| default_project.to_string()),
            flow_type,
            description,
            category_id: category,
            family_id: family,
            family_custom_code: family_code,
            reference,
        }),
        ToolCommand::UpdateStepText { step_id, text } => {
            toolbox.update_step_text(&UpdateStepTextRequest {
                step_id,
                text_content: text,
            })
        }
    };

    println!("{}", output);
    if is_failure(&output) { 1 } else { 0 }
}

/// Tool output conventions: failures start with "Failed" or "Error:".
fn is_failure(output: &str) -> bool {
    output.starts_with("Failed to ")
        || output.starts_with("Error: ")
        || output.starts_with("Authentication failed")
}
