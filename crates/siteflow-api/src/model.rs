//! Flows, phases, steps, and the request drafts used to create them.

use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

/// Kind of flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlowType {
    Core,
    Head,
    #[default]
    Generic,
    Form,
}

impl FlowType {
    pub const ALL: [FlowType; 4] = [Self::Core, Self::Head, Self::Generic, Self::Form];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::Head => "HEAD",
            Self::Generic => "GENERIC",
            Self::Form => "FORM",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                ApiError::invalid_argument(
                    "Invalid flow type",
                    format!(
                        "flow_type must be one of CORE, HEAD, GENERIC, FORM, got '{}'",
                        s
                    ),
                )
            })
    }
}

/// Content capability a step can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThematicBlock {
    Instruction,
    Checklist,
    Form,
    Signature,
}

impl ThematicBlock {
    pub const ALL: [ThematicBlock; 4] = [
        Self::Instruction,
        Self::Checklist,
        Self::Form,
        Self::Signature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instruction => "INSTRUCTION",
            Self::Checklist => "CHECKLIST",
            Self::Form => "FORM",
            Self::Signature => "SIGNATURE",
        }
    }

    /// Parse a list of block names, reporting every unknown name at once.
    ///
    /// Duplicates are dropped; order of first appearance is kept.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> ApiResult<Vec<ThematicBlock>> {
        let mut blocks = Vec::new();
        let mut invalid = Vec::new();
        for name in names {
            let name = name.as_ref();
            match Self::ALL.into_iter().find(|b| b.as_str() == name) {
                Some(block) if !blocks.contains(&block) => blocks.push(block),
                Some(_) => {}
                None => invalid.push(name),
            }
        }
        if !invalid.is_empty() {
            let valid: Vec<_> = Self::ALL.iter().map(|b| b.as_str()).collect();
            return Err(ApiError::invalid_argument(
                "Invalid thematic block types",
                format!(
                    "Invalid block types: {}. Valid types are: {}",
                    invalid.join(", "),
                    valid.join(", ")
                ),
            ));
        }
        Ok(blocks)
    }
}

impl fmt::Display for ThematicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream field names for the phase usage flags.
///
/// The API documentation does not show these fields, so they can be overridden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseFieldNames {
    pub auto_advance: String,
    pub can_be_skipped: String,
}

impl Default for PhaseFieldNames {
    fn default() -> Self {
        Self {
            auto_advance: "autoAdvance".to_string(),
            can_be_skipped: "canBeSkipped".to_string(),
        }
    }
}

/// Accept identifiers, names and ordering numbers sent as strings, numbers or null.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Decode if the value has the expected shape; anything else reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Lists that may arrive as null or in an unexpected shape read as empty.
fn list_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    lenient::<D, Vec<T>>(deserializer).map(Option::unwrap_or_default)
}

/// A workflow definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(default, deserialize_with = "string_or_number")]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "string_or_number")]
    pub flow_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub description: Option<String>,
    #[serde(default, alias = "category", deserialize_with = "string_or_number")]
    pub category_identifier: Option<String>,
    #[serde(default, alias = "family", deserialize_with = "string_or_number")]
    pub family_identifier: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub reference: Option<String>,
}

/// Enablement flags of a phase. Flags other than `isEnabled` are kept by name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementProperties {
    #[serde(default, deserialize_with = "lenient")]
    pub is_enabled: Option<bool>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ManagementProperties {
    pub fn enabled(&self) -> bool {
        self.is_enabled.unwrap_or(false)
    }

    /// Boolean flag by upstream field name; missing or non-boolean is false.
    pub fn flag(&self, field: &str) -> bool {
        self.other.get(field).and_then(Value::as_bool).unwrap_or(false)
    }
}

/// A stage within a flow. Actions and transitions are passed through untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[serde(default, deserialize_with = "string_or_number")]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub ordering_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub management_properties: Option<ManagementProperties>,
    #[serde(default, deserialize_with = "lenient")]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub actions: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub transitions: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepManagementProperties {
    #[serde(default, deserialize_with = "list_or_empty")]
    pub list_enabled_thematic_blocks: Vec<String>,
}

/// A unit of work within a phase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default, deserialize_with = "string_or_number")]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub ordering_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub management_properties: Option<StepManagementProperties>,
    #[serde(default, alias = "description", deserialize_with = "string_or_number")]
    pub internal_information: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub text_block: Option<String>,
}

impl Step {
    pub fn thematic_blocks(&self) -> &[String] {
        self.management_properties
            .as_ref()
            .map(|m| m.list_enabled_thematic_blocks.as_slice())
            .unwrap_or(&[])
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A new phase to append to a flow.
#[derive(Debug, Clone, Default)]
pub struct PhaseDraft {
    pub flow_id: String,
    pub name: String,
    pub description: Option<String>,
    pub ordering_number: Option<i64>,
    pub auto_advance: bool,
    pub can_be_skipped: bool,
}

impl PhaseDraft {
    pub fn new(flow_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            flow_id: flow_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Single-item body; the client wraps it in the bulk envelope.
    pub fn to_item(&self, fields: &PhaseFieldNames) -> Value {
        let mut item = json!({
            "name": self.name,
            "managementProperties": { "isEnabled": true },
        });
        if let Some(description) = non_empty(&self.description) {
            item["internalInformation"] = json!(description);
        }
        if let Some(n) = self.ordering_number {
            item["customOrderingNumber"] = json!(n.to_string());
        }
        if self.auto_advance || self.can_be_skipped {
            let mut usage = Map::new();
            if self.auto_advance {
                usage.insert(fields.auto_advance.clone(), Value::Bool(true));
            }
            if self.can_be_skipped {
                usage.insert(fields.can_be_skipped.clone(), Value::Bool(true));
            }
            item["usageProperties"] = Value::Object(usage);
        }
        item
    }
}

/// A new step to append to a phase.
#[derive(Debug, Clone, Default)]
pub struct StepDraft {
    pub phase_id: String,
    pub name: String,
    pub description: Option<String>,
    pub ordering_number: Option<i64>,
    /// Raw block names; validated by the client. Empty means `[INSTRUCTION]`.
    pub thematic_blocks: Vec<String>,
}

impl StepDraft {
    pub fn new(phase_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            phase_id: phase_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Validated block set, defaulting to instruction-only.
    pub fn blocks(&self) -> ApiResult<Vec<ThematicBlock>> {
        if self.thematic_blocks.is_empty() {
            return Ok(vec![ThematicBlock::Instruction]);
        }
        ThematicBlock::parse_list(&self.thematic_blocks)
    }

    pub fn to_item(&self, blocks: &[ThematicBlock]) -> Value {
        let mut item = json!({
            "name": self.name,
            "managementProperties": { "listEnabledThematicBlocks": blocks },
        });
        if let Some(description) = non_empty(&self.description) {
            item["internalInformation"] = json!(description);
        }
        if let Some(n) = self.ordering_number {
            item["customOrderingNumber"] = json!(n.to_string());
        }
        item
    }
}

/// A new flow inside a project.
#[derive(Debug, Clone, Default)]
pub struct FlowDraft {
    pub name: String,
    pub project_id: String,
    /// Raw type name; validated by the client. `None` means GENERIC.
    pub flow_type: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    /// Falls back to the session's family when `None`.
    pub family_id: Option<String>,
    pub family_custom_code: Option<String>,
    pub reference: Option<String>,
}

impl FlowDraft {
    pub fn new(name: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: project_id.into(),
            ..Default::default()
        }
    }

    pub fn resolved_type(&self) -> ApiResult<FlowType> {
        match non_empty(&self.flow_type) {
            Some(name) => name.parse(),
            None => Ok(FlowType::default()),
        }
    }

    pub fn to_item(&self, flow_type: FlowType, family_id: Option<&str>) -> Value {
        let mut properties = json!({
            "name": self.name,
            "type": flow_type,
        });
        let optional = [
            ("description", non_empty(&self.description)),
            ("categoryIdentifier", non_empty(&self.category_id)),
            ("familyIdentifier", family_id.filter(|f| !f.is_empty())),
            ("familyCustomCode", non_empty(&self.family_custom_code)),
            ("reference", non_empty(&self.reference)),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                properties[key] = json!(value);
            }
        }
        json!({
            "flowProperties": properties,
            "projectIdentifier": self.project_id,
        })
    }
}

/// Decoded body of a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub payload: Value,
}

impl Created {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }

    /// First record in the payload: the object itself, the first array
    /// element, or the first element of a `data` array.
    pub fn first(&self) -> Option<&Value> {
        match &self.payload {
            Value::Array(items) => items.first(),
            Value::Object(map) => match map.get("data") {
                Some(Value::Array(items)) => items.first(),
                _ => Some(&self.payload),
            },
            _ => None,
        }
    }

    /// Server-assigned identifier of the first record.
    pub fn identifier(&self) -> Option<String> {
        match self.first()?.get("identifier")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn record<T: DeserializeOwned>(&self) -> Option<T> {
        self.first()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Result of a read. Lets callers tell "nothing there" from "could not look".
#[derive(Debug, Clone)]
pub enum Listing<T> {
    Found(Vec<T>),
    Unavailable(ApiError),
}

impl<T> Listing<T> {
    /// Collapse to a plain list; failures read as empty.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Found(items) => items,
            Listing::Unavailable(_) => Vec::new(),
        }
    }

    pub fn reason(&self) -> Option<&ApiError> {
        match self {
            Listing::Found(_) => None,
            Listing::Unavailable(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_type_parse() {
        assert_eq!("HEAD".parse::<FlowType>().unwrap(), FlowType::Head);
        let err = "generic".parse::<FlowType>().unwrap_err();
        assert!(err.details().unwrap().contains("got 'generic'"));
    }

    #[test]
    fn test_thematic_blocks_reports_all_invalid() {
        let err = ThematicBlock::parse_list(&["INSTRUCTION", "VIDEO", "AUDIO"]).unwrap_err();
        let details = err.details().unwrap();
        assert!(details.contains("Invalid block types: VIDEO, AUDIO"));
        assert!(details.contains("INSTRUCTION, CHECKLIST, FORM, SIGNATURE"));
    }

    #[test]
    fn test_thematic_blocks_dedup() {
        let blocks = ThematicBlock::parse_list(&["FORM", "CHECKLIST", "FORM"]).unwrap();
        assert_eq!(blocks, vec![ThematicBlock::Form, ThematicBlock::Checklist]);
    }

    #[test]
    fn test_phase_item_minimal() {
        let item = PhaseDraft::new("f1", "Intake").to_item(&PhaseFieldNames::default());
        assert_eq!(
            item,
            json!({"name": "Intake", "managementProperties": {"isEnabled": true}})
        );
    }

    #[test]
    fn test_phase_item_only_true_flags() {
        let draft = PhaseDraft {
            can_be_skipped: true,
            ordering_number: Some(-3),
            description: Some("notes".to_string()),
            ..PhaseDraft::new("f1", "Review")
        };
        let item = draft.to_item(&PhaseFieldNames::default());
        assert_eq!(item["usageProperties"], json!({"canBeSkipped": true}));
        assert_eq!(item["customOrderingNumber"], "-3");
        assert_eq!(item["internalInformation"], "notes");
    }

    #[test]
    fn test_phase_item_custom_field_names() {
        let fields = PhaseFieldNames {
            auto_advance: "isAutoAdvanced".to_string(),
            can_be_skipped: "skippable".to_string(),
        };
        let draft = PhaseDraft {
            auto_advance: true,
            can_be_skipped: true,
            ..PhaseDraft::new("f1", "Review")
        };
        assert_eq!(
            draft.to_item(&fields)["usageProperties"],
            json!({"isAutoAdvanced": true, "skippable": true})
        );
    }

    #[test]
    fn test_flow_item_skips_empty_optionals() {
        let draft = FlowDraft {
            description: Some(String::new()),
            reference: Some("REF-1".to_string()),
            ..FlowDraft::new("Audit", "p1")
        };
        let item = draft.to_item(FlowType::Form, Some("fam"));
        assert_eq!(
            item,
            json!({
                "flowProperties": {
                    "name": "Audit",
                    "type": "FORM",
                    "familyIdentifier": "fam",
                    "reference": "REF-1"
                },
                "projectIdentifier": "p1"
            })
        );
    }

    #[test]
    fn test_phase_deserialize_lenient() {
        let phase: Phase = serde_json::from_value(json!({
            "identifier": 42,
            "name": "Intake",
            "orderingNumber": "2",
            "managementProperties": {"isEnabled": true, "autoAdvance": true},
            "actions": [{"name": "Approve", "identifier": "a1"}]
        }))
        .unwrap();
        assert_eq!(phase.identifier.as_deref(), Some("42"));
        assert_eq!(phase.ordering_number.as_deref(), Some("2"));
        let mgmt = phase.management_properties.unwrap();
        assert!(mgmt.enabled());
        assert!(mgmt.flag("autoAdvance"));
        assert!(!mgmt.flag("canBeSkipped"));
        assert_eq!(phase.actions.len(), 1);
    }

    #[test]
    fn test_odd_shapes_read_as_absent() {
        let phase: Phase = serde_json::from_value(json!({
            "identifier": "ph2",
            "name": null,
            "managementProperties": {"isEnabled": "yes"},
            "properties": [],
            "actions": null,
            "transitions": {"next": "ph3"}
        }))
        .unwrap();
        assert!(phase.name.is_none());
        assert!(!phase.management_properties.unwrap().enabled());
        assert!(phase.properties.is_none());
        assert!(phase.actions.is_empty());
        assert!(phase.transitions.is_empty());

        let flow: Flow = serde_json::from_value(json!({
            "identifier": 7,
            "name": "Audit",
            "description": {"en": "Yearly audit"},
            "reference": 2024
        }))
        .unwrap();
        assert_eq!(flow.description.as_deref(), Some(r#"{"en":"Yearly audit"}"#));
        assert_eq!(flow.reference.as_deref(), Some("2024"));

        let step: Step = serde_json::from_value(json!({
            "managementProperties": {"listEnabledThematicBlocks": null}
        }))
        .unwrap();
        assert!(step.thematic_blocks().is_empty());
    }

    #[test]
    fn test_created_identifier_shapes() {
        assert_eq!(
            Created::new(json!({"identifier": "x1"})).identifier(),
            Some("x1".to_string())
        );
        assert_eq!(
            Created::new(json!([{"identifier": 7}])).identifier(),
            Some("7".to_string())
        );
        assert_eq!(
            Created::new(json!({"data": [{"identifier": "d1"}]})).identifier(),
            Some("d1".to_string())
        );
        assert_eq!(Created::empty().identifier(), None);
    }

    #[test]
    fn test_created_step_record() {
        let created = Created::new(json!([{
            "identifier": "s1",
            "name": "Check",
            "customOrderingNumber": "3",
            "managementProperties": {"listEnabledThematicBlocks": ["INSTRUCTION", "FORM"]},
            "internalInformation": "notes"
        }]));
        let step: Step = created.record().unwrap();
        assert_eq!(step.name.as_deref(), Some("Check"));
        assert_eq!(step.thematic_blocks(), ["INSTRUCTION", "FORM"]);
        assert_eq!(step.internal_information.as_deref(), Some("notes"));
        assert!(step.text_block.is_none());
    }
}
