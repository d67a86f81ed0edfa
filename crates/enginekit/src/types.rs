//! Platform resource types.
//!
//! These mirror the JSON shapes of the Discovery Engine API closely enough to
//! round-trip them. Fields the tool does not interpret are kept in the
//! flattened `extra` maps so nothing is lost when a resource is read, stored
//! in a snapshot and written back.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Open-ended JSON object, ordered by key.
pub type JsonMap = BTreeMap<String, Value>;

/// Feature state value for an enabled flag.
pub const FEATURE_STATE_ON: &str = "FEATURE_STATE_ON";
/// Feature state value for a disabled flag.
pub const FEATURE_STATE_OFF: &str = "FEATURE_STATE_OFF";

/// Feature flags recognized by the platform.
///
/// Only used to tell a feature name from an engine ID on the command line.
pub const KNOWN_FEATURES: &[&str] = &[
    "*",
    "agent-gallery",
    "no-code-agent-builder",
    "prompt-gallery",
    "model-selector",
    "notebook-lm",
    "people-search",
    "people-search-org-chart",
    "bi-directional-audio",
    "feedback",
    "session-sharing",
    "personalization-memory",
    "disable-agent-sharing",
    "disable-image-generation",
    "disable-video-generation",
    "disable-onedrive-upload",
    "disable-talk-to-content",
    "disable-google-drive-upload",
    "agent-sharing-without-admin-approval",
];

/// Normalize a feature key (trimmed, lowercase).
pub fn normalize_feature_key(feature: &str) -> String {
    feature.trim().to_lowercase()
}

/// Check whether a value names a known feature flag.
pub fn is_known_feature(value: &str) -> bool {
    let key = normalize_feature_key(value);
    !key.is_empty() && KNOWN_FEATURES.contains(&key.as_str())
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// Engines
// ============================================================================

/// Search tier and add-ons of a search engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEngineConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search_tier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_add_ons: Vec<String>,
}

/// An engine (AI app).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engine {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub solution_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub industry_vertical: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_store_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_config: JsonMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_engine_config: Option<SearchEngineConfig>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub create_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub update_time: String,
    /// Fields not modeled above (chat config, media config, ...).
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Engine {
    /// Company name from the common config, if set.
    pub fn company_name(&self) -> Option<&str> {
        self.common_config
            .get("companyName")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Agents
// ============================================================================

/// Icon of an agent, by URI or inline (base64) content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIcon {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

/// Link from an agent registration to a Dialogflow agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogflowAgentDefinition {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dialogflow_agent: String,
}

/// A Dialogflow agent registered with an engine's default assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    /// Server-assigned resource name, empty for agents not yet created.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<AgentIcon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogflow_agent_definition: Option<DialogflowAgentDefinition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reasoning_engine: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub create_time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub update_time: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    /// Fields not modeled above (connector definition, monitoring state, ...).
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Agent {
    /// The linked Dialogflow agent resource, or "" when unlinked.
    pub fn dialogflow_agent(&self) -> &str {
        self.dialogflow_agent_definition
            .as_ref()
            .map_or("", |d| d.dialogflow_agent.as_str())
    }

    /// Icon URI and content, "" for missing parts.
    pub fn icon_parts(&self) -> (&str, &str) {
        self.icon
            .as_ref()
            .map_or(("", ""), |i| (i.uri.as_str(), i.content.as_str()))
    }
}

/// Payload for creating or updating an agent registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInput {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<AgentIcon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogflow_agent_definition: Option<DialogflowAgentDefinition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reasoning_engine: String,
}

impl From<&Agent> for AgentInput {
    fn from(agent: &Agent) -> Self {
        Self {
            display_name: agent.display_name.clone(),
            description: agent.description.clone(),
            icon: agent.icon.clone(),
            dialogflow_agent_definition: agent.dialogflow_agent_definition.clone(),
            reasoning_engine: agent.reasoning_engine.clone(),
        }
    }
}

/// Build a Dialogflow agent resource from either a full resource or its parts.
///
/// Returns `Ok(None)` when nothing was provided.
pub fn resolve_dialogflow_agent(
    full_resource: &str,
    project_id: &str,
    location: &str,
    agent_id: &str,
) -> Result<Option<String>> {
    let full_resource = full_resource.trim();
    let (project_id, location, agent_id) = (project_id.trim(), location.trim(), agent_id.trim());

    if !full_resource.is_empty() {
        if !full_resource.starts_with("projects/") || !full_resource.contains("/agents/") {
            return Err(Error::InvalidInput(
                "dialogflow agent must be in the form projects/PROJECT/locations/LOCATION/agents/AGENT_ID"
                    .to_string(),
            ));
        }
        return Ok(Some(full_resource.to_string()));
    }

    if project_id.is_empty() && location.is_empty() && agent_id.is_empty() {
        return Ok(None);
    }

    if project_id.is_empty() || location.is_empty() || agent_id.is_empty() {
        return Err(Error::InvalidInput(
            "dialogflow agent requires project ID, location and agent ID".to_string(),
        ));
    }

    Ok(Some(format!(
        "projects/{project_id}/locations/{location}/agents/{agent_id}"
    )))
}

// ============================================================================
// Data stores
// ============================================================================

/// A data store connected (or connectable) to engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStore {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub industry_vertical: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solution_types: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_config: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub create_time: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub create_advanced_site_search: bool,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Content config for data stores holding unstructured documents.
pub const CONTENT_REQUIRED: &str = "CONTENT_REQUIRED";

/// Schemas accepted for Cloud Storage imports.
pub const GCS_DATA_SCHEMAS: &[&str] = &["content", "custom", "csv", "document"];

/// Reconciliation modes accepted for imports.
pub const RECONCILIATION_MODES: &[&str] = &["INCREMENTAL", "FULL"];

/// A document import from Cloud Storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsImport {
    /// `gs://` URI, possibly with a trailing wildcard.
    pub gcs_uri: String,
    pub data_schema: String,
    pub reconciliation_mode: String,
}

impl GcsImport {
    pub fn new(
        gcs_uri: impl Into<String>,
        data_schema: impl Into<String>,
        reconciliation_mode: impl Into<String>,
    ) -> Result<Self> {
        let import = Self {
            gcs_uri: gcs_uri.into().trim().to_string(),
            data_schema: data_schema.into(),
            reconciliation_mode: reconciliation_mode.into().to_uppercase(),
        };
        if !import.gcs_uri.starts_with("gs://") || import.gcs_uri.len() <= "gs://".len() {
            return Err(Error::InvalidInput(format!(
                "GCS URI must look like gs://bucket/path, got '{}'",
                import.gcs_uri
            )));
        }
        if !GCS_DATA_SCHEMAS.contains(&import.data_schema.as_str()) {
            return Err(Error::InvalidInput(format!(
                "unsupported data schema '{}' (expected one of {})",
                import.data_schema,
                GCS_DATA_SCHEMAS.join(", ")
            )));
        }
        if !RECONCILIATION_MODES.contains(&import.reconciliation_mode.as_str()) {
            return Err(Error::InvalidInput(format!(
                "unsupported reconciliation mode '{}' (expected INCREMENTAL or FULL)",
                import.reconciliation_mode
            )));
        }
        Ok(import)
    }
}

/// A document in a data store branch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: JsonMap,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub index_time: String,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Document {
    /// Source URI of the document content, if recorded.
    pub fn uri(&self) -> &str {
        self.content
            .get("uri")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

// ============================================================================
// Workforce identity
// ============================================================================

/// IdP type for a third-party workforce pool.
pub const IDP_TYPE_THIRD_PARTY: &str = "THIRD_PARTY";
/// IdP type used to clear the workforce configuration.
pub const IDP_TYPE_UNSPECIFIED: &str = "IDP_TYPE_UNSPECIFIED";
/// Default workforce pool location.
pub const DEFAULT_WORKFORCE_LOCATION: &str = "locations/global";

/// Workforce identity pool configuration of a project/location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkforceIdentityConfig {
    pub idp_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workforce_pool_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workforce_location: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub workforce_pool_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "workforceProviderId")]
    pub workforce_provider: String,
}

impl WorkforceIdentityConfig {
    /// Build a config and derive location/pool/provider from the pool resource.
    pub fn new(idp_type: impl Into<String>, workforce_pool_name: impl Into<String>) -> Self {
        let mut cfg = Self {
            idp_type: idp_type.into(),
            workforce_pool_name: workforce_pool_name.into(),
            ..Default::default()
        };

        let resource = cfg.workforce_pool_name.trim().to_string();
        let segments: Vec<&str> = resource.split('/').collect();
        for (i, segment) in segments.iter().enumerate() {
            let Some(next) = segments.get(i + 1) else {
                break;
            };
            match *segment {
                "locations" => cfg.workforce_location = format!("locations/{next}"),
                "workforcePools" => cfg.workforce_pool_id = (*next).to_string(),
                "providers" => cfg.workforce_provider = (*next).to_string(),
                _ => {}
            }
        }
        cfg
    }

    /// Whether a workforce pool is configured.
    pub fn is_enabled(&self) -> bool {
        !self.workforce_pool_name.trim().is_empty()
    }
}

/// Assemble a workforce pool resource from a full resource or its components.
pub fn build_workforce_resource(
    resource: &str,
    location: &str,
    pool_id: &str,
    provider_id: &str,
) -> Result<String> {
    if !resource.trim().is_empty() {
        return Ok(resource.to_string());
    }
    if pool_id.trim().is_empty() {
        return Err(Error::InvalidInput(
            "workforce pool ID is required when using component flags".to_string(),
        ));
    }

    let mut loc = location.trim().to_string();
    if loc.is_empty() {
        loc = DEFAULT_WORKFORCE_LOCATION.to_string();
    }
    if !loc.starts_with("locations/") {
        loc = format!("locations/{loc}");
    }

    let mut value = format!("{loc}/workforcePools/{pool_id}");
    if !provider_id.trim().is_empty() {
        value = format!("{value}/providers/{provider_id}");
    }
    Ok(value)
}
