//! Structural comparison of snapshots.
//!
//! Every function here is pure. `old` values come from the actual side and
//! `new` values from the desired side, so a diff reads as "what applying the
//! desired snapshot would change". Map keys are visited in sorted order and
//! the output is identical for identical inputs.

use super::key::index_agents;
use super::{EngineConfigSnapshot, EngineSnapshot, SnapshotMetadata};
use crate::types::Agent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Change of a single (possibly composite) field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

impl FieldDiff {
    fn new(field: &str, old: impl Into<Value>, new: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            old: old.into(),
            new: new.into(),
        }
    }

    /// Whether either side is a JSON object or array.
    pub fn is_composite(&self) -> bool {
        matches!(self.old, Value::Object(_) | Value::Array(_))
            || matches!(self.new, Value::Object(_) | Value::Array(_))
    }
}

/// Change of a feature flag; a missing side reads as "".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureDiff {
    pub feature: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub old: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new: String,
}

/// Kind of agent change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Updated,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::Updated => "updated",
        };
        write!(f, "{s}")
    }
}

/// Change of one agent, matched by identity key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDiff {
    pub key: String,
    pub change_type: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Agent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Agent>,
    /// Update mask of an `updated` change.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

/// Differences between a desired and an actual snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata_changes: Vec<FieldDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engine_changes: Vec<FieldDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_changes: Vec<FeatureDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_changes: Vec<AgentDiff>,
}

impl SnapshotDiff {
    /// True when no section has changes, metadata included.
    pub fn is_empty(&self) -> bool {
        self.metadata_changes.is_empty()
            && self.engine_changes.is_empty()
            && self.feature_changes.is_empty()
            && self.agent_changes.is_empty()
    }

    /// Total number of changes across all sections.
    pub fn len(&self) -> usize {
        self.metadata_changes.len()
            + self.engine_changes.len()
            + self.feature_changes.len()
            + self.agent_changes.len()
    }
}

/// Compare a desired snapshot against an actual one.
pub fn diff_snapshots(desired: &EngineSnapshot, actual: &EngineSnapshot) -> SnapshotDiff {
    SnapshotDiff {
        metadata_changes: diff_metadata(&desired.metadata, &actual.metadata),
        engine_changes: diff_engine_config(&desired.engine, &actual.engine),
        feature_changes: diff_features(&desired.engine.features, &actual.engine.features),
        agent_changes: diff_agents(&desired.agents, &actual.agents),
    }
}

fn diff_metadata(desired: &SnapshotMetadata, actual: &SnapshotMetadata) -> Vec<FieldDiff> {
    let pairs = [
        ("displayName", &desired.display_name, &actual.display_name),
        ("description", &desired.description, &actual.description),
        ("notes", &desired.notes, &actual.notes),
    ];
    pairs
        .into_iter()
        .filter(|(_, d, a)| d != a)
        .map(|(field, d, a)| FieldDiff::new(field, a.as_str(), d.as_str()))
        .collect()
}

fn diff_engine_config(
    desired: &EngineConfigSnapshot,
    actual: &EngineConfigSnapshot,
) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();

    let scalars = [
        ("displayName", &desired.display_name, &actual.display_name),
        ("solutionType", &desired.solution_type, &actual.solution_type),
        (
            "industryVertical",
            &desired.industry_vertical,
            &actual.industry_vertical,
        ),
        ("appType", &desired.app_type, &actual.app_type),
    ];
    for (field, d, a) in scalars {
        if d != a {
            diffs.push(FieldDiff::new(field, a.as_str(), d.as_str()));
        }
    }

    // Ordered comparison: a reordering alone is a change.
    if desired.data_store_ids != actual.data_store_ids {
        diffs.push(FieldDiff::new(
            "dataStoreIds",
            actual.data_store_ids.clone(),
            desired.data_store_ids.clone(),
        ));
    }

    if desired.common_config != actual.common_config {
        diffs.push(FieldDiff::new(
            "commonConfig",
            object(&actual.common_config),
            object(&desired.common_config),
        ));
    }

    if desired.search_config != actual.search_config {
        diffs.push(FieldDiff::new(
            "searchConfig",
            serde_json::to_value(&actual.search_config).unwrap_or_default(),
            serde_json::to_value(&desired.search_config).unwrap_or_default(),
        ));
    }

    diffs
}

fn object(map: &BTreeMap<String, Value>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// Compare feature maps over the sorted union of their keys.
pub fn diff_features(
    desired: &BTreeMap<String, String>,
    actual: &BTreeMap<String, String>,
) -> Vec<FeatureDiff> {
    let mut keys: Vec<&String> = desired.keys().chain(actual.keys()).collect();
    keys.sort();
    keys.dedup();

    keys.into_iter()
        .filter_map(|key| {
            let old = actual.get(key).map_or("", String::as_str);
            let new = desired.get(key).map_or("", String::as_str);
            (old != new).then(|| FeatureDiff {
                feature: key.clone(),
                old: old.to_string(),
                new: new.to_string(),
            })
        })
        .collect()
}

/// Match agents by identity key and report additions, updates and removals.
///
/// Added and updated changes come first in key order, then removals in key
/// order.
pub fn diff_agents(desired: &[Agent], actual: &[Agent]) -> Vec<AgentDiff> {
    let desired_index = index_agents(desired);
    let actual_index = index_agents(actual);
    let mut changes = Vec::new();

    for (key, wanted) in &desired_index {
        match actual_index.get(key) {
            None => changes.push(AgentDiff {
                key: key.clone(),
                change_type: ChangeKind::Added,
                old: None,
                new: Some((*wanted).clone()),
                fields: Vec::new(),
            }),
            Some(existing) => {
                let fields = agent_update_mask(wanted, existing);
                if !fields.is_empty() {
                    changes.push(AgentDiff {
                        key: key.clone(),
                        change_type: ChangeKind::Updated,
                        old: Some((*existing).clone()),
                        new: Some((*wanted).clone()),
                        fields,
                    });
                }
            }
        }
    }

    for (key, existing) in &actual_index {
        if !desired_index.contains_key(key) {
            changes.push(AgentDiff {
                key: key.clone(),
                change_type: ChangeKind::Removed,
                old: Some((*existing).clone()),
                new: None,
                fields: Vec::new(),
            });
        }
    }

    changes
}

/// Fields of `existing` that must be updated to match `desired`.
///
/// The reasoning engine and Dialogflow link are only overwritten with a
/// non-empty desired value. Icon URI and content form one field.
pub fn agent_update_mask(desired: &Agent, existing: &Agent) -> Vec<String> {
    let mut mask = Vec::new();

    if desired.display_name != existing.display_name {
        mask.push("displayName");
    }
    if desired.description != existing.description {
        mask.push("description");
    }
    if !desired.reasoning_engine.is_empty() && desired.reasoning_engine != existing.reasoning_engine
    {
        mask.push("reasoningEngine");
    }
    let link = desired.dialogflow_agent();
    if !link.is_empty() && link != existing.dialogflow_agent() {
        mask.push("dialogflowAgentDefinition.dialogflowAgent");
    }
    if desired.icon_parts() != existing.icon_parts() {
        mask.push("icon");
    }

    mask.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::sample;
    use crate::types::{AgentIcon, DialogflowAgentDefinition, SearchEngineConfig};
    use serde_json::json;

    fn linked(name: &str, display_name: &str, link: &str) -> Agent {
        Agent {
            name: name.to_string(),
            display_name: display_name.to_string(),
            dialogflow_agent_definition: Some(DialogflowAgentDefinition {
                dialogflow_agent: link.to_string(),
            }),
            ..Default::default()
        }
    }

    fn features(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_diff_with_itself_is_empty() {
        let s = sample();
        let diff = diff_snapshots(&s, &s);
        assert!(diff.is_empty());
        assert_eq!(diff.len(), 0);
    }

    #[test]
    fn test_feature_scenario() {
        let desired = features(&[("agent-gallery", "ON")]);
        let actual = features(&[("agent-gallery", "OFF"), ("prompt-gallery", "ON")]);
        assert_eq!(
            diff_features(&desired, &actual),
            vec![
                FeatureDiff {
                    feature: "agent-gallery".to_string(),
                    old: "OFF".to_string(),
                    new: "ON".to_string(),
                },
                FeatureDiff {
                    feature: "prompt-gallery".to_string(),
                    old: "ON".to_string(),
                    new: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_engine_field_order_and_values() {
        let desired = sample();
        let mut actual = sample();
        actual.engine.display_name = "Old".to_string();
        actual.engine.app_type = String::new();
        actual.engine.data_store_ids.reverse();
        actual.engine.search_config = None;

        let diff = diff_snapshots(&desired, &actual);
        let fields: Vec<&str> = diff.engine_changes.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["displayName", "appType", "dataStoreIds", "searchConfig"]);

        assert_eq!(diff.engine_changes[0].old, json!("Old"));
        assert_eq!(diff.engine_changes[0].new, json!("E"));
        assert_eq!(diff.engine_changes[2].old, json!(["ds-a", "ds-b"]));
        assert_eq!(diff.engine_changes[3].old, Value::Null);
        assert_eq!(
            diff.engine_changes[3].new["searchTier"],
            json!("SEARCH_TIER_ENTERPRISE")
        );
        assert!(diff.engine_changes[2].is_composite());
        assert!(!diff.engine_changes[0].is_composite());
    }

    #[test]
    fn test_common_config_is_one_composite_change() {
        let desired = sample();
        let mut actual = sample();
        actual
            .engine
            .common_config
            .insert("vendorKnob".to_string(), json!({"nested": [1, 3]}));
        actual
            .engine
            .common_config
            .insert("extra".to_string(), json!(true));

        let diff = diff_snapshots(&desired, &actual);
        assert_eq!(diff.engine_changes.len(), 1);
        let change = &diff.engine_changes[0];
        assert_eq!(change.field, "commonConfig");
        assert_eq!(change.old["extra"], json!(true));
        assert_eq!(change.new["companyName"], json!("Acme"));
    }

    #[test]
    fn test_metadata_changes() {
        let desired = sample();
        let mut actual = sample();
        actual.metadata.notes = String::new();
        actual.metadata.description = "live".to_string();
        // Provenance fields are not compared.
        actual.metadata.taken_at = "2030-01-01T00:00:00Z".to_string();

        let diff = diff_snapshots(&desired, &actual);
        let fields: Vec<&str> = diff.metadata_changes.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["description", "notes"]);
        assert!(!diff.is_empty());
        assert!(diff.engine_changes.is_empty());
        assert!(diff.agent_changes.is_empty());
    }

    #[test]
    fn test_agent_matched_by_link_across_names() {
        let desired = vec![linked("", "Helper v2", "projects/p/locations/l/agents/123")];
        let actual = vec![linked(
            "projects/p/locations/global/collections/c/engines/e/assistants/default_assistant/agents/999",
            "Helper",
            "projects/p/locations/l/agents/123",
        )];

        let changes = diff_agents(&desired, &actual);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeKind::Updated);
        assert_eq!(changes[0].key, "projects/p/locations/l/agents/123");
        assert_eq!(changes[0].fields, vec!["displayName"]);

        let same = vec![linked("other/name", "Helper", "projects/p/locations/l/agents/123")];
        assert!(diff_agents(&same, &actual).is_empty());
    }

    #[test]
    fn test_agent_added_and_removed_order() {
        let desired = vec![
            linked("", "Zed", "projects/p/locations/l/agents/z"),
            linked("", "Alpha", "projects/p/locations/l/agents/a"),
        ];
        let actual = vec![
            linked("n/2", "Old", "projects/p/locations/l/agents/old"),
            linked("n/1", "Alpha", "projects/p/locations/l/agents/a"),
        ];

        let changes = diff_agents(&desired, &actual);
        let summary: Vec<(ChangeKind, &str)> = changes
            .iter()
            .map(|c| (c.change_type, c.key.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ChangeKind::Added, "projects/p/locations/l/agents/z"),
                (ChangeKind::Removed, "projects/p/locations/l/agents/old"),
            ]
        );
        assert!(changes[0].old.is_none());
        assert!(changes[1].new.is_none());
    }

    #[test]
    fn test_agent_update_mask_rules() {
        let existing = Agent {
            display_name: "A".to_string(),
            reasoning_engine: "projects/p/locations/l/reasoningEngines/1".to_string(),
            icon: Some(AgentIcon {
                uri: "https://example.com/a.png".to_string(),
                content: String::new(),
            }),
            ..linked("n/1", "A", "projects/p/locations/l/agents/1")
        };

        // Empty reasoning engine and link in the desired agent never clear live values.
        let mut desired = existing.clone();
        desired.reasoning_engine = String::new();
        desired.dialogflow_agent_definition = None;
        assert!(agent_update_mask(&desired, &existing).is_empty());

        desired.icon = Some(AgentIcon {
            uri: String::new(),
            content: "aGVsbG8=".to_string(),
        });
        desired.description = "new".to_string();
        desired.reasoning_engine = "projects/p/locations/l/reasoningEngines/2".to_string();
        assert_eq!(
            agent_update_mask(&desired, &existing),
            vec!["description", "reasoningEngine", "icon"]
        );
    }

    #[test]
    fn test_diff_is_symmetric_in_content() {
        let a = sample();
        let mut b = sample();
        b.metadata.notes = "after".to_string();
        b.engine.industry_vertical = "HEALTHCARE_FHIR".to_string();
        b.engine.search_config = Some(SearchEngineConfig {
            search_tier: "SEARCH_TIER_STANDARD".to_string(),
            search_add_ons: Vec::new(),
        });
        b.engine.features = features(&[("agent-gallery", "FEATURE_STATE_OFF"), ("feedback", "FEATURE_STATE_ON")]);
        b.agents[0].description = "changed".to_string();
        b.agents.push(linked("n/7", "Extra", "projects/p/locations/l/agents/7"));

        let forward = diff_snapshots(&a, &b);
        let backward = diff_snapshots(&b, &a);

        let swap_field = |d: &FieldDiff| FieldDiff::new(&d.field, d.new.clone(), d.old.clone());
        assert_eq!(
            backward.metadata_changes,
            forward.metadata_changes.iter().map(swap_field).collect::<Vec<_>>()
        );
        assert_eq!(
            backward.engine_changes,
            forward.engine_changes.iter().map(swap_field).collect::<Vec<_>>()
        );
        assert_eq!(
            backward.feature_changes,
            forward
                .feature_changes
                .iter()
                .map(|f| FeatureDiff {
                    feature: f.feature.clone(),
                    old: f.new.clone(),
                    new: f.old.clone(),
                })
                .collect::<Vec<_>>()
        );

        let flip = |kind: ChangeKind| match kind {
            ChangeKind::Added => ChangeKind::Removed,
            ChangeKind::Removed => ChangeKind::Added,
            ChangeKind::Updated => ChangeKind::Updated,
        };
        let mut expected: Vec<AgentDiff> = forward
            .agent_changes
            .iter()
            .map(|c| AgentDiff {
                key: c.key.clone(),
                change_type: flip(c.change_type),
                old: c.new.clone(),
                new: c.old.clone(),
                fields: c.fields.clone(),
            })
            .collect();
        let mut actual = backward.agent_changes.clone();
        expected.sort_by(|x, y| x.key.cmp(&y.key));
        actual.sort_by(|x, y| x.key.cmp(&y.key));
        assert_eq!(actual, expected);
        assert_eq!(forward.agent_changes.len(), 2);
    }

    #[test]
    fn test_diff_is_deterministic() {
        let a = sample();
        let mut b = sample();
        b.engine.features = features(&[("z", "1"), ("a", "2"), ("m", "3")]);
        let first = serde_json::to_string(&diff_snapshots(&a, &b)).unwrap();
        let second = serde_json::to_string(&diff_snapshots(&a, &b)).unwrap();
        assert_eq!(first, second);
    }
}
