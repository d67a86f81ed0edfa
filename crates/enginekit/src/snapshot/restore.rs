//! Converging a live engine onto a snapshot.
//!
//! A restore runs in three phases:
//!
//! 1. **Resolve** the target engine. A missing engine is acceptable only when
//!    creation is enabled.
//! 2. **Preview** the changes by diffing the snapshot against the target (or
//!    against an empty snapshot when the target will be created). A dry run
//!    stops here.
//! 3. **Apply** in a fixed order: create or patch the engine, replace the
//!    feature flags, then create, update and delete agents.
//!
//! There is no rollback. The first failing call aborts the restore and
//! whatever completed before it stays applied; running the restore again
//! re-diffs against live state and continues from there.

use super::capture::snapshot_of;
use super::diff::{
    AgentDiff, ChangeKind, FeatureDiff, SnapshotDiff, diff_agents, diff_features, diff_snapshots,
};
use super::{EngineConfigSnapshot, EngineSnapshot};
use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::names::split_engine_name;
use crate::types::{Agent, AgentInput, Engine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a restore treats the target engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Fully-qualified name of the engine to restore into.
    pub target_engine_name: String,
    /// Create the engine if it does not exist.
    pub create_if_missing: bool,
    /// Patch engine configuration of an existing engine.
    pub update_existing: bool,
    /// Compute the preview only; never write.
    pub dry_run: bool,
}

impl RestoreOptions {
    pub fn new(target_engine_name: impl Into<String>) -> Self {
        Self {
            target_engine_name: target_engine_name.into(),
            create_if_missing: false,
            update_existing: true,
            dry_run: false,
        }
    }
}

/// What a restore changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub engine_name: String,
    pub created: bool,
    pub engine_patched: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub feature_changes: Vec<FeatureDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_changes: Vec<AgentDiff>,
}

/// Result of a restore: the report (absent for dry runs) and the preview.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOutcome {
    pub report: Option<RestoreReport>,
    pub preview: SnapshotDiff,
}

/// Restore `desired` onto the engine named in `options`.
///
/// An existing engine whose preview is empty is left alone. Otherwise the
/// feature map is always written, so an empty map clears the live flags.
pub fn restore(
    backend: &dyn Backend,
    desired: &EngineSnapshot,
    options: &RestoreOptions,
) -> Result<RestoreOutcome> {
    let target = options.target_engine_name.as_str();
    if target.is_empty() {
        return Err(Error::PreconditionFailed(
            "target engine name is required".to_string(),
        ));
    }

    let existing = match backend.get_engine(target) {
        Ok(engine) => Some(engine),
        Err(e) if e.is_not_found() => {
            if !options.create_if_missing {
                return Err(Error::PreconditionFailed(format!(
                    "engine {target} not found and creation is disabled"
                )));
            }
            None
        }
        Err(e) => return Err(e),
    };
    let existing_agents = match &existing {
        Some(_) => backend.list_agents(target)?,
        None => Vec::new(),
    };

    let actual = match &existing {
        Some(engine) => snapshot_of(engine, &existing_agents),
        None => EngineSnapshot::default(),
    };
    let preview = diff_snapshots(desired, &actual);

    if options.dry_run {
        log::debug!("dry run: {} changes previewed for {}", preview.len(), target);
        return Ok(RestoreOutcome {
            report: None,
            preview,
        });
    }

    let mut report = RestoreReport {
        engine_name: target.to_string(),
        ..Default::default()
    };

    match &existing {
        None => {
            create_engine(backend, target, &desired.engine)?;
            report.created = true;
        }
        Some(_) if preview.is_empty() => {
            log::info!("engine {target} already matches the snapshot");
            return Ok(RestoreOutcome {
                report: Some(report),
                preview,
            });
        }
        Some(current) if options.update_existing => {
            report.engine_patched = patch_engine(backend, target, current, &desired.engine)?;
        }
        Some(_) => {}
    }

    apply_features(backend, target, &desired.engine.features)?;
    let live_features = existing.map(|e| e.features).unwrap_or_default();
    report.feature_changes = diff_features(&desired.engine.features, &live_features);

    report.agent_changes = sync_agents(backend, target, &desired.agents, &existing_agents)?;

    Ok(RestoreOutcome {
        report: Some(report),
        preview,
    })
}

fn create_engine(backend: &dyn Backend, target: &str, config: &EngineConfigSnapshot) -> Result<()> {
    let (parent, engine_id) = split_engine_name(target)?;
    log::info!("creating engine {engine_id} in {parent}");
    backend.create_engine(parent, engine_id, &config.to_create_request())
}

/// Fields of `current` that differ from the desired configuration.
///
/// Empty desired display name, industry vertical and app type leave the live
/// value alone; the search config is only compared when the snapshot has one.
pub fn engine_update_mask(current: &Engine, desired: &EngineConfigSnapshot) -> Vec<String> {
    let mut mask = Vec::new();

    let scalars = [
        ("displayName", &desired.display_name, &current.display_name),
        (
            "industryVertical",
            &desired.industry_vertical,
            &current.industry_vertical,
        ),
        ("appType", &desired.app_type, &current.app_type),
    ];
    for (field, wanted, live) in scalars {
        if !wanted.is_empty() && wanted != live {
            mask.push(field.to_string());
        }
    }

    if desired.data_store_ids != current.data_store_ids {
        mask.push("dataStoreIds".to_string());
    }

    if let Some(wanted) = &desired.search_config {
        let live = current.search_engine_config.clone().unwrap_or_default();
        if wanted.search_tier != live.search_tier || wanted.search_add_ons != live.search_add_ons {
            mask.push("searchEngineConfig".to_string());
        }
    }

    mask
}

/// Patch the engine if any field differs; returns whether a call was made.
fn patch_engine(
    backend: &dyn Backend,
    target: &str,
    current: &Engine,
    desired: &EngineConfigSnapshot,
) -> Result<bool> {
    let mask = engine_update_mask(current, desired);
    if mask.is_empty() {
        return Ok(false);
    }

    let patch = Engine {
        display_name: desired.display_name.clone(),
        industry_vertical: desired.industry_vertical.clone(),
        app_type: desired.app_type.clone(),
        data_store_ids: desired.data_store_ids.clone(),
        search_engine_config: desired.search_config.clone(),
        ..Default::default()
    };
    log::info!("patching engine {target} ({})", mask.join(", "));
    backend.patch_engine(target, &patch, &mask)?;
    Ok(true)
}

/// Replace the feature map; an empty map clears every flag.
fn apply_features(
    backend: &dyn Backend,
    target: &str,
    features: &BTreeMap<String, String>,
) -> Result<()> {
    log::info!("applying {} feature flags to {target}", features.len());
    backend.update_features(target, features)?;
    Ok(())
}

/// Payload for registering a snapshot agent with an engine.
///
/// The reasoning engine defaults to the engine itself.
pub fn create_agent_input(engine_name: &str, agent: &Agent) -> Result<AgentInput> {
    if let Some(definition) = &agent.dialogflow_agent_definition
        && definition.dialogflow_agent.is_empty()
    {
        return Err(Error::InvalidInput(format!(
            "snapshot agent {} is missing its dialogflow agent resource",
            agent.display_name
        )));
    }

    let mut input = AgentInput::from(agent);
    if input.reasoning_engine.is_empty() {
        input.reasoning_engine = engine_name.to_string();
    }
    Ok(input)
}

/// Create, update and delete agents until `current` matches `desired`.
///
/// Stops at the first failing call.
fn sync_agents(
    backend: &dyn Backend,
    target: &str,
    desired: &[Agent],
    current: &[Agent],
) -> Result<Vec<AgentDiff>> {
    let changes = diff_agents(desired, current);

    for change in &changes {
        match (change.change_type, &change.old, &change.new) {
            (ChangeKind::Added, _, Some(agent)) => {
                log::info!("creating agent {:?}", agent.display_name);
                let input = create_agent_input(target, agent)?;
                backend.create_agent(target, &input)?;
            }
            (ChangeKind::Updated, Some(existing), Some(agent)) => {
                log::info!(
                    "updating agent {} ({})",
                    existing.name,
                    change.fields.join(", ")
                );
                backend.update_agent(&existing.name, &AgentInput::from(agent), &change.fields)?;
            }
            (ChangeKind::Removed, Some(existing), _) => {
                log::info!("deleting agent {}", existing.name);
                backend.delete_agent(&existing.name)?;
            }
            _ => {}
        }
    }

    Ok(changes)
}
