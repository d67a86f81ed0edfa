//! Capturing snapshots from live engines.

use super::diff::{SnapshotDiff, diff_snapshots};
use super::{EngineConfigSnapshot, EngineSnapshot, SNAPSHOT_VERSION, SnapshotMetadata};
use crate::backend::Backend;
use crate::error::Result;
use crate::names::{resource_id, segment_after};
use crate::types::{Agent, Engine};
use chrono::{SecondsFormat, Utc};

/// Current time in the snapshot timestamp format.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build a snapshot from an engine and its agents as read from the API.
///
/// Source project, location and collection are parsed from the engine name.
pub fn snapshot_of(engine: &Engine, agents: &[Agent]) -> EngineSnapshot {
    let name = engine.name.as_str();
    EngineSnapshot {
        metadata: SnapshotMetadata {
            version: SNAPSHOT_VERSION.to_string(),
            original_engine_name: engine.name.clone(),
            original_engine_id: resource_id(name).to_string(),
            source_project_id: segment_after(name, "projects").unwrap_or_default().to_string(),
            source_location: segment_after(name, "locations").unwrap_or_default().to_string(),
            source_collection: segment_after(name, "collections")
                .unwrap_or_default()
                .to_string(),
            taken_at: timestamp_now(),
            display_name: engine.display_name.clone(),
            ..Default::default()
        },
        engine: EngineConfigSnapshot::from_engine(engine),
        agents: agents.to_vec(),
    }
}

/// Read an engine and its agents and snapshot them.
///
/// Fails with `NotFound` if the engine does not exist.
pub fn capture(backend: &dyn Backend, engine_name: &str) -> Result<EngineSnapshot> {
    let engine = backend.get_engine(engine_name)?;
    let agents = backend.list_agents(engine_name)?;
    log::debug!(
        "captured engine {} with {} agents",
        engine_name,
        agents.len()
    );
    Ok(snapshot_of(&engine, &agents))
}

/// Compare a snapshot (desired) with the live state of an engine (actual).
pub fn diff_with_live(
    backend: &dyn Backend,
    snapshot: &EngineSnapshot,
    engine_name: &str,
) -> Result<SnapshotDiff> {
    let live = capture(backend, engine_name)?;
    Ok(diff_snapshots(snapshot, &live))
}
