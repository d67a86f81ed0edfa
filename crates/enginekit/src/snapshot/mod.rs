//! Point-in-time engine snapshots.
//!
//! A snapshot holds the portable part of an engine's state: its
//! configuration, feature flags and registered agents. Snapshots are
//! captured from a live engine ([`capture`]), compared ([`diff`]) and
//! converged back onto an engine ([`restore`]).
//!
//! The persisted form is a pretty-printed JSON document with top-level
//! `metadata`, `engine` and `agents` keys.

pub mod capture;
pub mod diff;
pub mod key;
pub mod restore;

use crate::error::{Error, Result};
use crate::types::{Agent, Engine, JsonMap, SearchEngineConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Schema version written into new snapshots.
pub const SNAPSHOT_VERSION: &str = "v1";

/// Provenance of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub original_engine_name: String,
    #[serde(default)]
    pub original_engine_id: String,
    #[serde(default)]
    pub source_project_id: String,
    #[serde(default)]
    pub source_location: String,
    #[serde(default)]
    pub source_collection: String,
    /// Capture time, UTC RFC 3339.
    #[serde(default)]
    pub taken_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// Engine configuration carried by a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfigSnapshot {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub solution_type: String,
    #[serde(default)]
    pub industry_vertical: String,
    #[serde(default)]
    pub app_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_store_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_config: JsonMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub features: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_config: Option<SearchEngineConfig>,
}

impl EngineConfigSnapshot {
    /// Copy the portable configuration out of a live engine.
    pub fn from_engine(engine: &Engine) -> Self {
        Self {
            display_name: engine.display_name.clone(),
            solution_type: engine.solution_type.clone(),
            industry_vertical: engine.industry_vertical.clone(),
            app_type: engine.app_type.clone(),
            data_store_ids: engine.data_store_ids.clone(),
            common_config: engine.common_config.clone(),
            features: engine.features.clone(),
            search_config: engine.search_engine_config.clone(),
        }
    }

    /// Engine body used to create a new engine from this configuration.
    ///
    /// Only the company name is carried over from the common config.
    pub fn to_create_request(&self) -> Engine {
        let mut common_config = JsonMap::new();
        if let Some(company) = self
            .common_config
            .get("companyName")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            common_config.insert("companyName".to_string(), Value::from(company));
        }

        Engine {
            display_name: self.display_name.clone(),
            solution_type: self.solution_type.clone(),
            industry_vertical: self.industry_vertical.clone(),
            app_type: self.app_type.clone(),
            data_store_ids: self.data_store_ids.clone(),
            common_config,
            features: self.features.clone(),
            search_engine_config: self.search_config.clone(),
            ..Default::default()
        }
    }
}

/// A captured engine: metadata, configuration and agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    #[serde(default)]
    pub metadata: SnapshotMetadata,
    #[serde(default)]
    pub engine: EngineConfigSnapshot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<Agent>,
}

impl EngineSnapshot {
    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Parse a snapshot document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Read a snapshot document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&data)
    }

    /// Write the snapshot to disk, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let mut json = self.to_json_pretty()?;
        json.push('\n');
        fs::write(path, json).map_err(|e| Error::io(path, e))
    }
}
