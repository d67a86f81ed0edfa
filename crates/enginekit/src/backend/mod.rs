//! Backend trait and implementations for the platform API.
//!
//! The primary implementation is [`rest::RestBackend`], which talks to the
//! Discovery Engine REST API. Everything above this module (capture, diff,
//! restore, the command layer) only sees the [`Backend`] trait.
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use enginekit::backend::{Backend, MockBackend};
//! use enginekit::Engine;
//!
//! let mock = MockBackend::new();
//! mock.insert_engine(Engine {
//!     name: "projects/p/locations/global/collections/c/engines/e".to_string(),
//!     display_name: "E".to_string(),
//!     ..Default::default()
//! });
//!
//! let engine = mock.get_engine("projects/p/locations/global/collections/c/engines/e").unwrap();
//! assert_eq!(engine.display_name, "E");
//! assert!(mock.writes().is_empty());
//! ```

pub mod rest;

use crate::error::{Error, Result};
use crate::names::{self, DEFAULT_ASSISTANT_ID};
use crate::types::{
    Agent, AgentInput, DataStore, Document, Engine, GcsImport, IDP_TYPE_THIRD_PARTY,
    IDP_TYPE_UNSPECIFIED, WorkforceIdentityConfig,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

/// Operation names used in transport errors and failure injection.
pub mod op {
    pub const LIST_ENGINES: &str = "list engines";
    pub const GET_ENGINE: &str = "get engine";
    pub const CREATE_ENGINE: &str = "create engine";
    pub const PATCH_ENGINE: &str = "patch engine";
    pub const UPDATE_FEATURES: &str = "update features of";
    pub const DELETE_ENGINE: &str = "delete engine";
    pub const LIST_AGENTS: &str = "list agents of";
    pub const GET_AGENT: &str = "get agent";
    pub const CREATE_AGENT: &str = "create agent in";
    pub const UPDATE_AGENT: &str = "update agent";
    pub const DELETE_AGENT: &str = "delete agent";
    pub const LIST_DATA_STORES: &str = "list data stores in";
    pub const GET_DATA_STORE: &str = "get data store";
    pub const CREATE_DATA_STORE: &str = "create data store";
    pub const IMPORT_DOCUMENTS: &str = "import documents into";
    pub const LIST_DOCUMENTS: &str = "list documents in";
    pub const DELETE_DATA_STORE: &str = "delete data store";
    pub const GET_WORKFORCE: &str = "get workforce identity config";
    pub const SET_WORKFORCE: &str = "update workforce identity config";
}

/// Synchronous access to engines, agents, data stores and ACL config.
///
/// Reads of a single resource return [`Error::NotFound`] when it does not
/// exist; every other failure is an [`Error::Transport`] naming the
/// operation and resource.
pub trait Backend: Send + Sync {
    /// List engines in a collection (`projects/*/locations/*/collections/*`).
    fn list_engines(&self, collection_parent: &str) -> Result<Vec<Engine>>;

    /// Fetch an engine by full name.
    fn get_engine(&self, name: &str) -> Result<Engine>;

    /// Create an engine under a collection.
    fn create_engine(&self, collection_parent: &str, engine_id: &str, engine: &Engine)
    -> Result<()>;

    /// Patch the fields named in `update_mask` from `patch`.
    fn patch_engine(&self, name: &str, patch: &Engine, update_mask: &[String]) -> Result<Engine>;

    /// Replace the engine feature map with `features`.
    fn update_features(&self, name: &str, features: &BTreeMap<String, String>) -> Result<Engine>;

    /// Delete an engine.
    fn delete_engine(&self, name: &str) -> Result<()>;

    /// List agents registered with an engine's default assistant.
    fn list_agents(&self, engine_name: &str) -> Result<Vec<Agent>>;

    /// Fetch an agent by full name.
    fn get_agent(&self, name: &str) -> Result<Agent>;

    /// Register an agent with an engine's default assistant.
    fn create_agent(&self, engine_name: &str, input: &AgentInput) -> Result<Agent>;

    /// Update the fields named in `update_mask` of an agent.
    fn update_agent(&self, name: &str, input: &AgentInput, update_mask: &[String])
    -> Result<Agent>;

    /// Delete an agent registration.
    fn delete_agent(&self, name: &str) -> Result<()>;

    /// List data stores in a collection.
    fn list_data_stores(&self, collection_parent: &str) -> Result<Vec<DataStore>>;

    /// Fetch a data store by full name.
    fn get_data_store(&self, name: &str) -> Result<DataStore>;

    /// Create a data store under a collection.
    fn create_data_store(
        &self,
        collection_parent: &str,
        data_store_id: &str,
        data_store: &DataStore,
    ) -> Result<()>;

    /// Start importing documents into a branch; returns the operation name.
    fn import_documents(&self, branch_name: &str, source: &GcsImport) -> Result<String>;

    /// List documents of a branch (`.../dataStores/*/branches/*`).
    fn list_documents(&self, branch_name: &str) -> Result<Vec<Document>>;

    /// Delete a data store.
    fn delete_data_store(&self, name: &str) -> Result<()>;

    /// Read the workforce identity config; absent config reads as empty.
    fn get_workforce_config(&self, acl_config_name: &str) -> Result<WorkforceIdentityConfig>;

    /// Set the workforce pool; an empty resource disables workforce identity.
    fn set_workforce_config(
        &self,
        acl_config_name: &str,
        pool_resource: &str,
    ) -> Result<WorkforceIdentityConfig>;
}

/// A write call recorded by [`MockBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    CreateEngine { parent: String, engine_id: String },
    PatchEngine { name: String, mask: Vec<String> },
    UpdateFeatures { name: String },
    DeleteEngine { name: String },
    CreateAgent { engine: String, display_name: String },
    UpdateAgent { name: String, mask: Vec<String> },
    DeleteAgent { name: String },
    CreateDataStore { parent: String, data_store_id: String },
    ImportDocuments { branch: String, gcs_uri: String },
    DeleteDataStore { name: String },
    SetWorkforce { name: String, pool: String },
}

#[derive(Debug, Default)]
struct MockState {
    engines: BTreeMap<String, Engine>,
    agents: BTreeMap<String, Vec<Agent>>,
    data_stores: BTreeMap<String, DataStore>,
    documents: BTreeMap<String, Vec<Document>>,
    workforce: HashMap<String, WorkforceIdentityConfig>,
    writes: Vec<MockCall>,
    failures: HashMap<String, String>,
    next_agent_id: u64,
    next_operation_id: u64,
}

/// In-memory backend for testing without network access.
///
/// Records every successful write and can be told to fail a given operation
/// (see [`op`]) to exercise partial-failure paths.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Add or replace an engine.
    pub fn insert_engine(&self, engine: Engine) {
        self.lock().engines.insert(engine.name.clone(), engine);
    }

    /// Add an agent to an engine, assigning a name if it has none.
    pub fn insert_agent(&self, engine_name: &str, mut agent: Agent) {
        let mut state = self.lock();
        if agent.name.is_empty() {
            state.next_agent_id += 1;
            agent.name = names::agent_name(engine_name, &state.next_agent_id.to_string());
        }
        state
            .agents
            .entry(engine_name.to_string())
            .or_default()
            .push(agent);
    }

    /// Add or replace a data store.
    pub fn insert_data_store(&self, data_store: DataStore) {
        self.lock()
            .data_stores
            .insert(data_store.name.clone(), data_store);
    }

    /// Add a document to a data store branch.
    pub fn insert_document(&self, branch_name: &str, document: Document) {
        self.lock()
            .documents
            .entry(branch_name.to_string())
            .or_default()
            .push(document);
    }

    /// Current data store state, if present.
    pub fn data_store(&self, name: &str) -> Option<DataStore> {
        self.lock().data_stores.get(name).cloned()
    }

    /// Make every call of `operation` fail with a transport error.
    pub fn fail_on(&self, operation: &str) {
        self.lock()
            .failures
            .insert(operation.to_string(), "injected failure".to_string());
    }

    /// Successful write calls, in order.
    pub fn writes(&self) -> Vec<MockCall> {
        self.lock().writes.clone()
    }

    /// Current engine state, if present.
    pub fn engine(&self, name: &str) -> Option<Engine> {
        self.lock().engines.get(name).cloned()
    }

    /// Current agents of an engine.
    pub fn agents(&self, engine_name: &str) -> Vec<Agent> {
        self.lock()
            .agents
            .get(engine_name)
            .cloned()
            .unwrap_or_default()
    }

    fn check(state: &MockState, operation: &str, resource: &str) -> Result<()> {
        match state.failures.get(operation) {
            Some(message) => Err(Error::transport(operation, resource, Some(500), message)),
            None => Ok(()),
        }
    }
}

fn apply_agent_mask(agent: &mut Agent, input: &AgentInput, mask: &[String]) {
    for field in mask {
        match field.as_str() {
            "displayName" => agent.display_name = input.display_name.clone(),
            "description" => agent.description = input.description.clone(),
            "reasoningEngine" => agent.reasoning_engine = input.reasoning_engine.clone(),
            "icon" => agent.icon = input.icon.clone(),
            "dialogflowAgentDefinition.dialogflowAgent" => {
                agent.dialogflow_agent_definition = input.dialogflow_agent_definition.clone();
            }
            _ => {}
        }
    }
}

impl Backend for MockBackend {
    fn list_engines(&self, collection_parent: &str) -> Result<Vec<Engine>> {
        let state = self.lock();
        Self::check(&state, op::LIST_ENGINES, collection_parent)?;
        let prefix = format!("{collection_parent}/engines/");
        Ok(state
            .engines
            .values()
            .filter(|e| e.name.starts_with(&prefix))
            .cloned()
            .collect())
    }

    fn get_engine(&self, name: &str) -> Result<Engine> {
        let state = self.lock();
        Self::check(&state, op::GET_ENGINE, name)?;
        state
            .engines
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    fn create_engine(
        &self,
        collection_parent: &str,
        engine_id: &str,
        engine: &Engine,
    ) -> Result<()> {
        let mut state = self.lock();
        let name = format!("{collection_parent}/engines/{engine_id}");
        Self::check(&state, op::CREATE_ENGINE, &name)?;
        if state.engines.contains_key(&name) {
            return Err(Error::transport(
                op::CREATE_ENGINE,
                &name,
                Some(409),
                "engine already exists",
            ));
        }
        let mut created = engine.clone();
        created.name = name.clone();
        state.engines.insert(name, created);
        state.writes.push(MockCall::CreateEngine {
            parent: collection_parent.to_string(),
            engine_id: engine_id.to_string(),
        });
        Ok(())
    }

    fn patch_engine(&self, name: &str, patch: &Engine, update_mask: &[String]) -> Result<Engine> {
        let mut state = self.lock();
        Self::check(&state, op::PATCH_ENGINE, name)?;
        let engine = state
            .engines
            .get_mut(name)
            .ok_or_else(|| Error::transport(op::PATCH_ENGINE, name, Some(404), "not found"))?;
        for field in update_mask {
            match field.as_str() {
                "displayName" => engine.display_name = patch.display_name.clone(),
                "industryVertical" => engine.industry_vertical = patch.industry_vertical.clone(),
                "appType" => engine.app_type = patch.app_type.clone(),
                "dataStoreIds" => engine.data_store_ids = patch.data_store_ids.clone(),
                "searchEngineConfig" => {
                    engine.search_engine_config = patch.search_engine_config.clone();
                }
                "commonConfig" => engine.common_config = patch.common_config.clone(),
                _ => {}
            }
        }
        let updated = engine.clone();
        state.writes.push(MockCall::PatchEngine {
            name: name.to_string(),
            mask: update_mask.to_vec(),
        });
        Ok(updated)
    }

    fn update_features(&self, name: &str, features: &BTreeMap<String, String>) -> Result<Engine> {
        let mut state = self.lock();
        Self::check(&state, op::UPDATE_FEATURES, name)?;
        let engine = state
            .engines
            .get_mut(name)
            .ok_or_else(|| Error::transport(op::UPDATE_FEATURES, name, Some(404), "not found"))?;
        engine.features = features.clone();
        let updated = engine.clone();
        state.writes.push(MockCall::UpdateFeatures {
            name: name.to_string(),
        });
        Ok(updated)
    }

    fn delete_engine(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, op::DELETE_ENGINE, name)?;
        if state.engines.remove(name).is_none() {
            return Err(Error::transport(op::DELETE_ENGINE, name, Some(404), "not found"));
        }
        state.agents.remove(name);
        state.writes.push(MockCall::DeleteEngine {
            name: name.to_string(),
        });
        Ok(())
    }

    fn list_agents(&self, engine_name: &str) -> Result<Vec<Agent>> {
        let state = self.lock();
        Self::check(&state, op::LIST_AGENTS, engine_name)?;
        Ok(state.agents.get(engine_name).cloned().unwrap_or_default())
    }

    fn get_agent(&self, name: &str) -> Result<Agent> {
        let state = self.lock();
        Self::check(&state, op::GET_AGENT, name)?;
        state
            .agents
            .values()
            .flatten()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    fn create_agent(&self, engine_name: &str, input: &AgentInput) -> Result<Agent> {
        let mut state = self.lock();
        Self::check(&state, op::CREATE_AGENT, engine_name)?;
        state.next_agent_id += 1;
        let agent = Agent {
            name: format!(
                "{engine_name}/assistants/{DEFAULT_ASSISTANT_ID}/agents/{}",
                state.next_agent_id
            ),
            display_name: input.display_name.clone(),
            description: input.description.clone(),
            icon: input.icon.clone(),
            dialogflow_agent_definition: input.dialogflow_agent_definition.clone(),
            reasoning_engine: input.reasoning_engine.clone(),
            ..Default::default()
        };
        state
            .agents
            .entry(engine_name.to_string())
            .or_default()
            .push(agent.clone());
        state.writes.push(MockCall::CreateAgent {
            engine: engine_name.to_string(),
            display_name: input.display_name.clone(),
        });
        Ok(agent)
    }

    fn update_agent(
        &self,
        name: &str,
        input: &AgentInput,
        update_mask: &[String],
    ) -> Result<Agent> {
        let mut state = self.lock();
        Self::check(&state, op::UPDATE_AGENT, name)?;
        let agent = state
            .agents
            .values_mut()
            .flatten()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::transport(op::UPDATE_AGENT, name, Some(404), "not found"))?;
        apply_agent_mask(agent, input, update_mask);
        let updated = agent.clone();
        state.writes.push(MockCall::UpdateAgent {
            name: name.to_string(),
            mask: update_mask.to_vec(),
        });
        Ok(updated)
    }

    fn delete_agent(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, op::DELETE_AGENT, name)?;
        let mut removed = false;
        for agents in state.agents.values_mut() {
            let before = agents.len();
            agents.retain(|a| a.name != name);
            removed |= agents.len() < before;
        }
        if !removed {
            return Err(Error::transport(op::DELETE_AGENT, name, Some(404), "not found"));
        }
        state.writes.push(MockCall::DeleteAgent {
            name: name.to_string(),
        });
        Ok(())
    }

    fn list_data_stores(&self, collection_parent: &str) -> Result<Vec<DataStore>> {
        let state = self.lock();
        Self::check(&state, op::LIST_DATA_STORES, collection_parent)?;
        let prefix = format!("{collection_parent}/dataStores/");
        Ok(state
            .data_stores
            .values()
            .filter(|d| d.name.starts_with(&prefix))
            .cloned()
            .collect())
    }

    fn get_data_store(&self, name: &str) -> Result<DataStore> {
        let state = self.lock();
        Self::check(&state, op::GET_DATA_STORE, name)?;
        state
            .data_stores
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    fn create_data_store(
        &self,
        collection_parent: &str,
        data_store_id: &str,
        data_store: &DataStore,
    ) -> Result<()> {
        let mut state = self.lock();
        let name = format!("{collection_parent}/dataStores/{data_store_id}");
        Self::check(&state, op::CREATE_DATA_STORE, &name)?;
        if state.data_stores.contains_key(&name) {
            return Err(Error::transport(
                op::CREATE_DATA_STORE,
                &name,
                Some(409),
                "data store already exists",
            ));
        }
        let mut created = data_store.clone();
        created.name = name.clone();
        state.data_stores.insert(name, created);
        state.writes.push(MockCall::CreateDataStore {
            parent: collection_parent.to_string(),
            data_store_id: data_store_id.to_string(),
        });
        Ok(())
    }

    fn import_documents(&self, branch_name: &str, source: &GcsImport) -> Result<String> {
        let mut state = self.lock();
        Self::check(&state, op::IMPORT_DOCUMENTS, branch_name)?;
        let data_store = branch_name
            .split_once("/branches/")
            .map_or(branch_name, |(data_store, _)| data_store);
        if !state.data_stores.contains_key(data_store) {
            return Err(Error::transport(
                op::IMPORT_DOCUMENTS,
                branch_name,
                Some(404),
                "not found",
            ));
        }
        state.next_operation_id += 1;
        let operation = format!(
            "{branch_name}/operations/import-documents-{}",
            state.next_operation_id
        );
        state.writes.push(MockCall::ImportDocuments {
            branch: branch_name.to_string(),
            gcs_uri: source.gcs_uri.clone(),
        });
        Ok(operation)
    }

    fn list_documents(&self, branch_name: &str) -> Result<Vec<Document>> {
        let state = self.lock();
        Self::check(&state, op::LIST_DOCUMENTS, branch_name)?;
        Ok(state.documents.get(branch_name).cloned().unwrap_or_default())
    }

    fn delete_data_store(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        Self::check(&state, op::DELETE_DATA_STORE, name)?;
        if state.data_stores.remove(name).is_none() {
            return Err(Error::transport(
                op::DELETE_DATA_STORE,
                name,
                Some(404),
                "not found",
            ));
        }
        let prefix = format!("{name}/");
        state.documents.retain(|branch, _| !branch.starts_with(&prefix));
        state.writes.push(MockCall::DeleteDataStore {
            name: name.to_string(),
        });
        Ok(())
    }

    fn get_workforce_config(&self, acl_config_name: &str) -> Result<WorkforceIdentityConfig> {
        let state = self.lock();
        Self::check(&state, op::GET_WORKFORCE, acl_config_name)?;
        Ok(state
            .workforce
            .get(acl_config_name)
            .cloned()
            .unwrap_or_default())
    }

    fn set_workforce_config(
        &self,
        acl_config_name: &str,
        pool_resource: &str,
    ) -> Result<WorkforceIdentityConfig> {
        let mut state = self.lock();
        Self::check(&state, op::SET_WORKFORCE, acl_config_name)?;
        let cfg = if pool_resource.trim().is_empty() {
            WorkforceIdentityConfig::new(IDP_TYPE_UNSPECIFIED, "")
        } else {
            WorkforceIdentityConfig::new(IDP_TYPE_THIRD_PARTY, pool_resource)
        };
        state
            .workforce
            .insert(acl_config_name.to_string(), cfg.clone());
        state.writes.push(MockCall::SetWorkforce {
            name: acl_config_name.to_string(),
            pool: pool_resource.to_string(),
        });
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE: &str = "projects/p/locations/global/collections/c/engines/e";

    fn engine() -> Engine {
        Engine {
            name: ENGINE.to_string(),
            display_name: "E".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_mock_get_engine_not_found() {
        let mock = MockBackend::new();
        let err = mock.get_engine(ENGINE).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mock_list_engines_filters_by_collection() {
        let mock = MockBackend::new();
        mock.insert_engine(engine());
        mock.insert_engine(Engine {
            name: "projects/p/locations/global/collections/other/engines/x".to_string(),
            ..Default::default()
        });

        let engines = mock
            .list_engines("projects/p/locations/global/collections/c")
            .unwrap();
        assert_eq!(engines.len(), 1);
        assert_eq!(engines[0].name, ENGINE);
    }

    #[test]
    fn test_mock_create_engine_records_write() {
        let mock = MockBackend::new();
        mock.create_engine("projects/p/locations/global/collections/c", "e", &engine())
            .unwrap();
        assert_eq!(mock.engine(ENGINE).unwrap().display_name, "E");
        assert_eq!(
            mock.writes(),
            vec![MockCall::CreateEngine {
                parent: "projects/p/locations/global/collections/c".to_string(),
                engine_id: "e".to_string(),
            }]
        );

        let again = mock.create_engine("projects/p/locations/global/collections/c", "e", &engine());
        assert!(again.is_err());
    }

    #[test]
    fn test_mock_patch_engine_applies_mask_only() {
        let mock = MockBackend::new();
        mock.insert_engine(engine());
        let patch = Engine {
            display_name: "Renamed".to_string(),
            app_type: "APP_TYPE_INTRANET".to_string(),
            ..Default::default()
        };
        let updated = mock
            .patch_engine(ENGINE, &patch, &["displayName".to_string()])
            .unwrap();
        assert_eq!(updated.display_name, "Renamed");
        assert!(updated.app_type.is_empty());
    }

    #[test]
    fn test_mock_agent_lifecycle() {
        let mock = MockBackend::new();
        mock.insert_engine(engine());
        let created = mock
            .create_agent(
                ENGINE,
                &AgentInput {
                    display_name: "Helper".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(created.name.starts_with(ENGINE));
        assert_eq!(mock.get_agent(&created.name).unwrap().display_name, "Helper");

        let updated = mock
            .update_agent(
                &created.name,
                &AgentInput {
                    display_name: "Ignored".to_string(),
                    description: "New".to_string(),
                    ..Default::default()
                },
                &["description".to_string()],
            )
            .unwrap();
        assert_eq!(updated.display_name, "Helper");
        assert_eq!(updated.description, "New");

        mock.delete_agent(&created.name).unwrap();
        assert!(mock.list_agents(ENGINE).unwrap().is_empty());
        assert!(mock.delete_agent(&created.name).is_err());
        assert_eq!(mock.writes().len(), 3);
    }

    #[test]
    fn test_mock_failure_injection() {
        let mock = MockBackend::new();
        mock.insert_engine(engine());
        mock.fail_on(op::UPDATE_FEATURES);

        let err = mock
            .update_features(ENGINE, &BTreeMap::new())
            .unwrap_err();
        assert!(err.to_string().contains(op::UPDATE_FEATURES));
        assert!(err.to_string().contains(ENGINE));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_mock_data_store_lifecycle() {
        let mock = MockBackend::new();
        let parent = "projects/p/locations/global/collections/c";
        let name = format!("{parent}/dataStores/docs");
        let branch = names::branch_name(&name, "");
        let source = GcsImport::new("gs://bucket/docs/*", "content", "INCREMENTAL").unwrap();

        // Importing into a missing data store fails without recording a write.
        assert!(mock.import_documents(&branch, &source).is_err());

        mock.create_data_store(
            parent,
            "docs",
            &DataStore {
                display_name: "Docs".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(mock.data_store(&name).unwrap().display_name, "Docs");
        assert!(mock.create_data_store(parent, "docs", &DataStore::default()).is_err());

        let operation = mock.import_documents(&branch, &source).unwrap();
        assert!(operation.starts_with(&format!("{branch}/operations/")));

        mock.insert_document(
            &branch,
            Document {
                id: "a".to_string(),
                ..Default::default()
            },
        );
        assert_eq!(mock.list_documents(&branch).unwrap().len(), 1);

        mock.delete_data_store(&name).unwrap();
        assert!(mock.data_store(&name).is_none());
        assert!(mock.list_documents(&branch).unwrap().is_empty());
        assert!(mock.delete_data_store(&name).is_err());

        assert_eq!(
            mock.writes(),
            vec![
                MockCall::CreateDataStore {
                    parent: parent.to_string(),
                    data_store_id: "docs".to_string(),
                },
                MockCall::ImportDocuments {
                    branch: branch.clone(),
                    gcs_uri: "gs://bucket/docs/*".to_string(),
                },
                MockCall::DeleteDataStore { name: name.clone() },
            ]
        );
    }

    #[test]
    fn test_mock_workforce_roundtrip() {
        let mock = MockBackend::new();
        let name = "projects/p/locations/global/aclConfig";
        assert!(!mock.get_workforce_config(name).unwrap().is_enabled());

        let cfg = mock
            .set_workforce_config(name, "locations/global/workforcePools/pool")
            .unwrap();
        assert_eq!(cfg.workforce_pool_id, "pool");
        assert_eq!(mock.get_workforce_config(name).unwrap(), cfg);

        let cleared = mock.set_workforce_config(name, "").unwrap();
        assert_eq!(cleared.idp_type, IDP_TYPE_UNSPECIFIED);
    }
}
