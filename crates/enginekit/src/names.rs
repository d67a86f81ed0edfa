//! Resource name construction and parsing.

use crate::error::{Error, Result};

/// Assistant that agents are registered under.
pub const DEFAULT_ASSISTANT_ID: &str = "default_assistant";

/// Branch that documents are imported into and listed from.
pub const DEFAULT_BRANCH_ID: &str = "default_branch";

/// Default engine/data store collection.
pub const DEFAULT_COLLECTION: &str = "default_collection";

/// Project, location and collection that short IDs are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    pub project_id: String,
    pub location: String,
    pub collection: String,
}

impl ProjectContext {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            collection: collection.into(),
        }
    }

    /// `projects/{p}/locations/{l}`
    pub fn location_name(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// `projects/{p}/locations/{l}/collections/{c}`
    pub fn collection_parent(&self) -> String {
        format!("{}/collections/{}", self.location_name(), self.collection)
    }

    /// Full engine name for an ID; names containing '/' are returned as is.
    pub fn engine_name(&self, engine_id: &str) -> String {
        if engine_id.contains('/') {
            return engine_id.to_string();
        }
        format!("{}/engines/{}", self.collection_parent(), engine_id)
    }

    /// Full data store name for an ID; names containing '/' are returned as is.
    pub fn data_store_name(&self, data_store_id: &str) -> String {
        if data_store_id.contains('/') {
            return data_store_id.to_string();
        }
        format!("{}/dataStores/{}", self.collection_parent(), data_store_id)
    }

    /// Workforce identity (ACL) config name of this project/location.
    pub fn acl_config_name(&self) -> String {
        format!("{}/aclConfig", self.location_name())
    }
}

/// Full agent name for an ID under an engine's default assistant.
pub fn agent_name(engine_name: &str, agent_id: &str) -> String {
    if agent_id.contains('/') {
        return agent_id.to_string();
    }
    format!("{engine_name}/assistants/{DEFAULT_ASSISTANT_ID}/agents/{agent_id}")
}

/// Full branch name of a data store; names containing '/' are returned as is.
pub fn branch_name(data_store_name: &str, branch_id: &str) -> String {
    if branch_id.contains('/') {
        return branch_id.to_string();
    }
    let branch_id = if branch_id.is_empty() {
        DEFAULT_BRANCH_ID
    } else {
        branch_id
    };
    format!("{data_store_name}/branches/{branch_id}")
}

/// Last path segment of a resource name.
pub fn resource_id(resource_name: &str) -> &str {
    resource_name.rsplit('/').next().unwrap_or(resource_name)
}

/// Split an engine name into its collection parent and engine ID.
pub fn split_engine_name(engine_name: &str) -> Result<(&str, &str)> {
    match engine_name.rsplit_once("/engines/") {
        Some((parent, id)) if !parent.is_empty() && !id.is_empty() && !id.contains('/') => {
            Ok((parent, id))
        }
        _ => Err(Error::InvalidInput(format!(
            "not a fully-qualified engine name: {engine_name}"
        ))),
    }
}

/// Value of the path segment following `key`, e.g. the project in `projects/{p}`.
pub fn segment_after<'a>(resource_name: &'a str, key: &str) -> Option<&'a str> {
    let mut parts = resource_name.split('/');
    while let Some(part) = parts.next() {
        if part == key {
            return parts.next();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ProjectContext {
        ProjectContext::new("my-project", "global", DEFAULT_COLLECTION)
    }

    #[test]
    fn test_engine_name() {
        assert_eq!(
            ctx().engine_name("my-engine"),
            "projects/my-project/locations/global/collections/default_collection/engines/my-engine"
        );
        assert_eq!(
            ctx().engine_name("projects/x/locations/us/collections/c/engines/e"),
            "projects/x/locations/us/collections/c/engines/e"
        );
    }

    #[test]
    fn test_data_store_and_acl_names() {
        assert_eq!(
            ctx().data_store_name("ds"),
            "projects/my-project/locations/global/collections/default_collection/dataStores/ds"
        );
        assert_eq!(
            ctx().acl_config_name(),
            "projects/my-project/locations/global/aclConfig"
        );
    }

    #[test]
    fn test_agent_name() {
        assert_eq!(
            agent_name("projects/p/locations/l/collections/c/engines/e", "123"),
            "projects/p/locations/l/collections/c/engines/e/assistants/default_assistant/agents/123"
        );
        assert_eq!(agent_name("ignored", "a/b/agents/1"), "a/b/agents/1");
    }

    #[test]
    fn test_branch_name() {
        let ds = "projects/p/locations/global/collections/c/dataStores/docs";
        assert_eq!(
            branch_name(ds, ""),
            "projects/p/locations/global/collections/c/dataStores/docs/branches/default_branch"
        );
        assert_eq!(branch_name(ds, "staging"), format!("{ds}/branches/staging"));
        let full = format!("{ds}/branches/other");
        assert_eq!(branch_name(ds, &full), full);
    }

    #[test]
    fn test_resource_id() {
        assert_eq!(resource_id("projects/p/engines/e"), "e");
        assert_eq!(resource_id("plain"), "plain");
        assert_eq!(resource_id(""), "");
    }

    #[test]
    fn test_split_engine_name() {
        let (parent, id) =
            split_engine_name("projects/p/locations/l/collections/c/engines/e").unwrap();
        assert_eq!(parent, "projects/p/locations/l/collections/c");
        assert_eq!(id, "e");

        assert!(split_engine_name("my-engine").is_err());
        assert!(split_engine_name("projects/p/engines/").is_err());
    }

    #[test]
    fn test_segment_after() {
        let name = "projects/p1/locations/us/collections/c/engines/e";
        assert_eq!(segment_after(name, "projects"), Some("p1"));
        assert_eq!(segment_after(name, "locations"), Some("us"));
        assert_eq!(segment_after(name, "collections"), Some("c"));
        assert_eq!(segment_after(name, "dataStores"), None);
    }
}
