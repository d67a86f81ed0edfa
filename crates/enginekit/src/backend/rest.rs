//! REST backend for the Discovery Engine API.
//!
//! Engines, data stores and the ACL config live on `v1`; agent registrations
//! are only exposed on `v1alpha`, under the engine's default assistant.

use crate::backend::{Backend, op};
use crate::error::{Error, Result};
use crate::names::DEFAULT_ASSISTANT_ID;
use crate::types::{
    Agent, AgentInput, DataStore, Document, Engine, GcsImport, IDP_TYPE_THIRD_PARTY,
    IDP_TYPE_UNSPECIFIED, WorkforceIdentityConfig,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Global API endpoint.
pub const GLOBAL_ENDPOINT: &str = "https://discoveryengine.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Endpoint serving a location: the global host, or `{location}-` prefixed.
pub fn endpoint_for_location(location: &str) -> String {
    if location.is_empty() || location == "global" {
        GLOBAL_ENDPOINT.to_string()
    } else {
        format!("https://{location}-discoveryengine.googleapis.com")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        write!(f, "{s}")
    }
}

/// Blocking REST client.
///
/// # Example
///
/// ```no_run
/// use enginekit::backend::rest::{RestBackend, endpoint_for_location};
/// use enginekit::backend::Backend;
///
/// let backend = RestBackend::new(endpoint_for_location("global"), "ya29.token", "my-project");
/// let engines = backend
///     .list_engines("projects/my-project/locations/global/collections/default_collection")
///     .unwrap();
/// println!("Found {} engines", engines.len());
/// ```
pub struct RestBackend {
    agent: ureq::Agent,
    api_base: String,
    access_token: String,
    quota_project: String,
    user_agent: String,
}

impl RestBackend {
    /// Create a backend for an endpoint, bearer token and quota project.
    #[must_use]
    pub fn new(
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        quota_project: impl Into<String>,
    ) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            quota_project: quota_project.into(),
            user_agent: format!("enginekit/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn v1(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_base, path)
    }

    fn v1alpha(&self, path: &str) -> String {
        format!("{}/v1alpha/{}", self.api_base, path)
    }

    fn agents_url(&self, engine_name: &str) -> String {
        self.v1alpha(&format!(
            "{engine_name}/assistants/{DEFAULT_ASSISTANT_ID}/agents"
        ))
    }

    fn prepare<B>(
        &self,
        mut request: ureq::RequestBuilder<B>,
        query: &[(&str, String)],
    ) -> ureq::RequestBuilder<B> {
        request = request
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", "application/json");
        if !self.quota_project.is_empty() {
            request = request.header("X-Goog-User-Project", self.quota_project.as_str());
        }
        for (key, value) in query {
            request = request.query(*key, value);
        }
        request
    }

    /// Send a request and return the response body of a 2xx reply.
    fn send(
        &self,
        operation: &str,
        resource: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        payload: Option<Value>,
    ) -> Result<String> {
        log::debug!("{method} {url}");

        let payload = payload.unwrap_or_else(|| json!({}));
        let result = match method {
            Method::Get => self.prepare(self.agent.get(url), query).call(),
            Method::Delete => self.prepare(self.agent.delete(url), query).call(),
            Method::Post => self.prepare(self.agent.post(url), query).send_json(&payload),
            Method::Patch => self
                .prepare(self.agent.patch(url), query)
                .send_json(&payload),
        };

        let mut response =
            result.map_err(|e| Error::transport(operation, resource, None, e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::transport(operation, resource, Some(status), e.to_string()))?;

        log::trace!("{method} {url} -> {status}");

        if status == 404 && method == Method::Get {
            return Err(Error::not_found(resource));
        }
        if !(200..300).contains(&status) {
            return Err(Error::transport(
                operation,
                resource,
                Some(status),
                api_error_message(status, &body),
            ));
        }
        Ok(body)
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        payload: Option<Value>,
    ) -> Result<T> {
        let body = self.send(operation, resource, method, url, query, payload)?;
        decode(operation, resource, &body)
    }

    /// Follow `nextPageToken` until exhausted, collecting `field` items.
    fn list_paged<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: &str,
        url: &str,
        field: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page_token = String::new();

        loop {
            let mut query = vec![("pageSize", "100".to_string())];
            if !page_token.is_empty() {
                query.push(("pageToken", page_token.clone()));
            }
            let mut page: Value =
                self.send_json(operation, resource, Method::Get, url, &query, None)?;

            if let Some(batch) = page.get_mut(field).map(Value::take) {
                let batch: Vec<T> = serde_json::from_value(batch).map_err(|e| {
                    Error::transport(operation, resource, None, format!("invalid response: {e}"))
                })?;
                items.extend(batch);
            }

            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if page_token.is_empty() {
                return Ok(items);
            }
        }
    }
}

fn decode<T: DeserializeOwned>(operation: &str, resource: &str, body: &str) -> Result<T> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body)
        .map_err(|e| Error::transport(operation, resource, None, format!("invalid response: {e}")))
}

/// Extract `error.message` from an API error body, falling back to the raw body.
fn api_error_message(status: u16, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {message}")
    }
}

/// Body of a `documents:import` request.
fn import_request(source: &GcsImport) -> Value {
    json!({
        "gcsSource": {
            "inputUris": [source.gcs_uri],
            "dataSchema": source.data_schema,
        },
        "reconciliationMode": source.reconciliation_mode,
    })
}

fn mask_query(update_mask: &[String]) -> Vec<(&'static str, String)> {
    vec![("updateMask", update_mask.join(","))]
}

fn to_payload<T: Serialize>(operation: &str, resource: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| Error::InvalidInput(format!("cannot {operation} {resource}: {e}")))
}

impl Backend for RestBackend {
    fn list_engines(&self, collection_parent: &str) -> Result<Vec<Engine>> {
        let url = self.v1(&format!("{collection_parent}/engines"));
        self.list_paged(op::LIST_ENGINES, collection_parent, &url, "engines")
    }

    fn get_engine(&self, name: &str) -> Result<Engine> {
        self.send_json(op::GET_ENGINE, name, Method::Get, &self.v1(name), &[], None)
    }

    fn create_engine(
        &self,
        collection_parent: &str,
        engine_id: &str,
        engine: &Engine,
    ) -> Result<()> {
        let resource = format!("{collection_parent}/engines/{engine_id}");
        let url = self.v1(&format!("{collection_parent}/engines"));
        let mut payload = to_payload(op::CREATE_ENGINE, &resource, engine)?;
        if let Some(obj) = payload.as_object_mut() {
            obj.remove("name");
        }
        // Creation returns a long-running operation; it is not polled.
        self.send(
            op::CREATE_ENGINE,
            &resource,
            Method::Post,
            &url,
            &[("engineId", engine_id.to_string())],
            Some(payload),
        )?;
        Ok(())
    }

    fn patch_engine(&self, name: &str, patch: &Engine, update_mask: &[String]) -> Result<Engine> {
        let payload = to_payload(op::PATCH_ENGINE, name, patch)?;
        self.send_json(
            op::PATCH_ENGINE,
            name,
            Method::Patch,
            &self.v1(name),
            &mask_query(update_mask),
            Some(payload),
        )
    }

    fn update_features(&self, name: &str, features: &BTreeMap<String, String>) -> Result<Engine> {
        self.send_json(
            op::UPDATE_FEATURES,
            name,
            Method::Patch,
            &self.v1(name),
            &mask_query(&["features".to_string()]),
            Some(json!({ "features": features })),
        )
    }

    fn delete_engine(&self, name: &str) -> Result<()> {
        self.send(op::DELETE_ENGINE, name, Method::Delete, &self.v1(name), &[], None)?;
        Ok(())
    }

    fn list_agents(&self, engine_name: &str) -> Result<Vec<Agent>> {
        let url = self.agents_url(engine_name);
        self.list_paged(op::LIST_AGENTS, engine_name, &url, "agents")
    }

    fn get_agent(&self, name: &str) -> Result<Agent> {
        self.send_json(op::GET_AGENT, name, Method::Get, &self.v1alpha(name), &[], None)
    }

    fn create_agent(&self, engine_name: &str, input: &AgentInput) -> Result<Agent> {
        let payload = to_payload(op::CREATE_AGENT, engine_name, input)?;
        self.send_json(
            op::CREATE_AGENT,
            engine_name,
            Method::Post,
            &self.agents_url(engine_name),
            &[],
            Some(payload),
        )
    }

    fn update_agent(
        &self,
        name: &str,
        input: &AgentInput,
        update_mask: &[String],
    ) -> Result<Agent> {
        let payload = to_payload(op::UPDATE_AGENT, name, input)?;
        self.send_json(
            op::UPDATE_AGENT,
            name,
            Method::Patch,
            &self.v1alpha(name),
            &mask_query(update_mask),
            Some(payload),
        )
    }

    fn delete_agent(&self, name: &str) -> Result<()> {
        self.send(op::DELETE_AGENT, name, Method::Delete, &self.v1alpha(name), &[], None)?;
        Ok(())
    }

    fn list_data_stores(&self, collection_parent: &str) -> Result<Vec<DataStore>> {
        let url = self.v1(&format!("{collection_parent}/dataStores"));
        self.list_paged(op::LIST_DATA_STORES, collection_parent, &url, "dataStores")
    }

    fn get_data_store(&self, name: &str) -> Result<DataStore> {
        self.send_json(op::GET_DATA_STORE, name, Method::Get, &self.v1(name), &[], None)
    }

    fn create_data_store(
        &self,
        collection_parent: &str,
        data_store_id: &str,
        data_store: &DataStore,
    ) -> Result<()> {
        let resource = format!("{collection_parent}/dataStores/{data_store_id}");
        let url = self.v1(&format!("{collection_parent}/dataStores"));
        let mut payload = to_payload(op::CREATE_DATA_STORE, &resource, data_store)?;
        if let Some(obj) = payload.as_object_mut() {
            obj.remove("name");
        }
        self.send(
            op::CREATE_DATA_STORE,
            &resource,
            Method::Post,
            &url,
            &[("dataStoreId", data_store_id.to_string())],
            Some(payload),
        )?;
        Ok(())
    }

    fn import_documents(&self, branch_name: &str, source: &GcsImport) -> Result<String> {
        let url = self.v1(&format!("{branch_name}/documents:import"));
        let operation: Value = self.send_json(
            op::IMPORT_DOCUMENTS,
            branch_name,
            Method::Post,
            &url,
            &[],
            Some(import_request(source)),
        )?;
        Ok(operation
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    fn list_documents(&self, branch_name: &str) -> Result<Vec<Document>> {
        let url = self.v1(&format!("{branch_name}/documents"));
        self.list_paged(op::LIST_DOCUMENTS, branch_name, &url, "documents")
    }

    fn delete_data_store(&self, name: &str) -> Result<()> {
        self.send(op::DELETE_DATA_STORE, name, Method::Delete, &self.v1(name), &[], None)?;
        Ok(())
    }

    fn get_workforce_config(&self, acl_config_name: &str) -> Result<WorkforceIdentityConfig> {
        let url = self.v1(acl_config_name);
        let result: Result<AclConfig> =
            self.send_json(op::GET_WORKFORCE, acl_config_name, Method::Get, &url, &[], None);
        match result {
            Ok(acl) => Ok(acl.into()),
            Err(e) if e.is_not_found() => Ok(WorkforceIdentityConfig::default()),
            Err(e) => Err(e),
        }
    }

    fn set_workforce_config(
        &self,
        acl_config_name: &str,
        pool_resource: &str,
    ) -> Result<WorkforceIdentityConfig> {
        let pool_resource = pool_resource.trim();
        let idp_config = if pool_resource.is_empty() {
            IdpConfig {
                idp_type: IDP_TYPE_UNSPECIFIED.to_string(),
                external_idp_config: None,
            }
        } else {
            IdpConfig {
                idp_type: IDP_TYPE_THIRD_PARTY.to_string(),
                external_idp_config: Some(ExternalIdpConfig {
                    workforce_pool_name: pool_resource.to_string(),
                }),
            }
        };
        let acl = AclConfig {
            name: acl_config_name.to_string(),
            idp_config: Some(idp_config),
        };
        let payload = to_payload(op::SET_WORKFORCE, acl_config_name, &acl)?;
        let updated: AclConfig = self.send_json(
            op::SET_WORKFORCE,
            acl_config_name,
            Method::Patch,
            &self.v1(acl_config_name),
            &[],
            Some(payload),
        )?;
        Ok(updated.into())
    }
}

// =============================================================================
// ACL config wire types
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AclConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idp_config: Option<IdpConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdpConfig {
    #[serde(default)]
    idp_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external_idp_config: Option<ExternalIdpConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExternalIdpConfig {
    #[serde(default)]
    workforce_pool_name: String,
}

impl From<AclConfig> for WorkforceIdentityConfig {
    fn from(acl: AclConfig) -> Self {
        let Some(idp) = acl.idp_config else {
            return Self::default();
        };
        let pool = idp
            .external_idp_config
            .map(|e| e.workforce_pool_name)
            .unwrap_or_default();
        Self::new(idp.idp_type, pool)
    }
}
