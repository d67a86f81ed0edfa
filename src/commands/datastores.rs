//! Data store commands.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::Context as AppContext;
use crate::cli::DataStoresCommand;
use crate::commands;
use crate::output;
use crate::progress;
use crate::ui;
use enginekit::backend::Backend;
use enginekit::names::branch_name;
use enginekit::types::CONTENT_REQUIRED;
use enginekit::{DataStore, GcsImport, ProjectContext};

const SOLUTION_TYPE_SEARCH: &str = "SOLUTION_TYPE_SEARCH";
const INDUSTRY_VERTICAL_GENERIC: &str = "GENERIC";

pub fn run(ctx: &AppContext, cmd: DataStoresCommand) -> Result<()> {
    match cmd {
        DataStoresCommand::List => list(ctx),
        DataStoresCommand::Describe { data_store } => describe(ctx, &data_store),
        DataStoresCommand::CreateFromGcs {
            data_store_id,
            display_name,
            gcs_uri,
            data_schema,
            reconciliation_mode,
        } => {
            let source = GcsImport::new(gcs_uri, data_schema, reconciliation_mode)?;
            create_from_gcs_cmd(ctx, &data_store_id, &display_name, &source)
        }
        DataStoresCommand::ListDocuments { data_store, branch } => {
            list_documents(ctx, &data_store, &branch)
        }
        DataStoresCommand::Delete { data_store, force } => delete(ctx, &data_store, force),
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let parent = project.collection_parent();
    let pb = progress::spinner("Fetching data stores...", ctx.quiet);
    let stores = backend.list_data_stores(&parent);
    progress::finish_clear(&pb);
    let stores = stores.with_context(|| format!("Failed to list data stores in {parent}"))?;
    output::emit(ctx.format(), &stores, || output::render_data_stores(&stores))
}

fn describe(ctx: &AppContext, data_store: &str) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.data_store_name(data_store);
    let store = backend
        .get_data_store(&name)
        .with_context(|| format!("Failed to get data store {name}"))?;
    output::emit(ctx.format(), &store, || output::render_data_store(&store))
}

/// A data store created for a Cloud Storage import.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DataStoreImport {
    pub data_store_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub import_operation: String,
}

/// Request body for a generic search data store of unstructured documents.
pub fn build_gcs_data_store(display_name: &str) -> DataStore {
    DataStore {
        display_name: display_name.to_string(),
        industry_vertical: INDUSTRY_VERTICAL_GENERIC.to_string(),
        solution_types: vec![SOLUTION_TYPE_SEARCH.to_string()],
        content_config: CONTENT_REQUIRED.to_string(),
        ..Default::default()
    }
}

/// Create a data store and start importing `source` into its default branch.
///
/// The import is not awaited; the returned operation can be polled in the console.
pub fn create_from_gcs(
    backend: &dyn Backend,
    project: &ProjectContext,
    data_store_id: &str,
    display_name: &str,
    source: &GcsImport,
) -> Result<DataStoreImport> {
    if data_store_id.trim().is_empty() || data_store_id.contains('/') {
        anyhow::bail!("data store ID must be a non-empty short ID, got '{data_store_id}'");
    }
    let parent = project.collection_parent();
    backend
        .create_data_store(&parent, data_store_id, &build_gcs_data_store(display_name))
        .with_context(|| format!("Failed to create data store {data_store_id}"))?;

    let name = project.data_store_name(data_store_id);
    let branch = branch_name(&name, "");
    log::info!("importing {} into {branch}", source.gcs_uri);
    let import_operation = backend
        .import_documents(&branch, source)
        .with_context(|| format!("Created {name} but failed to import {}", source.gcs_uri))?;

    Ok(DataStoreImport {
        data_store_name: name,
        import_operation,
    })
}

fn create_from_gcs_cmd(
    ctx: &AppContext,
    data_store_id: &str,
    display_name: &str,
    source: &GcsImport,
) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let pb = progress::spinner(&format!("Creating data store {data_store_id}..."), ctx.quiet);
    let created = create_from_gcs(&backend, &project, data_store_id, display_name, source);
    progress::finish_clear(&pb);
    let created = created?;
    output::emit(ctx.format(), &created, || {
        output::render_data_store_import(&created.data_store_name, &created.import_operation)
    })
}

fn list_documents(ctx: &AppContext, data_store: &str, branch: &str) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let branch_path = branch_name(&project.data_store_name(data_store), branch);
    let pb = progress::spinner("Fetching documents...", ctx.quiet);
    let documents = backend.list_documents(&branch_path);
    progress::finish_clear(&pb);
    let documents =
        documents.with_context(|| format!("Failed to list documents in {branch_path}"))?;
    output::emit(ctx.format(), &documents, || {
        output::render_documents(&documents, data_store, branch)
    })
}

/// Delete a data store after checking it exists.
pub fn delete_data_store<C>(backend: &dyn Backend, name: &str, confirm: C) -> Result<bool>
where
    C: FnOnce(&DataStore) -> Result<bool>,
{
    let existing = backend
        .get_data_store(name)
        .with_context(|| format!("Failed to get data store {name}"))?;
    if !confirm(&existing)? {
        return Ok(false);
    }
    backend
        .delete_data_store(name)
        .with_context(|| format!("Failed to delete data store {name}"))?;
    Ok(true)
}

fn delete(ctx: &AppContext, data_store: &str, force: bool) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.data_store_name(data_store);
    let deleted = delete_data_store(&backend, &name, |existing| {
        if !force {
            ui::kv("Data Store", &existing.display_name);
            ui::kv("Name", &existing.name);
            ui::kv("Content Config", &existing.content_config);
            ui::kv("Created", &ui::or_dash(&existing.create_time));
        }
        commands::confirmed(force, "Delete this data store?")
    })?;
    if deleted {
        ui::success(&format!("Deleted data store {name}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginekit::backend::{MockBackend, MockCall, op};

    const PARENT: &str = "projects/p/locations/global/collections/default_collection";

    fn project() -> ProjectContext {
        ProjectContext::new("p", "global", "default_collection")
    }

    fn source() -> GcsImport {
        GcsImport::new("gs://bucket/docs/*", "content", "INCREMENTAL").unwrap()
    }

    #[test]
    fn test_build_gcs_data_store() {
        let store = build_gcs_data_store("Docs");
        assert_eq!(store.display_name, "Docs");
        assert_eq!(store.industry_vertical, "GENERIC");
        assert_eq!(store.solution_types, vec!["SOLUTION_TYPE_SEARCH"]);
        assert_eq!(store.content_config, CONTENT_REQUIRED);
        assert!(store.name.is_empty());
    }

    #[test]
    fn test_create_from_gcs_creates_then_imports() {
        let mock = MockBackend::new();
        let created = create_from_gcs(&mock, &project(), "docs", "Docs", &source()).unwrap();

        let name = format!("{PARENT}/dataStores/docs");
        assert_eq!(created.data_store_name, name);
        assert!(!created.import_operation.is_empty());
        assert_eq!(
            mock.writes(),
            vec![
                MockCall::CreateDataStore {
                    parent: PARENT.to_string(),
                    data_store_id: "docs".to_string(),
                },
                MockCall::ImportDocuments {
                    branch: format!("{name}/branches/default_branch"),
                    gcs_uri: "gs://bucket/docs/*".to_string(),
                },
            ]
        );
        assert_eq!(mock.data_store(&name).unwrap().display_name, "Docs");
    }

    #[test]
    fn test_create_from_gcs_rejects_bad_id_and_reports_import_failure() {
        let mock = MockBackend::new();
        assert!(create_from_gcs(&mock, &project(), "a/b", "Docs", &source()).is_err());
        assert!(mock.writes().is_empty());

        mock.fail_on(op::IMPORT_DOCUMENTS);
        let err = create_from_gcs(&mock, &project(), "docs", "Docs", &source()).unwrap_err();
        assert!(err.to_string().contains("failed to import gs://bucket/docs/*"));
        // The data store stays created.
        assert_eq!(mock.writes().len(), 1);
    }

    #[test]
    fn test_delete_data_store_confirmation() {
        let mock = MockBackend::new();
        let name = format!("{PARENT}/dataStores/docs");
        mock.insert_data_store(DataStore {
            name: name.clone(),
            display_name: "Docs".to_string(),
            ..Default::default()
        });

        let deleted = delete_data_store(&mock, &name, |existing| {
            assert_eq!(existing.display_name, "Docs");
            Ok(false)
        })
        .unwrap();
        assert!(!deleted);
        assert!(mock.writes().is_empty());

        assert!(delete_data_store(&mock, &name, |_| Ok(true)).unwrap());
        assert_eq!(mock.writes(), vec![MockCall::DeleteDataStore { name: name.clone() }]);

        let missing = delete_data_store(&mock, &name, |_| panic!("nothing to confirm"));
        assert!(missing.is_err());
    }
}
