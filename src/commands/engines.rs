//! Engine (AI app) commands.

use anyhow::{Context, Result};
use enginekit::backend::Backend;
use enginekit::types::SearchEngineConfig;
use enginekit::{DataStore, Engine, ProjectContext};
use serde::Serialize;

use crate::Context as AppContext;
use crate::cli::EnginesCommand;
use crate::commands::{self, agents, features, snapshot, workforce};
use crate::output;
use crate::progress;
use crate::ui;

const SOLUTION_TYPE_SEARCH: &str = "SOLUTION_TYPE_SEARCH";
const INDUSTRY_VERTICAL_GENERIC: &str = "GENERIC";
const SEARCH_ADD_ON_LLM: &str = "SEARCH_ADD_ON_LLM";

pub fn run(ctx: &AppContext, cmd: EnginesCommand) -> Result<()> {
    match cmd {
        EnginesCommand::List => list(ctx),
        EnginesCommand::Describe { engine, full } => describe(ctx, &engine, full),
        EnginesCommand::Create {
            engine_id,
            display_name,
            data_stores,
            search_tier,
        } => create(ctx, &engine_id, &display_name, &data_stores, &search_tier),
        EnginesCommand::Delete { engine, force } => delete(ctx, &engine, force),
        EnginesCommand::Features(cmd) => features::run(ctx, cmd),
        EnginesCommand::Agents(cmd) => agents::run(ctx, cmd),
        EnginesCommand::Workforce(cmd) => workforce::run(ctx, cmd),
        EnginesCommand::Snapshot(cmd) => snapshot::run(ctx, cmd),
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let pb = progress::spinner("Fetching engines...", ctx.quiet);
    let engines = backend.list_engines(&project.collection_parent());
    progress::finish_clear(&pb);
    let engines = engines.context("Failed to list engines")?;
    output::emit(ctx.format(), &engines, || output::render_engines(&engines))
}

/// An engine together with the data stores it is connected to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineDetails {
    pub engine: Engine,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_stores: Vec<DataStore>,
}

/// Fetch an engine and, with `full`, the data stores it references.
///
/// Data stores that cannot be read are skipped with a warning.
pub fn engine_details(
    backend: &dyn Backend,
    project: &ProjectContext,
    engine_name: &str,
    full: bool,
) -> Result<EngineDetails> {
    let engine = backend
        .get_engine(engine_name)
        .with_context(|| format!("Failed to get engine {engine_name}"))?;

    let mut data_stores = Vec::new();
    if full {
        for id in &engine.data_store_ids {
            let name = project.data_store_name(id);
            match backend.get_data_store(&name) {
                Ok(store) => data_stores.push(store),
                Err(e) => log::warn!("skipping data store {name}: {e}"),
            }
        }
    }
    Ok(EngineDetails {
        engine,
        data_stores,
    })
}

fn describe(ctx: &AppContext, engine: &str, full: bool) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.engine_name(engine);
    let pb = progress::spinner("Fetching engine...", ctx.quiet);
    let details = engine_details(&backend, &project, &name, full);
    progress::finish_clear(&pb);
    let details = details?;

    output::emit(ctx.format(), &details, || {
        let mut out = output::render_engine(&details.engine);
        for store in &details.data_stores {
            out.push('\n');
            out.push_str(&output::render_data_store(store));
        }
        out
    })
}

/// Request body for a new search engine over `data_stores`.
pub fn build_search_engine(display_name: &str, data_stores: &[String], search_tier: &str) -> Engine {
    Engine {
        display_name: display_name.to_string(),
        solution_type: SOLUTION_TYPE_SEARCH.to_string(),
        industry_vertical: INDUSTRY_VERTICAL_GENERIC.to_string(),
        data_store_ids: data_stores.to_vec(),
        search_engine_config: Some(SearchEngineConfig {
            search_tier: search_tier.to_string(),
            search_add_ons: vec![SEARCH_ADD_ON_LLM.to_string()],
        }),
        ..Default::default()
    }
}

/// Create an engine and return its full name.
pub fn create_engine(
    backend: &dyn Backend,
    project: &ProjectContext,
    engine_id: &str,
    request: &Engine,
) -> Result<String> {
    if engine_id.trim().is_empty() || engine_id.contains('/') {
        anyhow::bail!("engine ID must be a non-empty short ID, got '{engine_id}'");
    }
    let parent = project.collection_parent();
    backend
        .create_engine(&parent, engine_id, request)
        .with_context(|| format!("Failed to create engine {engine_id}"))?;
    Ok(project.engine_name(engine_id))
}

fn create(
    ctx: &AppContext,
    engine_id: &str,
    display_name: &str,
    data_stores: &[String],
    search_tier: &str,
) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let request = build_search_engine(display_name, data_stores, search_tier);
    let pb = progress::spinner(&format!("Creating engine {engine_id}..."), ctx.quiet);
    match create_engine(&backend, &project, engine_id, &request) {
        Ok(name) => {
            progress::finish_success(&pb, &format!("Created engine {name}"));
            Ok(())
        }
        Err(e) => {
            progress::finish_error(&pb, "Engine creation failed");
            Err(e)
        }
    }
}

fn delete(ctx: &AppContext, engine: &str, force: bool) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.engine_name(engine);
    let existing = backend
        .get_engine(&name)
        .with_context(|| format!("Failed to get engine {name}"))?;

    if !force {
        ui::kv("Engine", &existing.display_name);
        ui::kv("Name", &existing.name);
        ui::kv("Solution Type", &existing.solution_type);
    }
    if !commands::confirmed(force, "Delete this engine?")? {
        return Ok(());
    }

    backend
        .delete_engine(&name)
        .with_context(|| format!("Failed to delete engine {name}"))?;
    ui::success(&format!("Deleted engine {name}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginekit::backend::{MockBackend, MockCall, op};

    fn project() -> ProjectContext {
        ProjectContext::new("p", "global", "default_collection")
    }

    #[test]
    fn test_build_search_engine() {
        let engine = build_search_engine(
            "Support",
            &["ds-a".to_string(), "ds-b".to_string()],
            "SEARCH_TIER_ENTERPRISE",
        );
        assert_eq!(engine.solution_type, "SOLUTION_TYPE_SEARCH");
        assert_eq!(engine.industry_vertical, "GENERIC");
        assert_eq!(engine.data_store_ids, vec!["ds-a", "ds-b"]);
        let search = engine.search_engine_config.unwrap();
        assert_eq!(search.search_tier, "SEARCH_TIER_ENTERPRISE");
        assert_eq!(search.search_add_ons, vec!["SEARCH_ADD_ON_LLM"]);
    }

    #[test]
    fn test_create_engine() {
        let mock = MockBackend::new();
        let request = build_search_engine("Support", &[], "SEARCH_TIER_STANDARD");
        let name = create_engine(&mock, &project(), "support", &request).unwrap();

        assert_eq!(
            name,
            "projects/p/locations/global/collections/default_collection/engines/support"
        );
        assert_eq!(mock.engine(&name).unwrap().display_name, "Support");
        assert_eq!(
            mock.writes(),
            vec![MockCall::CreateEngine {
                parent: "projects/p/locations/global/collections/default_collection".to_string(),
                engine_id: "support".to_string(),
            }]
        );
    }

    #[test]
    fn test_create_engine_rejects_full_name() {
        let mock = MockBackend::new();
        let request = build_search_engine("Support", &[], "SEARCH_TIER_STANDARD");
        assert!(create_engine(&mock, &project(), "projects/p/engines/x", &request).is_err());
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_engine_details_full() {
        let mock = MockBackend::new();
        let ctx = project();
        let name = ctx.engine_name("support");
        mock.insert_engine(Engine {
            name: name.clone(),
            data_store_ids: vec!["docs".to_string(), "missing".to_string()],
            ..Default::default()
        });
        mock.insert_data_store(DataStore {
            name: ctx.data_store_name("docs"),
            display_name: "Docs".to_string(),
            ..Default::default()
        });

        let brief = engine_details(&mock, &ctx, &name, false).unwrap();
        assert!(brief.data_stores.is_empty());

        let full = engine_details(&mock, &ctx, &name, true).unwrap();
        assert_eq!(full.data_stores.len(), 1);
        assert_eq!(full.data_stores[0].display_name, "Docs");
    }

    #[test]
    fn test_engine_details_propagates_failure() {
        let mock = MockBackend::new();
        mock.fail_on(op::GET_ENGINE);
        let err = engine_details(&mock, &project(), "projects/p/x/engines/e", false).unwrap_err();
        assert!(format!("{err:#}").contains("injected failure"));
    }
}
