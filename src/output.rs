//! Rendering of resources, diffs and reports in table, JSON or YAML form.

use anyhow::{Context, Result};
use colored::Colorize;
use enginekit::names::resource_id;
use enginekit::snapshot::diff::{AgentDiff, ChangeKind, FeatureDiff, FieldDiff, SnapshotDiff};
use enginekit::snapshot::restore::RestoreReport;
use enginekit::types::{FEATURE_STATE_OFF, FEATURE_STATE_ON};
use enginekit::{Agent, DataStore, Document, Engine, WorkforceIdentityConfig};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

use crate::cli::OutputFormat;
use crate::ui;

const WIDE: usize = 100;
const NARROW: usize = 80;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize JSON")
}

pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_yaml::to_string(value).context("Failed to serialize YAML")
}

/// Print `value` as JSON/YAML, or the table produced by `table`.
pub fn emit<T, F>(format: OutputFormat, value: &T, table: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => println!("{}", to_json(value)?),
        OutputFormat::Yaml => print!("{}", to_yaml(value)?),
        OutputFormat::Table => print!("{}", table()),
    }
    Ok(())
}

fn rule(out: &mut String, ch: char, width: usize) {
    let _ = writeln!(out, "{}", ch.to_string().repeat(width).dimmed());
}

fn title(out: &mut String, text: &str) {
    rule(out, '=', NARROW);
    let _ = writeln!(out, "{}", text.bold());
    rule(out, '=', NARROW);
}

// ============================================================================
// Engines
// ============================================================================

pub fn render_engines(engines: &[Engine]) -> String {
    let mut out = String::new();
    if engines.is_empty() {
        let _ = writeln!(out, "No engines found.");
        return out;
    }

    rule(&mut out, '=', WIDE);
    let _ = writeln!(out, "{:<50} {:<35} {:<12}", "NAME", "DISPLAY NAME", "TYPE");
    rule(&mut out, '=', WIDE);
    for engine in engines {
        let solution = engine
            .solution_type
            .strip_prefix("SOLUTION_TYPE_")
            .unwrap_or(&engine.solution_type);
        let _ = writeln!(
            out,
            "{:<50} {:<35} {:<12}",
            resource_id(&engine.name),
            ui::truncate(&engine.display_name, 35),
            solution
        );
    }
    let _ = writeln!(out, "\nTotal: {} engine(s)", engines.len());
    out
}

pub fn render_engine(engine: &Engine) -> String {
    let mut out = String::new();
    title(&mut out, &format!("Engine: {}", engine.display_name));
    let _ = writeln!(out, "Name: {}", engine.name);
    let _ = writeln!(out, "Solution Type: {}", engine.solution_type);
    let _ = writeln!(out, "Industry Vertical: {}", engine.industry_vertical);
    let _ = writeln!(out, "App Type: {}", engine.app_type);

    if !engine.common_config.is_empty() {
        let _ = writeln!(out, "\nCommon Config:");
        for (key, value) in &engine.common_config {
            let _ = writeln!(out, "  {key}: {}", scalar(value));
        }
    }

    if let Some(search) = &engine.search_engine_config {
        let _ = writeln!(out, "\nSearch Config:");
        let _ = writeln!(out, "  Search Tier: {}", search.search_tier);
        if !search.search_add_ons.is_empty() {
            let _ = writeln!(out, "  Search Add-ons: {}", search.search_add_ons.join(", "));
        }
    }

    if !engine.data_store_ids.is_empty() {
        let _ = writeln!(out, "\nData Stores ({}):", engine.data_store_ids.len());
        for id in &engine.data_store_ids {
            let _ = writeln!(out, "  - {id}");
        }
    }

    if !engine.features.is_empty() {
        let enabled: Vec<&String> = engine
            .features
            .iter()
            .filter(|(_, state)| is_on(state))
            .map(|(key, _)| key)
            .collect();
        let _ = writeln!(
            out,
            "\nFeatures ({}/{} enabled):",
            enabled.len(),
            engine.features.len()
        );
        for key in enabled {
            let _ = writeln!(out, "  {} {key}", "✓".green());
        }
    }
    out
}

// ============================================================================
// Features
// ============================================================================

fn is_on(state: &str) -> bool {
    feature_state_label(state) == "ON"
}

/// Short label for a feature state.
pub fn feature_state_label(state: &str) -> &str {
    match state {
        FEATURE_STATE_ON => "ON",
        FEATURE_STATE_OFF => "OFF",
        s if s.eq_ignore_ascii_case("on") => "ON",
        s if s.eq_ignore_ascii_case("off") => "OFF",
        s => s,
    }
}

pub fn render_features(engine: &Engine) -> String {
    let mut out = String::new();
    if engine.features.is_empty() {
        let _ = writeln!(out, "No feature configuration found for this engine.");
        return out;
    }

    title(&mut out, &format!("Features for engine: {}", engine.display_name));
    let _ = writeln!(out, "{:<40} {:<10}", "FEATURE", "STATE");
    rule(&mut out, '-', NARROW);
    let mut enabled = 0;
    for (key, state) in &engine.features {
        let label = feature_state_label(state);
        let cell = match label {
            "ON" => {
                enabled += 1;
                label.green().to_string()
            }
            "OFF" => label.dimmed().to_string(),
            other => other.to_string(),
        };
        let _ = writeln!(out, "{key:<40} {cell}");
    }
    let _ = writeln!(out, "\nEnabled: {enabled}/{}", engine.features.len());
    out
}

// ============================================================================
// Agents
// ============================================================================

pub fn render_agents(agents: &[Agent]) -> String {
    let mut out = String::new();
    if agents.is_empty() {
        let _ = writeln!(out, "No agents registered for this engine.");
        return out;
    }

    rule(&mut out, '=', WIDE);
    let _ = writeln!(out, "{:<22} {:<32} {:<45}", "AGENT ID", "DISPLAY NAME", "DIALOGFLOW AGENT");
    rule(&mut out, '=', WIDE);
    for agent in agents {
        let link = match agent.dialogflow_agent() {
            "" => "N/A",
            link => link,
        };
        let _ = writeln!(
            out,
            "{:<22} {:<32} {:<45}",
            resource_id(&agent.name),
            ui::truncate(&agent.display_name, 32),
            ui::truncate(link, 45)
        );
    }
    let _ = writeln!(out, "\nTotal: {} agent(s)", agents.len());
    out
}

pub fn render_agent(agent: &Agent) -> String {
    let mut out = String::new();
    title(&mut out, &format!("Agent: {}", agent.display_name));
    let _ = writeln!(out, "Name: {}", agent.name);
    let _ = writeln!(out, "Description: {}", agent.description);
    let _ = writeln!(out, "Reasoning Engine: {}", ui::or_dash(&agent.reasoning_engine));
    if !agent.dialogflow_agent().is_empty() {
        let _ = writeln!(out, "Dialogflow Agent: {}", agent.dialogflow_agent());
    }
    match agent.icon_parts() {
        ("", "") => {}
        ("", _) => {
            let _ = writeln!(out, "Icon: [embedded Base64 content]");
        }
        (uri, _) => {
            let _ = writeln!(out, "Icon URI: {uri}");
        }
    }

    if !agent.capabilities.is_empty() {
        let _ = writeln!(out, "\nCapabilities ({}):", agent.capabilities.len());
        for capability in &agent.capabilities {
            let _ = writeln!(out, "  - {capability}");
        }
    }
    for (heading, map) in [("Labels", &agent.labels), ("Annotations", &agent.annotations)] {
        if map.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{heading}:");
        for (key, value) in map {
            let _ = writeln!(out, "  {key}: {value}");
        }
    }

    if !agent.create_time.is_empty() {
        let _ = writeln!(out, "\nCreated: {}", agent.create_time);
    }
    if !agent.update_time.is_empty() {
        let _ = writeln!(out, "Updated: {}", agent.update_time);
    }
    out
}

// ============================================================================
// Data stores
// ============================================================================

pub fn render_data_stores(stores: &[DataStore]) -> String {
    let mut out = String::new();
    if stores.is_empty() {
        let _ = writeln!(out, "No data stores found.");
        return out;
    }

    rule(&mut out, '=', WIDE);
    let _ = writeln!(out, "{:<45} {:<32} {:<20}", "NAME", "DISPLAY NAME", "CONTENT CONFIG");
    rule(&mut out, '=', WIDE);
    for store in stores {
        let _ = writeln!(
            out,
            "{:<45} {:<32} {:<20}",
            resource_id(&store.name),
            ui::truncate(&store.display_name, 32),
            store.content_config
        );
    }
    let _ = writeln!(out, "\nTotal: {} data store(s)", stores.len());
    out
}

pub fn render_data_store(store: &DataStore) -> String {
    let mut out = String::new();
    title(&mut out, &format!("Data Store: {}", store.display_name));
    let _ = writeln!(out, "Name: {}", store.name);
    let _ = writeln!(out, "Industry Vertical: {}", store.industry_vertical);
    let _ = writeln!(out, "Content Config: {}", store.content_config);
    let _ = writeln!(out, "Created: {}", ui::or_dash(&store.create_time));
    if !store.solution_types.is_empty() {
        let _ = writeln!(out, "Solution Types: {}", store.solution_types.join(", "));
    }
    if store.create_advanced_site_search {
        let _ = writeln!(out, "Advanced Site Search: enabled");
    }
    out
}

pub fn render_data_store_import(data_store_name: &str, import_operation: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} Created data store: {}", "✓".green(), data_store_name);
    if !import_operation.is_empty() {
        let _ = writeln!(out, "Import operation: {import_operation}");
    }
    out
}

pub fn render_documents(documents: &[Document], data_store: &str, branch: &str) -> String {
    let mut out = String::new();
    if documents.is_empty() {
        let _ = writeln!(out, "No documents found in this data store.");
        return out;
    }

    rule(&mut out, '=', WIDE);
    let _ = writeln!(out, "Documents in Data Store: {data_store}");
    let _ = writeln!(out, "Branch: {branch}");
    rule(&mut out, '=', WIDE);
    let _ = writeln!(out, "{:<40} {:<50} {:<25}", "ID", "URI", "INDEX TIME");
    rule(&mut out, '-', WIDE);
    for doc in documents {
        let uri = match doc.uri() {
            "" => "N/A",
            uri => uri,
        };
        let _ = writeln!(
            out,
            "{:<40} {:<50} {:<25}",
            ui::truncate(&doc.id, 40),
            ui::truncate(uri, 50),
            ui::or_dash(&doc.index_time)
        );
    }
    let _ = writeln!(out, "\nTotal: {} document(s)", documents.len());
    out
}

// ============================================================================
// Workforce identity
// ============================================================================

pub fn render_workforce(config: &WorkforceIdentityConfig) -> String {
    let mut out = String::new();
    title(&mut out, "Workforce Identity");
    if !config.is_enabled() {
        let _ = writeln!(out, "Status: {}", "disabled".dimmed());
        let _ = writeln!(out, "IdP Type: {}", ui::or_dash(&config.idp_type));
        return out;
    }
    let _ = writeln!(out, "Status: {}", "enabled".green());
    let _ = writeln!(out, "IdP Type: {}", config.idp_type);
    let _ = writeln!(out, "Pool Resource: {}", config.workforce_pool_name);
    let _ = writeln!(out, "Location: {}", ui::or_dash(&config.workforce_location));
    let _ = writeln!(out, "Pool ID: {}", ui::or_dash(&config.workforce_pool_id));
    let _ = writeln!(out, "Provider ID: {}", ui::or_dash(&config.workforce_provider));
    out
}

// ============================================================================
// Snapshot diffs and restore reports
// ============================================================================

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "(unset)".to_string(),
        Value::String(s) if s.is_empty() => "\"\"".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pretty(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => {
            let mut text = serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            text.push('\n');
            text
        }
    }
}

/// Line diff of two pretty-printed JSON values.
fn render_composite(out: &mut String, change: &FieldDiff) {
    let (old, new) = (pretty(&change.old), pretty(&change.new));
    let diff = similar::TextDiff::from_lines(&old, &new);
    for line in diff.iter_all_changes() {
        match line.tag() {
            similar::ChangeTag::Delete => {
                let _ = write!(out, "      {}", format!("- {line}").red());
            }
            similar::ChangeTag::Insert => {
                let _ = write!(out, "      {}", format!("+ {line}").green());
            }
            similar::ChangeTag::Equal => {}
        }
    }
}

fn render_fields(out: &mut String, heading: &str, changes: &[FieldDiff]) {
    if changes.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}", heading.cyan().bold());
    for change in changes {
        if change.is_composite() {
            let _ = writeln!(out, "  {}:", change.field);
            render_composite(out, change);
        } else {
            let _ = writeln!(
                out,
                "  {}: {} -> {}",
                change.field,
                scalar(&change.old).red(),
                scalar(&change.new).green()
            );
        }
    }
}

fn feature_side(state: &str) -> String {
    if state.is_empty() {
        "(unset)".to_string()
    } else {
        feature_state_label(state).to_string()
    }
}

fn render_feature_changes(out: &mut String, changes: &[FeatureDiff]) {
    for change in changes {
        let _ = writeln!(
            out,
            "  {}: {} -> {}",
            change.feature,
            feature_side(&change.old),
            feature_side(&change.new)
        );
    }
}

fn render_agent_changes(out: &mut String, changes: &[AgentDiff]) {
    for change in changes {
        let agent = change.new.as_ref().or(change.old.as_ref());
        let label = agent
            .map(|a| a.display_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&change.key);
        let line = match change.change_type {
            ChangeKind::Added => format!("+ {label}").green().to_string(),
            ChangeKind::Removed => format!("- {label}").red().to_string(),
            ChangeKind::Updated => format!("~ {label}").yellow().to_string(),
        };
        let _ = write!(out, "  {line} ({})", change.change_type);
        if change.fields.is_empty() {
            let _ = writeln!(out);
        } else {
            let _ = writeln!(out, " [{}]", change.fields.join(", "));
        }
        let _ = writeln!(out, "      {}", change.key.dimmed());
    }
}

pub fn render_diff(diff: &SnapshotDiff) -> String {
    let mut out = String::new();
    if diff.is_empty() {
        let _ = writeln!(out, "No differences found.");
        return out;
    }

    render_fields(&mut out, "Metadata changes:", &diff.metadata_changes);
    render_fields(&mut out, "Engine changes:", &diff.engine_changes);
    if !diff.feature_changes.is_empty() {
        let _ = writeln!(out, "\n{}", "Feature changes:".cyan().bold());
        render_feature_changes(&mut out, &diff.feature_changes);
    }
    if !diff.agent_changes.is_empty() {
        let _ = writeln!(out, "\n{}", "Agent changes:".cyan().bold());
        render_agent_changes(&mut out, &diff.agent_changes);
    }
    let _ = writeln!(out, "\nTotal: {} change(s)", diff.len());
    out
}

pub fn render_restore_report(report: &RestoreReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Target Engine: {}", report.engine_name);
    if report.created {
        let _ = writeln!(out, "{} Engine created.", "✓".green());
    }
    if report.engine_patched {
        let _ = writeln!(out, "{} Engine configuration updated.", "✓".green());
    }
    if !report.feature_changes.is_empty() {
        let _ = writeln!(out, "\nFeature changes:");
        render_feature_changes(&mut out, &report.feature_changes);
    }
    if !report.agent_changes.is_empty() {
        let _ = writeln!(out, "\nAgent changes:");
        render_agent_changes(&mut out, &report.agent_changes);
    }
    if !report.created
        && !report.engine_patched
        && report.feature_changes.is_empty()
        && report.agent_changes.is_empty()
    {
        let _ = writeln!(out, "No changes applied.");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginekit::types::DialogflowAgentDefinition;
    use serde_json::json;

    fn plain() {
        colored::control::set_override(false);
    }

    fn engine() -> Engine {
        let mut engine = Engine {
            name: "projects/p/locations/global/collections/default_collection/engines/support"
                .to_string(),
            display_name: "Support".to_string(),
            solution_type: "SOLUTION_TYPE_SEARCH".to_string(),
            ..Default::default()
        };
        engine
            .features
            .insert("agent-gallery".to_string(), FEATURE_STATE_ON.to_string());
        engine
            .features
            .insert("feedback".to_string(), FEATURE_STATE_OFF.to_string());
        engine
    }

    #[test]
    fn test_feature_state_label() {
        assert_eq!(feature_state_label(FEATURE_STATE_ON), "ON");
        assert_eq!(feature_state_label(FEATURE_STATE_OFF), "OFF");
        assert_eq!(feature_state_label("on"), "ON");
        assert_eq!(feature_state_label("FEATURE_STATE_UNSPECIFIED"), "FEATURE_STATE_UNSPECIFIED");
    }

    #[test]
    fn test_render_engines() {
        plain();
        let out = render_engines(&[engine()]);
        assert!(out.contains("support"));
        assert!(out.contains("SEARCH"));
        assert!(!out.contains("SOLUTION_TYPE_SEARCH"));
        assert!(out.contains("Total: 1 engine(s)"));
        assert_eq!(render_engines(&[]), "No engines found.\n");
    }

    #[test]
    fn test_render_features_counts_enabled() {
        plain();
        let out = render_features(&engine());
        assert!(out.contains("Enabled: 1/2"));
        let gallery = out.lines().find(|l| l.starts_with("agent-gallery")).unwrap();
        assert!(gallery.ends_with("ON"));
    }

    #[test]
    fn test_render_agents_without_link() {
        plain();
        let mut agent = Agent {
            name: "e/assistants/default_assistant/agents/42".to_string(),
            display_name: "Helper".to_string(),
            ..Default::default()
        };
        let out = render_agents(std::slice::from_ref(&agent));
        assert!(out.contains("42"));
        assert!(out.contains("N/A"));

        agent.dialogflow_agent_definition = Some(DialogflowAgentDefinition {
            dialogflow_agent: "projects/p/locations/global/agents/1".to_string(),
        });
        assert!(render_agent(&agent).contains("Dialogflow Agent: projects/p/locations/global/agents/1"));
    }

    #[test]
    fn test_render_documents() {
        plain();
        let mut doc = Document {
            id: "doc-1".to_string(),
            index_time: "2025-01-01T00:00:00Z".to_string(),
            ..Default::default()
        };
        doc.content
            .insert("uri".to_string(), Value::String("gs://bucket/a.pdf".to_string()));
        let out = render_documents(&[doc, Document::default()], "docs", "default_branch");
        assert!(out.contains("Documents in Data Store: docs"));
        assert!(out.contains("Branch: default_branch"));
        assert!(out.contains("gs://bucket/a.pdf"));
        assert!(out.contains("N/A"));
        assert!(out.contains("Total: 2 document(s)"));
        assert_eq!(
            render_documents(&[], "docs", "default_branch"),
            "No documents found in this data store.\n"
        );
    }

    #[test]
    fn test_render_data_store_import() {
        plain();
        let out = render_data_store_import("projects/p/dataStores/docs", "op/1");
        assert!(out.contains("Created data store: projects/p/dataStores/docs"));
        assert!(out.contains("Import operation: op/1"));
        assert!(!render_data_store_import("ds", "").contains("Import operation"));
    }

    #[test]
    fn test_render_diff_sections() {
        plain();
        let diff = SnapshotDiff {
            engine_changes: vec![
                FieldDiff {
                    field: "displayName".to_string(),
                    old: json!("Old"),
                    new: json!("New"),
                },
                FieldDiff {
                    field: "dataStoreIds".to_string(),
                    old: json!(["a", "b"]),
                    new: json!(["a", "c"]),
                },
            ],
            feature_changes: vec![FeatureDiff {
                feature: "feedback".to_string(),
                old: String::new(),
                new: FEATURE_STATE_ON.to_string(),
            }],
            agent_changes: vec![AgentDiff {
                key: "dialogflow:projects/p/locations/global/agents/1".to_string(),
                change_type: ChangeKind::Removed,
                old: Some(Agent {
                    display_name: "Helper".to_string(),
                    ..Default::default()
                }),
                new: None,
                fields: Vec::new(),
            }],
            ..Default::default()
        };

        let out = render_diff(&diff);
        assert!(out.contains("displayName: Old -> New"));
        let removed: Vec<&str> = out.lines().filter(|l| l.trim_start().starts_with("- ")).collect();
        let added: Vec<&str> = out.lines().filter(|l| l.trim_start().starts_with("+ ")).collect();
        assert!(removed.iter().any(|l| l.contains("\"b\"")));
        assert!(added.iter().any(|l| l.contains("\"c\"")));
        assert!(!removed.iter().any(|l| l.contains("\"a\"")));
        assert!(out.contains("feedback: (unset) -> ON"));
        assert!(out.contains("- Helper (removed)"));
        assert!(out.contains("Total: 4 change(s)"));
    }

    #[test]
    fn test_render_empty_diff() {
        assert_eq!(render_diff(&SnapshotDiff::default()), "No differences found.\n");
    }

    #[test]
    fn test_render_restore_report() {
        plain();
        let report = RestoreReport {
            engine_name: "projects/p/engines/e".to_string(),
            created: true,
            ..Default::default()
        };
        let out = render_restore_report(&report);
        assert!(out.contains("Engine created."));
        assert!(!out.contains("No changes applied."));

        let idle = RestoreReport {
            engine_name: "projects/p/engines/e".to_string(),
            ..Default::default()
        };
        assert!(render_restore_report(&idle).contains("No changes applied."));
    }

    #[test]
    fn test_yaml_output() {
        let yaml = to_yaml(&engine()).unwrap();
        assert!(yaml.contains("displayName: Support"));
        let json = to_json(&engine()).unwrap();
        assert!(json.contains("\"displayName\": \"Support\""));
    }
}
