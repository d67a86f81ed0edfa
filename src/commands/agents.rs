//! Agent registration commands.

use anyhow::{Context, Result};
use enginekit::backend::Backend;
use enginekit::names::agent_name;
use enginekit::types::{AgentIcon, DialogflowAgentDefinition, resolve_dialogflow_agent};
use enginekit::{Agent, AgentInput};

use crate::Context as AppContext;
use crate::cli::{AgentCreateArgs, AgentUpdateArgs, AgentsCommand, DialogflowArgs};
use crate::commands;
use crate::output;
use crate::progress;
use crate::ui;

pub fn run(ctx: &AppContext, cmd: AgentsCommand) -> Result<()> {
    match cmd {
        AgentsCommand::List { engine } => list(ctx, &engine),
        AgentsCommand::Describe { engine, agent } => describe(ctx, &engine, &agent),
        AgentsCommand::Create(args) => create(ctx, &args),
        AgentsCommand::Update(args) => update(ctx, &args),
        AgentsCommand::Delete {
            engine,
            agent,
            force,
        } => delete(ctx, &engine, &agent, force),
    }
}

/// Dialogflow agent resource from the flags, if any were given.
fn dialogflow_resource(args: &DialogflowArgs) -> Result<Option<String>> {
    let get = |v: &Option<String>| v.clone().unwrap_or_default();
    let link = resolve_dialogflow_agent(
        &get(&args.dialogflow_agent),
        &get(&args.dialogflow_project),
        &get(&args.dialogflow_location),
        &get(&args.dialogflow_agent_id),
    )?;
    Ok(link)
}

fn required(value: &str, flag: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{flag} is required");
    }
    Ok(())
}

/// Validate create flags and build the registration payload.
pub fn create_input(args: &AgentCreateArgs) -> Result<AgentInput> {
    required(&args.display_name, "--display-name")?;
    required(&args.description, "--description")?;
    required(&args.reasoning_engine, "--reasoning-engine")?;

    let Some(link) = dialogflow_resource(&args.dialogflow)? else {
        anyhow::bail!(
            "dialogflow agent information is required via --dialogflow-agent \
             or the project/location/agent ID flags"
        );
    };

    let uri = args.icon_uri.clone().unwrap_or_default();
    let content = args.icon_content.clone().unwrap_or_default();
    let icon = (!uri.is_empty() || !content.is_empty()).then_some(AgentIcon { uri, content });

    Ok(AgentInput {
        display_name: args.display_name.clone(),
        description: args.description.clone(),
        icon,
        dialogflow_agent_definition: Some(DialogflowAgentDefinition {
            dialogflow_agent: link,
        }),
        reasoning_engine: args.reasoning_engine.clone(),
    })
}

/// Build an update payload and mask from the flags that were given.
pub fn update_input(args: &AgentUpdateArgs) -> Result<(AgentInput, Vec<String>)> {
    let mut input = AgentInput::default();
    let mut mask = Vec::new();

    if let Some(display_name) = &args.display_name {
        input.display_name.clone_from(display_name);
        mask.push("displayName".to_string());
    }
    if let Some(description) = &args.description {
        input.description.clone_from(description);
        mask.push("description".to_string());
    }
    if let Some(reasoning_engine) = &args.reasoning_engine {
        if reasoning_engine.trim().is_empty() {
            anyhow::bail!("--reasoning-engine cannot be empty when specified");
        }
        input.reasoning_engine.clone_from(reasoning_engine);
        mask.push("reasoningEngine".to_string());
    }
    if args.clear_icon || args.icon_uri.is_some() || args.icon_content.is_some() {
        input.icon = Some(if args.clear_icon {
            AgentIcon::default()
        } else {
            AgentIcon {
                uri: args.icon_uri.clone().unwrap_or_default(),
                content: args.icon_content.clone().unwrap_or_default(),
            }
        });
        mask.push("icon".to_string());
    }
    if args.dialogflow.is_set() {
        let Some(link) = dialogflow_resource(&args.dialogflow)? else {
            anyhow::bail!(
                "dialogflow agent information is required when updating the Dialogflow linkage"
            );
        };
        input.dialogflow_agent_definition = Some(DialogflowAgentDefinition {
            dialogflow_agent: link,
        });
        mask.push("dialogflowAgentDefinition.dialogflowAgent".to_string());
    }

    if mask.is_empty() {
        anyhow::bail!("no fields specified for update");
    }
    Ok((input, mask))
}

/// Apply an update to the agent `agent` of `engine_name`.
pub fn update_agent(
    backend: &dyn Backend,
    engine_name: &str,
    args: &AgentUpdateArgs,
) -> Result<Agent> {
    let (input, mask) = update_input(args)?;
    let name = agent_name(engine_name, &args.agent);
    log::info!("updating agent {name} ({})", mask.join(","));
    backend
        .update_agent(&name, &input, &mask)
        .with_context(|| format!("Failed to update agent {name}"))
}

fn list(ctx: &AppContext, engine: &str) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.engine_name(engine);
    let pb = progress::spinner("Fetching agents...", ctx.quiet);
    let agents = backend.list_agents(&name);
    progress::finish_clear(&pb);
    let agents = agents.with_context(|| format!("Failed to list agents of {name}"))?;
    output::emit(ctx.format(), &agents, || output::render_agents(&agents))
}

fn describe(ctx: &AppContext, engine: &str, agent: &str) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = agent_name(&project.engine_name(engine), agent);
    let agent = backend
        .get_agent(&name)
        .with_context(|| format!("Failed to get agent {name}"))?;
    output::emit(ctx.format(), &agent, || output::render_agent(&agent))
}

fn create(ctx: &AppContext, args: &AgentCreateArgs) -> Result<()> {
    let input = create_input(args)?;
    let (project, backend) = ctx.connect()?;
    let engine_name = project.engine_name(&args.engine);
    let agent = backend
        .create_agent(&engine_name, &input)
        .with_context(|| format!("Failed to create agent in {engine_name}"))?;
    output::emit(ctx.format(), &agent, || output::render_agent(&agent))
}

fn update(ctx: &AppContext, args: &AgentUpdateArgs) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let engine_name = project.engine_name(&args.engine);
    let agent = update_agent(&backend, &engine_name, args)?;
    output::emit(ctx.format(), &agent, || output::render_agent(&agent))
}

fn delete(ctx: &AppContext, engine: &str, agent: &str, force: bool) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = agent_name(&project.engine_name(engine), agent);
    let existing = backend
        .get_agent(&name)
        .with_context(|| format!("Failed to get agent {name}"))?;

    if !force {
        ui::kv("Agent", &existing.display_name);
        ui::kv("Name", &existing.name);
        ui::kv("Reasoning Engine", &existing.reasoning_engine);
    }
    if !commands::confirmed(force, "Delete this agent?")? {
        return Ok(());
    }

    backend
        .delete_agent(&name)
        .with_context(|| format!("Failed to delete agent {name}"))?;
    ui::success(&format!("Deleted agent {name}"));
    Ok(())
}
