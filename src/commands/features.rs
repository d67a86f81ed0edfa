//! Engine feature flag commands.

use anyhow::{Context, Result};
use enginekit::Engine;
use enginekit::backend::Backend;
use enginekit::types::{
    FEATURE_STATE_OFF, FEATURE_STATE_ON, is_known_feature, normalize_feature_key,
};
use std::collections::BTreeMap;

use crate::Context as AppContext;
use crate::cli::FeaturesCommand;
use crate::output;
use crate::progress;

pub fn run(ctx: &AppContext, cmd: FeaturesCommand) -> Result<()> {
    match cmd {
        FeaturesCommand::List { engine } => list(ctx, &engine),
        FeaturesCommand::Enable { args } => toggle(ctx, &args, FEATURE_STATE_ON),
        FeaturesCommand::Disable { args } => toggle(ctx, &args, FEATURE_STATE_OFF),
    }
}

/// Split `ENGINE FEATURE...` or `FEATURE... ENGINE` into the engine and features.
///
/// The engine is taken from the end only when the first argument is a known
/// feature and the last one is not.
pub fn parse_feature_args(args: &[String]) -> Result<(String, Vec<String>)> {
    let (Some(first), Some(last)) = (args.first(), args.last()) else {
        anyhow::bail!("engine ID and at least one feature are required");
    };
    if args.len() < 2 {
        anyhow::bail!("engine ID and at least one feature are required");
    }

    let (engine, features) = if is_known_feature(first) && !is_known_feature(last) {
        (last.clone(), &args[..args.len() - 1])
    } else {
        (first.clone(), &args[1..])
    };

    let features: Vec<String> = features
        .iter()
        .map(|f| normalize_feature_key(f))
        .filter(|f| !f.is_empty())
        .collect();
    if features.is_empty() {
        anyhow::bail!("no features specified for update");
    }
    for feature in &features {
        if !is_known_feature(feature) {
            log::warn!("'{feature}' is not a known feature flag; sending it anyway");
        }
    }
    Ok((engine, features))
}

/// Current feature map with `features` set to `state`.
pub fn merge_features(
    current: &BTreeMap<String, String>,
    features: &[String],
    state: &str,
) -> BTreeMap<String, String> {
    let mut merged = current.clone();
    for feature in features {
        merged.insert(feature.clone(), state.to_string());
    }
    merged
}

/// Set `features` to `state` on an engine, keeping the other flags.
pub fn set_features(
    backend: &dyn Backend,
    engine_name: &str,
    features: &[String],
    state: &str,
) -> Result<Engine> {
    let engine = backend
        .get_engine(engine_name)
        .with_context(|| format!("Failed to get engine {engine_name}"))?;
    let merged = merge_features(&engine.features, features, state);
    log::info!("setting {} feature(s) to {state} on {engine_name}", features.len());
    backend
        .update_features(engine_name, &merged)
        .with_context(|| format!("Failed to update features of {engine_name}"))
}

fn list(ctx: &AppContext, engine: &str) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.engine_name(engine);
    let pb = progress::spinner("Fetching engine...", ctx.quiet);
    let fetched = backend.get_engine(&name);
    progress::finish_clear(&pb);
    let engine = fetched.with_context(|| format!("Failed to get engine {name}"))?;
    output::emit(ctx.format(), &engine.features, || output::render_features(&engine))
}

fn toggle(ctx: &AppContext, args: &[String], state: &str) -> Result<()> {
    let (engine_id, features) = parse_feature_args(args)?;
    let (project, backend) = ctx.connect()?;
    let name = project.engine_name(&engine_id);
    let engine = set_features(&backend, &name, &features, state)?;
    output::emit(ctx.format(), &engine.features, || output::render_features(&engine))
}
