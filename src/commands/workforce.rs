//! Workforce identity (ACL config) commands.

use anyhow::{Context, Result};
use enginekit::backend::Backend;
use enginekit::types::build_workforce_resource;
use enginekit::{ProjectContext, WorkforceIdentityConfig};

use crate::Context as AppContext;
use crate::cli::WorkforceCommand;
use crate::output;

pub fn run(ctx: &AppContext, cmd: WorkforceCommand) -> Result<()> {
    match cmd {
        WorkforceCommand::Show => show(ctx),
        WorkforceCommand::Set {
            resource,
            workforce_id,
            provider_id,
            workforce_location,
            clear,
        } => {
            let pool = pool_resource(
                resource.as_deref(),
                workforce_id.as_deref(),
                provider_id.as_deref(),
                &workforce_location,
                clear,
            )?;
            set(ctx, &pool)
        }
    }
}

/// Pool resource to configure; empty when clearing.
pub fn pool_resource(
    resource: Option<&str>,
    workforce_id: Option<&str>,
    provider_id: Option<&str>,
    location: &str,
    clear: bool,
) -> Result<String> {
    if clear {
        return Ok(String::new());
    }
    let resource = resource.unwrap_or_default();
    let workforce_id = workforce_id.unwrap_or_default();
    if resource.trim().is_empty() && workforce_id.trim().is_empty() {
        anyhow::bail!("provide --resource, --workforce-id or use --clear");
    }
    let pool =
        build_workforce_resource(resource, location, workforce_id, provider_id.unwrap_or_default())?;
    Ok(pool)
}

/// Write the workforce pool of a project/location.
pub fn set_pool(
    backend: &dyn Backend,
    project: &ProjectContext,
    pool: &str,
) -> Result<WorkforceIdentityConfig> {
    let name = project.acl_config_name();
    if pool.is_empty() {
        log::info!("disabling workforce identity on {name}");
    } else {
        log::info!("setting workforce pool {pool} on {name}");
    }
    backend
        .set_workforce_config(&name, pool)
        .with_context(|| format!("Failed to update workforce identity config {name}"))
}

fn show(ctx: &AppContext) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.acl_config_name();
    let config = backend
        .get_workforce_config(&name)
        .with_context(|| format!("Failed to get workforce identity config {name}"))?;
    output::emit(ctx.format(), &config, || output::render_workforce(&config))
}

fn set(ctx: &AppContext, pool: &str) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let config = set_pool(&backend, &project, pool)?;
    output::emit(ctx.format(), &config, || output::render_workforce(&config))
}
