mod cli;
mod commands;
mod config;
mod output;
mod progress;
mod runner;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use cli::{Cli, Command, OutputFormat};
use config::{FileConfig, Settings};
use enginekit::ProjectContext;
use enginekit::backend::rest::RestBackend;
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub settings: Settings,
}

impl Context {
    pub fn format(&self) -> OutputFormat {
        self.settings.format
    }

    pub fn project(&self) -> Result<ProjectContext> {
        self.settings.project_context()
    }

    /// Authenticated REST backend for the resolved project and endpoint.
    pub fn connect(&self) -> Result<(ProjectContext, RestBackend)> {
        let project = self.project()?;
        let token = runner::access_token(self.settings.use_service_account)?;
        log::debug!(
            "using endpoint {} for project {}",
            self.settings.api_endpoint,
            project.project_id
        );
        let backend = RestBackend::new(&self.settings.api_endpoint, token, &project.project_id)
            .with_user_agent(format!("gemctl/{}", env!("CARGO_PKG_VERSION")));
        Ok((project, backend))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.global.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.global.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "gemctl", &mut io::stdout());
        return Ok(());
    }

    let file = FileConfig::load().context("Failed to load settings")?;
    let ctx = Context {
        quiet: cli.global.quiet,
        settings: Settings::resolve(&cli.global, &file),
    };

    let result = match cli.command {
        Command::Engines(cmd) => commands::engines::run(&ctx, cmd),
        Command::DataStores(cmd) => commands::datastores::run(&ctx, cmd),
        Command::Completions { .. } => Ok(()),
    };

    if let Err(err) = &result
        && !ctx.quiet
        && let Some(hint) = error_hint(err)
    {
        eprintln!("{} {}", "hint:".yellow().bold(), hint);
    }
    result
}

/// Advice for a failure caused by a platform error, if any.
fn error_hint(err: &anyhow::Error) -> Option<String> {
    let category = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<enginekit::Error>())
        .map(enginekit::Error::category)?;
    if category.is_retryable() {
        Some(format!("{} (safe to retry)", category.advice()))
    } else {
        Some(category.advice().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_hint_follows_category() {
        let transport = anyhow::Error::new(enginekit::Error::transport(
            "patch engine",
            "projects/p/locations/global/collections/c/engines/e",
            Some(503),
            "unavailable",
        ))
        .context("Failed to restore onto e");
        let hint = error_hint(&transport).unwrap();
        assert!(hint.ends_with("(safe to retry)"));

        let missing = anyhow::Error::new(enginekit::Error::PreconditionFailed(
            "engine missing".to_string(),
        ));
        let hint = error_hint(&missing).unwrap();
        assert!(hint.contains("--allow-create"));
        assert!(!hint.contains("retry"));

        assert!(error_hint(&anyhow::anyhow!("plain failure")).is_none());
    }
}
