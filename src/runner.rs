use anyhow::{Context, Result};
use std::process::Command;

/// Environment variable holding a ready-made access token.
pub const ACCESS_TOKEN_ENV: &str = "GEMCTL_ACCESS_TOKEN";

/// Run a command and capture output
pub fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Command failed: {}", stderr.trim())
    }
}

/// gcloud arguments that print an access token.
pub fn token_command(use_service_account: bool) -> &'static [&'static str] {
    if use_service_account {
        &["auth", "application-default", "print-access-token"]
    } else {
        &["auth", "print-access-token"]
    }
}

/// Obtain an OAuth access token from the environment or gcloud.
pub fn access_token(use_service_account: bool) -> Result<String> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV)
        && !token.trim().is_empty()
    {
        log::debug!("using access token from {ACCESS_TOKEN_ENV}");
        return Ok(token.trim().to_string());
    }

    let args = token_command(use_service_account);
    log::debug!("running gcloud {}", args.join(" "));
    let token = run_capture("gcloud", args).context(
        "Could not obtain an access token; run `gcloud auth login` or set GEMCTL_ACCESS_TOKEN",
    )?;
    if token.is_empty() {
        anyhow::bail!("gcloud returned an empty access token");
    }
    Ok(token)
}
