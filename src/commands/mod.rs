//! Command handlers.
//!
//! Each `run` resolves settings and a backend, then hands off to functions
//! taking `&dyn Backend` so they can be exercised against `MockBackend`.

pub mod agents;
pub mod datastores;
pub mod engines;
pub mod features;
pub mod snapshot;
pub mod workforce;

use anyhow::Result;

use crate::ui;

/// Confirm a destructive action unless `force` is set.
pub(crate) fn confirmed(force: bool, prompt: &str) -> Result<bool> {
    if force {
        return Ok(true);
    }
    if ui::confirm(prompt)? {
        Ok(true)
    } else {
        ui::info("Cancelled.");
        Ok(false)
    }
}
