//! # enginekit
//!
//! Client library for Gemini Enterprise engines on the Discovery Engine API.
//!
//! This crate provides:
//! - Typed engine, agent, data store and workforce identity resources
//! - A [`Backend`](backend::Backend) trait with REST and in-memory implementations
//! - Resource name helpers
//! - Engine snapshots: capture, diff and restore
//!
//! ## Example
//!
//! ```no_run
//! use enginekit::backend::rest::{RestBackend, endpoint_for_location};
//! use enginekit::snapshot::{capture, restore};
//! use enginekit::ProjectContext;
//!
//! let ctx = ProjectContext::new("my-project", "global", "default_collection");
//! let backend = RestBackend::new(endpoint_for_location(&ctx.location), "ya29.token", &ctx.project_id);
//!
//! let snapshot = capture::capture(&backend, &ctx.engine_name("support")).unwrap();
//!
//! let mut options = restore::RestoreOptions::new(ctx.engine_name("support-copy"));
//! options.create_if_missing = true;
//! options.dry_run = true;
//! let outcome = restore::restore(&backend, &snapshot, &options).unwrap();
//! println!("{} changes", outcome.preview.len());
//! ```
//!
//! ## Snapshot documents
//!
//! Snapshots serialize to JSON with `metadata`, `engine` and `agents` keys.
//! Unknown API fields on engines and agents are preserved, so a document
//! captured by a newer API version survives a load/save cycle unchanged.

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod names;
pub mod snapshot;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use names::ProjectContext;
pub use snapshot::EngineSnapshot;
pub use snapshot::diff::SnapshotDiff;
pub use types::{
    Agent, AgentInput, DataStore, Document, Engine, GcsImport, WorkforceIdentityConfig,
};
