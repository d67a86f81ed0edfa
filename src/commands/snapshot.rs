//! Snapshot commands: capture, diff and restore.

use anyhow::{Context, Result};
use enginekit::EngineSnapshot;
use enginekit::backend::Backend;
use enginekit::snapshot::capture::{capture, diff_with_live};
use enginekit::snapshot::diff::{SnapshotDiff, diff_snapshots};
use enginekit::snapshot::restore::{RestoreOptions, RestoreReport, restore};
use std::path::PathBuf;

use crate::Context as AppContext;
use crate::cli::{OutputFormat, RestoreArgs, SnapshotCommand};
use crate::output;
use crate::progress;
use crate::ui;

pub fn run(ctx: &AppContext, cmd: SnapshotCommand) -> Result<()> {
    match cmd {
        SnapshotCommand::Create {
            engine,
            output,
            notes,
            description,
        } => create(
            ctx,
            &engine,
            output.as_deref(),
            notes.as_deref(),
            description.as_deref(),
        ),
        SnapshotCommand::Diff {
            snapshot_a,
            snapshot_b,
            engine,
        } => diff(ctx, &snapshot_a, snapshot_b.as_deref(), engine.as_deref()),
        SnapshotCommand::Restore(args) => restore_cmd(ctx, &args),
    }
}

/// Expand `~` and environment variables in a user-supplied path.
fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

pub fn load_snapshot(path: &str) -> Result<EngineSnapshot> {
    EngineSnapshot::load(&expand_path(path))
        .with_context(|| format!("Failed to read snapshot file {path}"))
}

/// Capture an engine and fill in the optional metadata.
pub fn create_snapshot(
    backend: &dyn Backend,
    engine_name: &str,
    notes: Option<&str>,
    description: Option<&str>,
) -> Result<EngineSnapshot> {
    let mut snapshot =
        capture(backend, engine_name).with_context(|| format!("Failed to snapshot {engine_name}"))?;
    if let Some(notes) = notes.filter(|n| !n.is_empty()) {
        snapshot.metadata.notes = notes.to_string();
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        snapshot.metadata.description = description.to_string();
    }
    Ok(snapshot)
}

fn create(
    ctx: &AppContext,
    engine: &str,
    output_path: Option<&str>,
    notes: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let (project, backend) = ctx.connect()?;
    let name = project.engine_name(engine);
    let pb = progress::spinner(&format!("Capturing {engine}..."), ctx.quiet || output_path.is_none());
    let snapshot = match create_snapshot(&backend, &name, notes, description) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            progress::finish_clear(&pb);
            return Err(e);
        }
    };

    match output_path {
        Some(path) => {
            snapshot
                .save(&expand_path(path))
                .with_context(|| format!("Failed to write snapshot file {path}"))?;
            progress::finish_success(
                &pb,
                &format!(
                    "Snapshot of {} ({} agents) written to {path}",
                    snapshot.metadata.original_engine_id,
                    snapshot.agents.len()
                ),
            );
        }
        None => {
            progress::finish_clear(&pb);
            println!("{}", snapshot.to_json_pretty()?);
        }
    }
    Ok(())
}

/// Diff of two snapshot documents: `current` is the actual side, `desired` the new one.
pub fn diff_files(current: &EngineSnapshot, desired: &EngineSnapshot) -> SnapshotDiff {
    diff_snapshots(desired, current)
}

fn diff(
    ctx: &AppContext,
    snapshot_a: &str,
    snapshot_b: Option<&str>,
    engine: Option<&str>,
) -> Result<()> {
    let first = load_snapshot(snapshot_a)?;
    let diff = match (snapshot_b, engine) {
        (Some(path), _) => {
            let second = load_snapshot(path)?;
            diff_files(&first, &second)
        }
        (None, Some(engine)) => {
            let (project, backend) = ctx.connect()?;
            let name = project.engine_name(engine);
            let pb = progress::spinner(&format!("Reading {engine}..."), ctx.quiet);
            let diff = diff_with_live(&backend, &first, &name);
            progress::finish_clear(&pb);
            diff.with_context(|| format!("Failed to diff snapshot against {name}"))?
        }
        (None, None) => {
            anyhow::bail!("a second snapshot or --engine is required to diff against")
        }
    };
    output::emit(ctx.format(), &diff, || output::render_diff(&diff))
}

// ============================================================================
// Restore
// ============================================================================

/// Where and how a restore lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTarget {
    pub engine_id: String,
    pub allow_create: bool,
    pub update_existing: bool,
}

/// Resolve the target engine.
///
/// `--new-engine-id` wins and implies creation without updating; then
/// `--engine-id`, the positional engine, and the engine the snapshot came from.
pub fn resolve_target(args: &RestoreArgs, snapshot: &EngineSnapshot) -> Result<RestoreTarget> {
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    if let Some(id) = non_empty(&args.new_engine_id) {
        return Ok(RestoreTarget {
            engine_id: id,
            allow_create: true,
            update_existing: false,
        });
    }

    let engine_id = non_empty(&args.engine_id)
        .or_else(|| non_empty(&args.engine))
        .or_else(|| {
            let original = &snapshot.metadata.original_engine_id;
            (!original.is_empty()).then(|| original.clone())
        })
        .context("target engine ID is required (the snapshot does not name its source engine)")?;

    Ok(RestoreTarget {
        engine_id,
        allow_create: args.allow_create,
        update_existing: args.update_existing,
    })
}

/// How a restore invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreStep {
    DryRun,
    NoChanges,
    Cancelled,
    Applied(RestoreReport),
}

/// Preview, confirm and apply a restore.
///
/// The preview is always computed and handed to `show_preview` first. Writes
/// happen only when not a dry run, the preview has resource changes, and
/// `confirm` agrees.
pub fn run_restore<P, C>(
    backend: &dyn Backend,
    snapshot: &EngineSnapshot,
    options: &RestoreOptions,
    show_preview: P,
    confirm: C,
) -> Result<RestoreStep>
where
    P: FnOnce(&SnapshotDiff) -> Result<()>,
    C: FnOnce() -> Result<bool>,
{
    let preview_options = RestoreOptions {
        dry_run: true,
        ..options.clone()
    };
    let preview = restore(backend, snapshot, &preview_options)
        .context("Failed to compute restore preview")?
        .preview;
    show_preview(&preview)?;

    if options.dry_run {
        return Ok(RestoreStep::DryRun);
    }
    if preview.is_empty() {
        return Ok(RestoreStep::NoChanges);
    }
    if !confirm()? {
        return Ok(RestoreStep::Cancelled);
    }

    let applied = restore(backend, snapshot, options)
        .with_context(|| format!("Failed to restore onto {}", options.target_engine_name))?;
    applied
        .report
        .map(RestoreStep::Applied)
        .context("restore finished without a report")
}

fn restore_cmd(ctx: &AppContext, args: &RestoreArgs) -> Result<()> {
    let mut snapshot = load_snapshot(&args.snapshot)?;
    if let Some(notes) = args.notes.as_ref().filter(|n| !n.is_empty()) {
        snapshot.metadata.notes.clone_from(notes);
    }

    let target = resolve_target(args, &snapshot)?;
    let (project, backend) = ctx.connect()?;
    let options = RestoreOptions {
        target_engine_name: project.engine_name(&target.engine_id),
        create_if_missing: target.allow_create,
        update_existing: target.update_existing,
        dry_run: args.dry_run,
    };
    let format = ctx.format();

    let step = run_restore(
        &backend,
        &snapshot,
        &options,
        |preview| {
            if format == OutputFormat::Table {
                ui::header("Restore Preview");
            }
            output::emit(format, preview, || output::render_diff(preview))
        },
        || {
            if args.force {
                Ok(true)
            } else {
                ui::confirm("Apply these changes?")
            }
        },
    );

    match step? {
        RestoreStep::DryRun => ui::info("Dry run complete. No changes applied."),
        RestoreStep::NoChanges => ui::info("No changes detected; restore skipped."),
        RestoreStep::Cancelled => ui::info("Restore cancelled."),
        RestoreStep::Applied(report) => {
            output::emit(format, &report, || output::render_restore_report(&report))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use enginekit::backend::{MockBackend, MockCall};
    use enginekit::snapshot::capture::snapshot_of;
    use enginekit::{Agent, Engine};
    use std::cell::Cell;
    use tempfile::TempDir;

    const ENGINE: &str = "projects/p/locations/global/collections/default_collection/engines/support";

    fn seeded() -> MockBackend {
        let mock = MockBackend::new();
        mock.insert_engine(Engine {
            name: ENGINE.to_string(),
            display_name: "Support".to_string(),
            solution_type: "SOLUTION_TYPE_SEARCH".to_string(),
            ..Default::default()
        });
        mock.insert_agent(
            ENGINE,
            Agent {
                display_name: "Helper".to_string(),
                reasoning_engine: ENGINE.to_string(),
                ..Default::default()
            },
        );
        mock
    }

    fn restore_args() -> RestoreArgs {
        RestoreArgs {
            snapshot: "snap.json".to_string(),
            engine: None,
            engine_id: None,
            new_engine_id: None,
            allow_create: false,
            update_existing: true,
            dry_run: false,
            force: false,
            notes: None,
        }
    }

    #[test]
    fn test_create_snapshot_sets_metadata() {
        let mock = seeded();
        let snapshot = create_snapshot(&mock, ENGINE, Some("pre-deploy"), None).unwrap();
        assert_eq!(snapshot.metadata.original_engine_id, "support");
        assert_eq!(snapshot.metadata.notes, "pre-deploy");
        assert!(snapshot.metadata.description.is_empty());
        assert_eq!(snapshot.agents.len(), 1);
    }

    #[test]
    fn test_snapshot_file_diff() {
        let mock = seeded();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("snap.json");

        let before = create_snapshot(&mock, ENGINE, None, None).unwrap();
        before.save(&path).unwrap();
        let loaded = load_snapshot(path.to_str().unwrap()).unwrap();
        assert!(diff_files(&loaded, &before).is_empty());

        let mut after = loaded.clone();
        after.engine.display_name = "Support v2".to_string();
        let diff = diff_files(&loaded, &after);
        assert_eq!(diff.engine_changes.len(), 1);
        assert_eq!(diff.engine_changes[0].old, "Support");
        assert_eq!(diff.engine_changes[0].new, "Support v2");
    }

    #[test]
    fn test_expand_path() {
        assert_eq!(expand_path("/tmp/snap.json"), PathBuf::from("/tmp/snap.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/snap.json"), home.join("snap.json"));
        }
    }

    #[test]
    fn test_load_snapshot_reports_path() {
        let err = load_snapshot("/definitely/missing/snap.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/missing/snap.json"));
    }

    #[test]
    fn test_resolve_target_precedence() {
        let mut snapshot = EngineSnapshot::default();
        snapshot.metadata.original_engine_id = "original".to_string();

        let target = resolve_target(&restore_args(), &snapshot).unwrap();
        assert_eq!(target.engine_id, "original");
        assert!(!target.allow_create);
        assert!(target.update_existing);

        let mut args = restore_args();
        args.engine = Some("positional".to_string());
        assert_eq!(resolve_target(&args, &snapshot).unwrap().engine_id, "positional");

        args.engine_id = Some("flag".to_string());
        assert_eq!(resolve_target(&args, &snapshot).unwrap().engine_id, "flag");

        args.new_engine_id = Some("clone".to_string());
        let target = resolve_target(&args, &snapshot).unwrap();
        assert_eq!(target.engine_id, "clone");
        assert!(target.allow_create);
        assert!(!target.update_existing);

        assert!(resolve_target(&restore_args(), &EngineSnapshot::default()).is_err());
    }

    #[test]
    fn test_run_restore_dry_run_writes_nothing() {
        let mock = seeded();
        let mut snapshot = snapshot_of(&mock.engine(ENGINE).unwrap(), &mock.agents(ENGINE));
        snapshot.engine.display_name = "Renamed".to_string();

        let mut options = RestoreOptions::new(ENGINE);
        options.dry_run = true;
        let shown = Cell::new(false);
        let step = run_restore(
            &mock,
            &snapshot,
            &options,
            |preview| {
                shown.set(!preview.engine_changes.is_empty());
                Ok(())
            },
            || panic!("dry run must not ask for confirmation"),
        )
        .unwrap();

        assert_eq!(step, RestoreStep::DryRun);
        assert!(shown.get());
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_run_restore_converged_skips_confirmation() {
        let mock = seeded();
        let snapshot = snapshot_of(&mock.engine(ENGINE).unwrap(), &mock.agents(ENGINE));
        let step = run_restore(
            &mock,
            &snapshot,
            &RestoreOptions::new(ENGINE),
            |_| Ok(()),
            || panic!("nothing to confirm"),
        )
        .unwrap();
        assert_eq!(step, RestoreStep::NoChanges);
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_run_restore_cancelled_then_applied() {
        let mock = seeded();
        let mut snapshot = snapshot_of(&mock.engine(ENGINE).unwrap(), &mock.agents(ENGINE));
        snapshot.engine.display_name = "Renamed".to_string();
        let options = RestoreOptions::new(ENGINE);

        let step = run_restore(&mock, &snapshot, &options, |_| Ok(()), || Ok(false)).unwrap();
        assert_eq!(step, RestoreStep::Cancelled);
        assert!(mock.writes().is_empty());

        let step = run_restore(&mock, &snapshot, &options, |_| Ok(()), || Ok(true)).unwrap();
        let RestoreStep::Applied(report) = step else {
            panic!("expected an applied restore");
        };
        assert!(report.engine_patched);
        assert!(!report.created);
        assert_eq!(
            mock.writes(),
            vec![
                MockCall::PatchEngine {
                    name: ENGINE.to_string(),
                    mask: vec!["displayName".to_string()],
                },
                MockCall::UpdateFeatures {
                    name: ENGINE.to_string(),
                },
            ]
        );
        assert_eq!(mock.engine(ENGINE).unwrap().display_name, "Renamed");
    }

    #[test]
    fn test_run_restore_notes_only_still_confirms() {
        let mock = seeded();
        let mut snapshot = snapshot_of(&mock.engine(ENGINE).unwrap(), &mock.agents(ENGINE));
        snapshot.metadata.notes = "release 42".to_string();

        let asked = Cell::new(false);
        let step = run_restore(
            &mock,
            &snapshot,
            &RestoreOptions::new(ENGINE),
            |preview| {
                assert_eq!(preview.metadata_changes.len(), 1);
                Ok(())
            },
            || {
                asked.set(true);
                Ok(false)
            },
        )
        .unwrap();
        assert!(asked.get());
        assert_eq!(step, RestoreStep::Cancelled);
        assert!(mock.writes().is_empty());
    }
}
