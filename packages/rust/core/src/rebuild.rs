//! End-to-end `rebuild-index` pipeline:
//! branches → decisions → rendered index → change detection → publish.

use std::time::Instant;

use adrtools_forge::RepositoryHost;
use adrtools_shared::{RebuildConfig, Result};
use tracing::{info, instrument};

use crate::collector::collect_decisions;
use crate::discovery::discover_branches;
use crate::index::{IndexTemplate, render_index};
use crate::publisher::{Publication, detect_change, publish};

/// How a rebuild ended when no error occurred.
#[derive(Debug, Clone)]
pub enum RebuildOutcome {
    /// Rendered index matches the base branch; nothing was published.
    Unchanged,
    /// Dry run: rendered content, and whether publishing would change anything.
    DryRun { content: String, changed: bool },
    /// Index committed (and a review request opened unless disabled).
    Published(Publication),
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes without error.
    fn done(&self, outcome: &RebuildOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _outcome: &RebuildOutcome) {}
}

/// Run the full rebuild.
///
/// 1. Discover branches (base + labeled review requests)
/// 2. Collect decisions, base branch first
/// 3. Render the index
/// 4. Compare with the index at the base head
/// 5. Publish, unless unchanged or a dry run
///
/// Errors from any step are returned unchanged; remote state is never rolled back.
#[instrument(skip_all, fields(repo = %config.repo, base = %config.base_branch))]
pub async fn rebuild_index(
    host: &dyn RepositoryHost,
    config: &RebuildConfig,
    template: &IndexTemplate,
    progress: &dyn ProgressReporter,
) -> Result<RebuildOutcome> {
    let start = Instant::now();
    info!("starting index rebuild");

    progress.phase("Discovering branches");
    let branches = discover_branches(host, &config.base_branch, &config.toc_label).await?;

    progress.phase("Collecting decisions");
    let decisions = collect_decisions(host, &config.decisions_dir, &branches).await?;

    progress.phase("Rendering index");
    let content = render_index(template, &decisions, &config.name, &config.description);

    progress.phase("Detecting changes");
    let detection = detect_change(host, config, &content).await?;

    let outcome = if config.dry_run {
        RebuildOutcome::DryRun {
            content,
            changed: detection.changed,
        }
    } else if !detection.changed {
        RebuildOutcome::Unchanged
    } else {
        progress.phase("Publishing");
        let publication = publish(host, config, &content, &detection.base_head).await?;
        RebuildOutcome::Published(publication)
    };

    progress.done(&outcome);

    info!(
        branches = branches.len(),
        decisions = decisions.len(),
        outcome = outcome_label(&outcome),
        elapsed_ms = start.elapsed().as_millis(),
        "index rebuild complete"
    );

    Ok(outcome)
}

fn outcome_label(outcome: &RebuildOutcome) -> &'static str {
    match outcome {
        RebuildOutcome::Unchanged => "unchanged",
        RebuildOutcome::DryRun { .. } => "dry-run",
        RebuildOutcome::Published(_) => "published",
    }
}
