//! Decision collection across branches.
//!
//! Each branch's decisions directory is listed and every file in it is
//! fetched at that same branch. Branches are merged into one
//! [`DecisionCollection`] in scan order, so the base branch's copy of a
//! filename wins over any review-request branch's copy.

use adrtools_forge::{EntryKind, RepositoryHost};
use adrtools_shared::{AdrToolsError, Result};
use tracing::{debug, info, instrument};

use crate::decision::{Decision, DecisionCollection};

/// Fetch and merge the decisions of every branch in `branches`, in order.
#[instrument(skip(host, branches), fields(branches = branches.len()))]
pub async fn collect_decisions(
    host: &dyn RepositoryHost,
    decisions_dir: &str,
    branches: &[String],
) -> Result<DecisionCollection> {
    let mut collection = DecisionCollection::new();

    for branch in branches {
        let decisions = fetch_branch_decisions(host, decisions_dir, branch).await?;
        let found = decisions.len();
        let added = collection.merge(decisions);
        debug!(%branch, found, added, "merged branch decisions");
    }

    info!(decisions = collection.len(), "decisions collected");
    Ok(collection)
}

/// List `decisions_dir` at `branch` and fetch each file at the same branch.
///
/// Entries that are not regular files are skipped. A listed file that
/// cannot be read is an error rather than an empty document.
pub async fn fetch_branch_decisions(
    host: &dyn RepositoryHost,
    decisions_dir: &str,
    branch: &str,
) -> Result<Vec<Decision>> {
    let entries = host.list_directory(decisions_dir, branch).await?;
    let mut decisions = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.kind != EntryKind::File {
            debug!(path = %entry.path, kind = ?entry.kind, "skipping non-file entry");
            continue;
        }

        let content = host
            .get_file_content(&entry.path, branch)
            .await?
            .ok_or_else(|| {
                AdrToolsError::host(
                    "get file content",
                    404,
                    format!("{} listed on {branch} but not readable", entry.path),
                )
            })?;

        decisions.push(Decision::new(entry.path, content, entry.html_url));
    }

    Ok(decisions)
}
