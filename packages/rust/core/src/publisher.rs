//! Publishing a rebuilt index.
//!
//! Change detection compares the rendered index with the copy at the base
//! branch's head. When they differ the new content is written as git
//! objects (blob → tree → commit), a branch is pointed at the commit and a
//! review request is opened. Nothing is retried. Objects created before a
//! failure stay unreferenced on the host.

use adrtools_forge::{GitReference, PullRequest, RepositoryHost, TreeEntry};
use adrtools_shared::{RebuildConfig, Result};
use tracing::{info, instrument};

/// Message of the commit carrying the new index.
pub const COMMIT_MESSAGE: &str = "Refreshed list of decisions";

/// Result of comparing rendered content with the base branch.
#[derive(Debug, Clone)]
pub struct ChangeDetection {
    /// Base branch head the comparison was made against.
    pub base_head: GitReference,
    /// Whether the index document exists at the base head.
    pub existed: bool,
    /// Whether the rendered content differs from the existing document.
    pub changed: bool,
}

/// Objects created by a successful publish.
#[derive(Debug, Clone)]
pub struct Publication {
    pub blob_sha: String,
    pub tree_sha: String,
    pub commit_sha: String,
    /// Branch now pointing at `commit_sha`.
    pub branch: String,
    /// Review request, unless disabled in the config.
    pub pull_request: Option<PullRequest>,
}

/// Title of the review request opened for `index_path`.
///
/// With the default index path this is "Refreshed list of decisions in README.md".
pub fn pull_request_title(index_path: &str) -> String {
    format!("{COMMIT_MESSAGE} in {index_path}")
}

/// Resolve the base head and compare `new_content` with the index stored there.
///
/// A missing index document counts as changed.
#[instrument(skip(host, config, new_content), fields(base = %config.base_branch))]
pub async fn detect_change(
    host: &dyn RepositoryHost,
    config: &RebuildConfig,
    new_content: &str,
) -> Result<ChangeDetection> {
    let base_head = host.get_reference(&config.base_branch).await?;
    let existing = host
        .get_file_content(&config.index_path, &base_head.sha)
        .await?;

    let changed = existing.as_deref() != Some(new_content);
    info!(
        sha = %base_head.sha,
        existed = existing.is_some(),
        changed,
        "compared index with base branch"
    );

    Ok(ChangeDetection {
        base_head,
        existed: existing.is_some(),
        changed,
    })
}

/// Commit `content` on top of `base_head` and open a review request.
#[instrument(skip(host, config, content), fields(branch = %config.target_branch))]
pub async fn publish(
    host: &dyn RepositoryHost,
    config: &RebuildConfig,
    content: &str,
    base_head: &GitReference,
) -> Result<Publication> {
    let base_tree = host.get_commit_tree(&base_head.sha).await?;

    let blob_sha = host.create_blob(content).await?;
    let tree_sha = host
        .create_tree(&base_tree, &[TreeEntry::file(&config.index_path, &blob_sha)])
        .await?;
    let commit_sha = host
        .create_commit(&base_head.sha, &tree_sha, COMMIT_MESSAGE)
        .await?;
    info!(%blob_sha, %tree_sha, %commit_sha, "created index commit");

    if config.create_branch {
        host.create_ref(&config.target_branch, &commit_sha).await?;
    } else {
        host.update_ref(&config.target_branch, &commit_sha).await?;
    }

    let pull_request = if config.create_pull_request {
        let title = pull_request_title(&config.index_path);
        let pr = host
            .create_pull_request(&title, &config.base_branch, &config.target_branch)
            .await?;
        info!(number = pr.number, url = %pr.html_url, "opened review request");
        Some(pr)
    } else {
        None
    };

    Ok(Publication {
        blob_sha,
        tree_sha,
        commit_sha,
        branch: config.target_branch.clone(),
        pull_request,
    })
}
