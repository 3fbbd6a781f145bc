//! Remote repository host contract and its GitHub implementation.
//!
//! The rebuild pipeline only talks to a hosted repository through
//! [`RepositoryHost`]: reading directory listings and file contents at a
//! branch, finding labeled review requests, and writing git objects
//! (blob → tree → commit → ref) before opening a review request.
//! A host instance is bound to a single repository.

mod github;

use adrtools_shared::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

pub use github::{GithubHost, HostOptions};

/// File mode for a regular, non-executable file in a git tree.
pub const REGULAR_FILE_MODE: &str = "100644";

// ---------------------------------------------------------------------------
// Host data types
// ---------------------------------------------------------------------------

/// A branch reference resolved to the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitReference {
    /// Fully qualified name, e.g. `refs/heads/main`.
    pub name: String,
    /// SHA of the commit the reference points at.
    pub sha: String,
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of a repository directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentEntry {
    /// Base name of the entry.
    pub name: String,
    /// Repository-relative path.
    pub path: String,
    /// Browser URL of the entry on the host. Empty when the host sends none
    /// (submodules carry `null`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub html_url: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A tree entry mapping a path to an existing blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub mode: String,
    pub sha: String,
}

impl TreeEntry {
    /// Entry for a regular file backed by `blob_sha`.
    pub fn file(path: impl Into<String>, blob_sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: REGULAR_FILE_MODE.to_string(),
            sha: blob_sha.into(),
        }
    }
}

/// An opened review request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Operations the rebuild needs from a remote git forge.
///
/// Branch arguments are short names (`main`, `feature/x`), never `refs/...`.
/// Every failure is returned to the caller; implementations do not retry.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Resolve a branch to its head commit.
    async fn get_reference(&self, branch: &str) -> Result<GitReference>;

    /// SHA of the tree recorded in `commit_sha`.
    async fn get_commit_tree(&self, commit_sha: &str) -> Result<String>;

    /// List the entries of directory `path` at `git_ref`.
    async fn list_directory(&self, path: &str, git_ref: &str) -> Result<Vec<ContentEntry>>;

    /// Raw content of the file at `path` on `git_ref`; `None` when it does not exist.
    async fn get_file_content(&self, path: &str, git_ref: &str) -> Result<Option<String>>;

    /// Numbers of open review requests in this repository carrying `label`.
    async fn search_open_labeled_requests(&self, label: &str) -> Result<Vec<u64>>;

    /// Source branch name of review request `number`.
    async fn get_request_source_branch(&self, number: u64) -> Result<String>;

    /// Store `content` as a blob, returning its SHA.
    async fn create_blob(&self, content: &str) -> Result<String>;

    /// Create a tree layering `entries` over `base_tree`, returning its SHA.
    async fn create_tree(&self, base_tree: &str, entries: &[TreeEntry]) -> Result<String>;

    /// Create a single-parent commit, returning its SHA.
    async fn create_commit(&self, parent: &str, tree: &str, message: &str) -> Result<String>;

    /// Create branch `branch` pointing at `sha`.
    async fn create_ref(&self, branch: &str, sha: &str) -> Result<()>;

    /// Fast-forward existing branch `branch` to `sha`. Fails when `sha` does not
    /// descend from the branch's current head.
    async fn update_ref(&self, branch: &str, sha: &str) -> Result<()>;

    /// Open a review request merging `head` into `base`.
    async fn create_pull_request(&self, title: &str, base: &str, head: &str)
    -> Result<PullRequest>;
}

/// Fully qualified ref name for a short branch name.
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}
