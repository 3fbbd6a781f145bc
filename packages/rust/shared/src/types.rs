//! Core domain types shared by the host client and the rebuild pipeline.

use chrono::{DateTime, Utc};

use crate::error::{AdrToolsError, Result};

// ---------------------------------------------------------------------------
// RepoSlug
// ---------------------------------------------------------------------------

/// An `owner/repo` pair identifying a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl std::str::FromStr for RepoSlug {
    type Err = AdrToolsError;

    /// Parse `owner/repo`. Anything other than exactly two non-empty segments is rejected.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        match parts.as_slice() {
            [owner, repo] if !owner.is_empty() && !repo.is_empty() => {
                Ok(Self::new(*owner, *repo))
            }
            _ => Err(AdrToolsError::config(format!("invalid repository: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// BranchNaming
// ---------------------------------------------------------------------------

/// Strategy producing the target branch name for a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchNaming {
    /// `<prefix>/<unix seconds>`, unique per run. The branch is created.
    Timestamped { prefix: String },
    /// A fixed, already existing branch that is reused.
    Explicit(String),
}

impl BranchNaming {
    pub fn timestamped(prefix: impl Into<String>) -> Self {
        Self::Timestamped {
            prefix: prefix.into(),
        }
    }

    /// Explicit override if given, otherwise timestamped under `prefix`.
    pub fn from_override(explicit: Option<String>, prefix: &str) -> Self {
        match explicit.filter(|b| !b.is_empty()) {
            Some(branch) => Self::Explicit(branch),
            None => Self::timestamped(prefix),
        }
    }

    /// Produce the branch name for a run starting at `now`.
    pub fn resolve(&self, now: DateTime<Utc>) -> String {
        match self {
            Self::Timestamped { prefix } => {
                format!("{}/{}", prefix.trim_end_matches('/'), now.timestamp())
            }
            Self::Explicit(name) => name.clone(),
        }
    }

    /// Whether the resolved branch must be created (as opposed to reused).
    pub fn creates_branch(&self) -> bool {
        matches!(self, Self::Timestamped { .. })
    }
}
