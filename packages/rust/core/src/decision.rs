//! Decision records and the collection they are merged into.
//!
//! A [`Decision`] wraps the raw markdown of one ADR file. Everything shown
//! in the index (title, identifier, status) is derived from the text or the
//! filename on demand; nothing is cached or mutated after construction.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Title used when a document has no `# <n>. <title>` heading at its start.
pub const UNTITLED: &str = "Untitled document";

/// Status used when a document has no `## Status` section.
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Identifier used when the filename carries no numeric prefix.
pub const FALLBACK_SHORT_ID: &str = "0000";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A# \d+. (.*)").expect("valid regex"));

static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"## Status\s*(.*)").expect("valid regex"));

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// One architecture decision record as fetched from a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    path: String,
    raw_content: String,
    html_url: String,
}

impl Decision {
    pub fn new(
        path: impl Into<String>,
        raw_content: impl Into<String>,
        html_url: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            raw_content: raw_content.into(),
            html_url: html_url.into(),
        }
    }

    /// Repository-relative path of the document.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_content(&self) -> &str {
        &self.raw_content
    }

    /// Browser URL of the document on the host.
    pub fn html_url(&self) -> &str {
        &self.html_url
    }

    /// Last path segment; the deduplication key across branches.
    pub fn filename(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Text of the `# <n>. <title>` heading that opens the document.
    pub fn title(&self) -> String {
        TITLE_RE
            .captures(&self.raw_content)
            .map(|caps| caps[1].trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// First non-blank text following the `## Status` heading.
    pub fn status(&self) -> String {
        STATUS_RE
            .captures(&self.raw_content)
            .map(|caps| caps[1].trim().to_string())
            .filter(|status| !status.is_empty())
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string())
    }

    /// Numeric prefix of the filename (`0012` for `0012-use-widgets.md`).
    pub fn short_id(&self) -> &str {
        match self.filename().split_once('-') {
            Some((prefix, _)) => prefix,
            None => FALLBACK_SHORT_ID,
        }
    }

    /// Display identifier, e.g. `ADR-0012`.
    pub fn id(&self) -> String {
        format!("ADR-{}", self.short_id())
    }

    /// False once the decision has been superseded.
    pub fn is_active(&self) -> bool {
        !self.status().contains("Superseded")
    }
}

// ---------------------------------------------------------------------------
// DecisionCollection
// ---------------------------------------------------------------------------

/// Decisions keyed by filename. The first decision inserted for a filename wins.
#[derive(Debug, Clone, Default)]
pub struct DecisionCollection {
    by_filename: HashMap<String, Decision>,
}

impl DecisionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless a decision with the same filename is already present.
    /// Returns whether the decision was inserted.
    pub fn insert_if_absent(&mut self, decision: Decision) -> bool {
        let key = decision.filename().to_string();
        if self.by_filename.contains_key(&key) {
            return false;
        }
        self.by_filename.insert(key, decision);
        true
    }

    /// Merge one branch's decisions, keeping existing entries on filename clashes.
    /// Returns how many decisions were new.
    pub fn merge(&mut self, decisions: impl IntoIterator<Item = Decision>) -> usize {
        let mut added = 0;
        for decision in decisions {
            if self.insert_if_absent(decision) {
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, filename: &str) -> Option<&Decision> {
        self.by_filename.get(filename)
    }

    pub fn len(&self) -> usize {
        self.by_filename.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_filename.is_empty()
    }

    /// Decisions ordered by filename, ascending. The map's own order is never used.
    pub fn sorted(&self) -> Vec<&Decision> {
        let mut filenames: Vec<&String> = self.by_filename.keys().collect();
        filenames.sort();
        filenames
            .into_iter()
            .map(|name| &self.by_filename[name])
            .collect()
    }
}
