//! Local scaffolding of new decision records (`adr-tools new`).

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use adrtools_shared::{AdrToolsError, Result};
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info, instrument};

const DECISION_TEMPLATE: &str = include_str!("../templates/decision.md.tmpl");

/// Status written into freshly created records.
pub const INITIAL_STATUS: &str = "Proposed";

static NUMBERED_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-.*\.md$").expect("valid regex"));

/// One past the highest `NNNN-*.md` number in `dir`. A missing directory starts at 1.
pub fn next_number(dir: &Path) -> Result<u32> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(AdrToolsError::io(dir, e)),
    };

    let mut highest = 0;
    for entry in entries {
        let entry = entry.map_err(|e| AdrToolsError::io(dir, e))?;
        let name = entry.file_name();
        let Some(caps) = name.to_str().and_then(|n| NUMBERED_RECORD.captures(n)) else {
            continue;
        };
        if let Ok(number) = caps[1].parse::<u32>() {
            highest = highest.max(number);
        }
    }

    Ok(highest + 1)
}

/// Lowercase kebab-case file stem for `title`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Fill the decision template.
pub fn render_decision(number: u32, title: &str, date: NaiveDate, status: &str) -> String {
    DECISION_TEMPLATE
        .replace("{{number}}", &number.to_string())
        .replace("{{title}}", title)
        .replace("{{date}}", &date.format("%Y-%m-%d").to_string())
        .replace("{{status}}", status)
}

/// Write a new `NNNN-slug.md` record into `dir` and return its path.
///
/// Never overwrites an existing file.
#[instrument(skip(dir), fields(dir = %dir.display()))]
pub fn create_decision(dir: &Path, title: &str, date: NaiveDate) -> Result<PathBuf> {
    let title = title.trim();
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(AdrToolsError::validation(
            "decision title must contain at least one letter or digit",
        ));
    }

    std::fs::create_dir_all(dir).map_err(|e| AdrToolsError::io(dir, e))?;

    let number = next_number(dir)?;
    let path = dir.join(format!("{number:04}-{slug}.md"));
    debug!(number, path = %path.display(), "scaffolding decision");

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                AdrToolsError::validation(format!("{} already exists", path.display()))
            } else {
                AdrToolsError::io(&path, e)
            }
        })?;
    file.write_all(render_decision(number, title, date, INITIAL_STATUS).as_bytes())
        .map_err(|e| AdrToolsError::io(&path, e))?;

    info!(path = %path.display(), "created decision record");
    Ok(path)
}
