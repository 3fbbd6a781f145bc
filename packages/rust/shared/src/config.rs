//! Application configuration for adr-tools.
//!
//! User config lives at `~/.adr-tools/adr-tools.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AdrToolsError, Result};
use crate::types::{BranchNaming, RepoSlug};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "adr-tools.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".adr-tools";

// ---------------------------------------------------------------------------
// Config structs (matching adr-tools.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Repository host settings.
    #[serde(default)]
    pub github: GithubConfig,

    /// Index (README) rebuild settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// Local scaffolding settings for `adr-tools new`.
    #[serde(default)]
    pub scaffold: ScaffoldConfig,
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Name of the env var holding the access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_env: default_token_env(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Stable branch the index is read from and review requests target.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Repository path of the index document.
    #[serde(default = "default_index_path")]
    pub path: String,

    /// Repository directory holding the decision documents.
    #[serde(default = "default_decisions_dir")]
    pub decisions_dir: String,

    /// Label marking open review requests whose decisions are included.
    #[serde(default = "default_toc_label")]
    pub toc_label: String,

    /// Prefix for generated target branch names.
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// Display name rendered at the top of the index.
    #[serde(default = "default_name")]
    pub name: String,

    /// Description rendered under the display name.
    #[serde(default = "default_description")]
    pub description: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base_branch: default_base_branch(),
            path: default_index_path(),
            decisions_dir: default_decisions_dir(),
            toc_label: default_toc_label(),
            branch_prefix: default_branch_prefix(),
            name: default_name(),
            description: default_description(),
        }
    }
}

fn default_base_branch() -> String {
    "main".into()
}
fn default_index_path() -> String {
    "README.md".into()
}
fn default_decisions_dir() -> String {
    "decisions".into()
}
fn default_toc_label() -> String {
    "toc".into()
}
fn default_branch_prefix() -> String {
    "adr-tools/readme-update".into()
}
fn default_name() -> String {
    "Architecture".into()
}
fn default_description() -> String {
    "Our list of decisions".into()
}

/// `[scaffold]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    /// Local directory new decision documents are written to.
    #[serde(default = "default_decisions_dir")]
    pub output_dir: String,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            output_dir: default_decisions_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rebuild config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one index rebuild. Immutable once the rebuild begins.
#[derive(Debug, Clone)]
pub struct RebuildConfig {
    /// Target repository.
    pub repo: RepoSlug,
    /// Branch the index is read from and the review request targets.
    pub base_branch: String,
    /// Branch carrying the index update commit.
    pub target_branch: String,
    /// Create `target_branch`; when false the branch already exists and is moved.
    pub create_branch: bool,
    /// Repository path of the index document.
    pub index_path: String,
    /// Repository directory holding the decision documents.
    pub decisions_dir: String,
    /// Label selecting open review requests to scan.
    pub toc_label: String,
    /// Display name passed to the index template.
    pub name: String,
    /// Description passed to the index template.
    pub description: String,
    /// Render and diff only, never mutate the remote repository.
    pub dry_run: bool,
    /// Open a review request after committing.
    pub create_pull_request: bool,
}

impl RebuildConfig {
    /// Merge the `[index]` config section with a repository and a branch naming strategy.
    pub fn new(
        repo: RepoSlug,
        index: &IndexConfig,
        naming: &BranchNaming,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            repo,
            base_branch: index.base_branch.clone(),
            target_branch: naming.resolve(now),
            create_branch: naming.creates_branch(),
            index_path: index.path.clone(),
            decisions_dir: index.decisions_dir.clone(),
            toc_label: index.toc_label.clone(),
            name: index.name.clone(),
            description: index.description.clone(),
            dry_run: false,
            create_pull_request: true,
        }
    }

    /// Defaults for `repo` with a timestamped target branch.
    pub fn with_defaults(repo: RepoSlug, now: DateTime<Utc>) -> Self {
        let index = IndexConfig::default();
        let naming = BranchNaming::timestamped(&index.branch_prefix);
        Self::new(repo, &index, &naming, now)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.adr-tools/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AdrToolsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.adr-tools/adr-tools.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AdrToolsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        AdrToolsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_in(&config_dir()?)
}

/// Write a default config file into `dir`, creating the directory if needed.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| AdrToolsError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AdrToolsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AdrToolsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the host access token: an explicit value wins, then the configured env var.
pub fn resolve_token(config: &AppConfig, explicit: Option<&str>) -> Result<String> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }

    let var_name = &config.github.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(AdrToolsError::config(format!(
            "GitHub token not found. Pass --github-token or set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("base_branch"));
        assert!(toml_str.contains("GITHUB_TOKEN"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[index]
base_branch = "trunk"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.index.base_branch, "trunk");
        assert_eq!(config.index.path, "README.md");
        assert_eq!(config.index.toc_label, "toc");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.scaffold.output_dir, "decisions");
    }

    #[test]
    fn init_then_load_roundtrips() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = init_config_in(&tmp.path().join("nested")).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.index.name, "Architecture");
        assert_eq!(loaded.index.description, "Our list of decisions");
    }

    #[test]
    fn malformed_config_is_config_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("adr-tools.toml");
        std::fs::write(&path, "[index\nbase_branch = 3").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, AdrToolsError::Config { .. }));
    }

    #[test]
    fn rebuild_config_uses_index_section() {
        let repo: RepoSlug = "acme/arch".parse().unwrap();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let config = RebuildConfig::with_defaults(repo, now);
        assert_eq!(config.base_branch, "main");
        assert_eq!(config.index_path, "README.md");
        assert_eq!(config.target_branch, "adr-tools/readme-update/1700000000");
        assert!(config.create_branch);
        assert!(config.create_pull_request);
        assert!(!config.dry_run);
    }

    #[test]
    fn explicit_branch_is_reused() {
        let repo: RepoSlug = "acme/arch".parse().unwrap();
        let naming = BranchNaming::Explicit("docs/index".into());
        let config = RebuildConfig::new(repo, &IndexConfig::default(), &naming, Utc::now());
        assert_eq!(config.target_branch, "docs/index");
        assert!(!config.create_branch);
    }

    #[test]
    fn explicit_token_wins() {
        let config = AppConfig::default();
        assert_eq!(resolve_token(&config, Some("abc")).unwrap(), "abc");
    }

    #[test]
    fn missing_token_is_reported() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.github.token_env = "ADRTOOLS_TEST_NONEXISTENT_TOKEN_12345".into();
        let err = resolve_token(&config, None).unwrap_err();
        assert!(err.to_string().contains("token not found"));
    }
}
