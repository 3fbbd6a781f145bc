//! Shared types, error model, and configuration for adr-tools.
//!
//! This crate is the foundation depended on by all other adr-tools crates.
//! It provides:
//! - [`AdrToolsError`], the unified error type
//! - Domain types ([`RepoSlug`], [`BranchNaming`])
//! - Configuration ([`AppConfig`], [`RebuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GithubConfig, IndexConfig, RebuildConfig, ScaffoldConfig, config_dir,
    config_file_path, init_config, init_config_in, load_config, load_config_from, resolve_token,
};
pub use error::{AdrToolsError, Result};
pub use types::{BranchNaming, RepoSlug};
