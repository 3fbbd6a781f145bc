//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use adrtools_core::index::IndexTemplate;
use adrtools_core::rebuild::{ProgressReporter, RebuildOutcome, rebuild_index};
use adrtools_core::scaffold::create_decision;
use adrtools_forge::GithubHost;
use adrtools_shared::{
    AppConfig, BranchNaming, RebuildConfig, RepoSlug, init_config, load_config, resolve_token,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// adr-tools: keep a repository's architecture decision index up to date.
#[derive(Parser)]
#[command(
    name = "adr-tools",
    version,
    about = "Rebuild the index of architecture decision records and scaffold new ones.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Regenerate the decision index and open a pull request if it changed.
    RebuildIndex(RebuildArgs),

    /// Create a new decision record in the local decisions directory.
    New {
        /// Title of the decision.
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        /// Directory to write into (defaults to the configured output dir).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
pub(crate) struct RebuildArgs {
    /// GitHub access token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Repository as `owner/repo`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    github_repository: String,

    /// Commit the index without opening a pull request.
    #[arg(long)]
    no_pull_request: bool,

    /// Branch to commit to (created, or fast-forwarded if it exists). Defaults to a timestamped branch.
    #[arg(long)]
    target_branch: Option<String>,

    /// Render and compare only; print the index and change nothing.
    #[arg(long)]
    dry_run: bool,

    /// Override the configured base branch.
    #[arg(long)]
    base_branch: Option<String>,

    /// Override the configured API base URL.
    #[arg(long)]
    api_url: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "adrtools=info",
        1 => "adrtools=debug",
        _ => "adrtools=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::RebuildIndex(args) => cmd_rebuild_index(args).await,
        Command::New { title, dir } => cmd_new(&title.join(" "), dir),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// rebuild-index
// ---------------------------------------------------------------------------

async fn cmd_rebuild_index(args: RebuildArgs) -> Result<()> {
    let config = load_config()?;

    // Everything local is validated before the first request.
    let template = IndexTemplate::embedded()?;
    let repo: RepoSlug = args.github_repository.parse()?;
    let token = resolve_token(&config, args.github_token.as_deref())?;
    let api_url = args.api_url.unwrap_or_else(|| config.github.api_url.clone());

    let mut index = config.index.clone();
    if let Some(base) = args.base_branch {
        index.base_branch = base;
    }
    let naming = BranchNaming::from_override(args.target_branch, &index.branch_prefix);

    let mut rebuild = RebuildConfig::new(repo.clone(), &index, &naming, chrono::Utc::now());
    rebuild.dry_run = args.dry_run;
    rebuild.create_pull_request = !args.no_pull_request;

    let host = GithubHost::new(&api_url, repo, &token)?;

    info!(
        repo = %rebuild.repo,
        base = %rebuild.base_branch,
        target = %rebuild.target_branch,
        dry_run = rebuild.dry_run,
        "rebuilding decision index"
    );

    let reporter = CliProgress::new();
    let outcome = rebuild_index(&host, &rebuild, &template, &reporter).await;
    reporter.clear();

    match outcome? {
        RebuildOutcome::Unchanged => {
            println!("No changes to {}", rebuild.index_path);
        }
        RebuildOutcome::DryRun { content, changed } => {
            print!("{content}");
            let verdict = if changed { "would be updated" } else { "is up to date" };
            eprintln!("(dry run) {} {verdict}", rebuild.index_path);
        }
        RebuildOutcome::Published(publication) => match publication.pull_request {
            Some(pr) => println!("Success!\n{}", pr.html_url),
            None => println!(
                "Success!\nCommitted {} to {}",
                publication.commit_sha, publication.branch
            ),
        },
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

/// Line left on the terminal when a phase starts.
fn phase_line(name: &str) -> String {
    format!("-- {name}...")
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.println(phase_line(name));
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _outcome: &RebuildOutcome) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

fn cmd_new(title: &str, dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => PathBuf::from(load_config()?.scaffold.output_dir),
    };

    let today = chrono::Local::now().date_naive();
    let path = create_decision(&dir, title, today)?;
    println!("{}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config).map_err(|e| eyre!("cannot render config: {e}"))?;
    println!("{toml_str}");
    Ok(())
}
