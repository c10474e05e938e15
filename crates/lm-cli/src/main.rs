mod server;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use lm_core::ContextArtifact;
use lm_store::{
    BootstrapOptions, BootstrapReport, Bootstrapper, CacheFile, CommandSource, Config,
    EventRecord, Vault, append_event, clock, default_state_dir, resolve_vault_root,
};
use rmcp::{ServiceExt, transport::stdio};

#[derive(Parser)]
#[command(name = "lm", about = "Life-memory context snapshot CLI and MCP server")]
struct Cli {
    /// Vault root (overrides LM_VAULT and the configured vault)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or reuse) the context snapshot and print it
    Bootstrap {
        /// Day to snapshot (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Token budget for the whole snapshot
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Print the full artifact and status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start MCP server on stdio transport
    Serve,

    /// Persist the vault path
    SetVault {
        /// Vault directory
        path: PathBuf,
    },

    /// Print the vault path in effect
    ShowVault,

    /// Append an event to today's daily note
    LogEvent {
        #[arg(long)]
        category: String,

        #[arg(long)]
        event: String,

        #[arg(long, default_value = "")]
        details: String,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },

    /// List cached snapshots for the vault
    CacheStatus,

    /// Full-text search through the note application
    Search {
        #[arg(long)]
        query: String,
    },

    /// Print a note through the note application
    #[command(group(ArgGroup::new("note").required(true).args(["file", "path"])))]
    Read {
        /// Note name, resolved the way wiki links are
        #[arg(long)]
        file: Option<String>,

        /// Vault-relative path of the note
        #[arg(long)]
        path: Option<String>,
    },
}

/// Everything a command needs to find the vault and its settings.
pub(crate) struct Settings {
    pub(crate) state_dir: PathBuf,
    pub(crate) config: Config,
    pub(crate) vault: Vault,
    pub(crate) obsidian_env: Option<String>,
}

impl Settings {
    fn load(cli: &Cli) -> Result<Self> {
        let state_dir = default_state_dir();
        let config = Config::load(&state_dir).with_context(|| {
            format!(
                "failed to load config from {}",
                Config::path(&state_dir).display()
            )
        })?;
        let explicit = cli
            .vault
            .clone()
            .or_else(|| env::var_os("LM_VAULT").map(PathBuf::from));
        let vault = Vault::new(resolve_vault_root(explicit.as_deref(), &config));
        Ok(Self {
            state_dir,
            config,
            vault,
            obsidian_env: env::var("OBSIDIAN_BIN").ok(),
        })
    }

    pub(crate) fn bootstrapper(&self) -> Bootstrapper {
        Bootstrapper::new(self.vault.clone(), &self.config, self.obsidian_env.clone())
    }

    pub(crate) fn command_source(&self) -> CommandSource {
        CommandSource::new(
            self.config.obsidian_bin(self.obsidian_env.clone()),
            &self.vault,
            self.config.command_timeout(),
            clock::today(),
        )
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Bootstrap {
            date,
            max_tokens,
            json,
        } => cmd_bootstrap(&cli, date.clone(), *max_tokens, *json),
        Commands::Serve => cmd_serve(&cli).await,
        Commands::SetVault { path } => cmd_set_vault(path),
        Commands::ShowVault => cmd_show_vault(&cli),
        Commands::LogEvent {
            category,
            event,
            details,
            tags,
        } => cmd_log_event(&cli, category, event, details, tags),
        Commands::CacheStatus => cmd_cache_status(&cli),
        Commands::Search { query } => cmd_search(&cli, query),
        Commands::Read { file, path } => cmd_read(&cli, file.as_deref(), path.as_deref()),
    }
}

fn cmd_bootstrap(cli: &Cli, date: Option<String>, max_tokens: Option<usize>, json: bool) -> Result<()> {
    let report = match Settings::load(cli) {
        Ok(settings) => settings
            .bootstrapper()
            .run(&BootstrapOptions { date, max_tokens }),
        Err(e) => {
            tracing::error!("{e:#}");
            BootstrapReport {
                date: date.unwrap_or_else(clock::today),
                artifact: ContextArtifact::error(&format!("{e:#}")),
                status: None,
                cache_error: None,
            }
        }
    };

    if json {
        let value = server::report_json(&report);
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("failed to serialize report")?
        );
    } else {
        print!("{}", report.artifact.content);
        if !report.artifact.content.ends_with('\n') {
            println!();
        }
    }

    if cli.verbose {
        eprintln!(
            "--- {}: status={}, artifact={} ---",
            report.date,
            report.status.map(|s| s.as_str()).unwrap_or("failed"),
            report.artifact.name
        );
        if let Some(e) = &report.cache_error {
            eprintln!("--- cache not saved: {e} ---");
        }
    }
    Ok(())
}

async fn cmd_serve(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli)?;
    tracing::info!(
        "starting MCP server for vault {}",
        settings.vault.root().display()
    );

    let service = server::LmServer::new(settings)
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

fn cmd_set_vault(path: &Path) -> Result<()> {
    let state_dir = default_state_dir();
    let mut config = Config::load(&state_dir).context("failed to load config")?;

    let root = resolve_vault_root(Some(path), &Config::default());
    if !root.is_dir() {
        anyhow::bail!("vault path is not a directory: {}", root.display());
    }
    config.vault_path = Some(root.clone());
    config
        .save(&state_dir)
        .with_context(|| format!("failed to write {}", Config::path(&state_dir).display()))?;

    println!("vault set to {}", root.display());
    Ok(())
}

fn cmd_show_vault(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli)?;
    println!("{}", settings.vault.root().display());
    if cli.verbose {
        eprintln!("--- config: {} ---", Config::path(&settings.state_dir).display());
    }
    if !settings.vault.exists() {
        tracing::warn!("vault directory does not exist");
    }
    Ok(())
}

fn cmd_log_event(cli: &Cli, category: &str, event: &str, details: &str, tags: &str) -> Result<()> {
    let settings = Settings::load(cli)?;
    if !settings.vault.exists() {
        anyhow::bail!(
            "vault path does not exist: {}",
            settings.vault.root().display()
        );
    }

    let record = EventRecord {
        time: clock::clock_hhmm(),
        category: category.to_string(),
        event: event.to_string(),
        details: details.to_string(),
        tags: tags.to_string(),
    };
    let line = record.to_line();
    let command = settings.command_source();
    let target = append_event(&settings.vault, Some(&command), &clock::today(), &line)
        .context("failed to append event")?;

    match target {
        lm_store::AppendTarget::Command => println!("logged via note application: {line}"),
        lm_store::AppendTarget::File(path) => println!("logged to {}: {line}", path.display()),
    }
    Ok(())
}

fn cmd_cache_status(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli)?;
    let cache = CacheFile::new(settings.vault.cache_path());
    let state = cache.load();

    if state.is_empty() {
        println!("(no cached snapshots in {})", cache.path().display());
        return Ok(());
    }

    println!("cache: {}", cache.path().display());
    for (date, entry) in state.iter() {
        let short_hash: String = entry.combined_hash.chars().take(12).collect();
        println!(
            "{date}  lines={:<5} chars={:<6} updated={}  hash={short_hash}",
            entry.last_line_count,
            entry.snapshot.chars().count(),
            entry.last_updated_iso,
        );
    }
    Ok(())
}

fn cmd_search(cli: &Cli, query: &str) -> Result<()> {
    let settings = Settings::load(cli)?;
    let output = settings
        .command_source()
        .run(&["search", &format!("query={query}"), "matches"])
        .context("search failed")?;
    if output.is_empty() {
        println!("(no matches)");
    } else {
        println!("{output}");
    }
    Ok(())
}

fn cmd_read(cli: &Cli, file: Option<&str>, path: Option<&str>) -> Result<()> {
    let target = match (file, path) {
        (Some(file), None) => format!("file={file}"),
        (None, Some(path)) => format!("path={path}"),
        _ => anyhow::bail!("provide exactly one of --file or --path"),
    };
    let settings = Settings::load(cli)?;
    let output = settings
        .command_source()
        .run(&["read", &target])
        .context("read failed")?;
    println!("{output}");
    Ok(())
}
