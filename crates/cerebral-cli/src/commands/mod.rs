use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use cerebral_config::ConfigLoader;
use cerebral_core::{BranchRegistry, CerebralError, ProvenanceFilter};

use crate::context::AppContext;

mod chat;
mod conversation;
mod memory;
mod render;

/// 🧠 Cerebral: memory and conversation client
#[derive(Parser)]
#[command(name = "cerebral", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to cerebral.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List memory branches and the backend domain each maps to
    Branches,
    /// Show every memory in a branch
    Load {
        branch: String,
        /// Only show memories of this provenance: all, system, user
        #[arg(short, long, default_value = "all")]
        provenance: ProvenanceFilter,
    },
    /// Search memories in one branch or across all branches
    Search {
        query: String,
        /// Restrict the search to one branch
        #[arg(short, long)]
        branch: Option<String>,
        /// Only show memories of this provenance: all, system, user
        #[arg(short, long, default_value = "all")]
        provenance: ProvenanceFilter,
    },
    /// Add a memory to a branch
    Add {
        branch: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        url: Option<String>,
        /// Attach a file by description (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
    /// Delete a memory by id
    Remove {
        id: String,
        /// Branch to reload after the delete
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Show per-branch statistics
    Stats {
        /// Show zeros instead of sample numbers when the service is down
        #[arg(long)]
        empty_on_failure: bool,
    },
    /// Show memories kept locally after failed creates
    Local { branch: String },
    /// List agents registered with the conversation service
    Agents,
    /// List conversation flows
    Flows,
    /// Show conversation service statistics
    Health,
    /// Interactive conversation in the terminal
    Chat,
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub async fn run(self) -> cerebral_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or(&config.logging.level)
        };

        if config.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
                )
                .json()
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
                )
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }

        match self.command {
            Commands::Branches => Self::cmd_branches(),
            Commands::Config { json } => Self::cmd_config(config, json),
            Commands::Completions { shell } => Self::cmd_completions(shell),
            command => {
                let ctx = AppContext::from_config(config)?;
                Self::dispatch(&ctx, command).await
            }
        }
    }

    async fn dispatch(ctx: &AppContext, command: Commands) -> cerebral_core::Result<()> {
        match command {
            Commands::Load { branch, provenance } => {
                memory::cmd_load(ctx, &branch, provenance).await
            }
            Commands::Search {
                query,
                branch,
                provenance,
            } => memory::cmd_search(ctx, &query, branch.as_deref(), provenance).await,
            Commands::Add {
                branch,
                title,
                content,
                url,
                files,
            } => memory::cmd_add(ctx, &branch, title, content, url, &files).await,
            Commands::Remove { id, branch } => {
                memory::cmd_remove(ctx, &id, branch.as_deref()).await
            }
            Commands::Stats { empty_on_failure } => memory::cmd_stats(ctx, empty_on_failure).await,
            Commands::Local { branch } => memory::cmd_local(ctx, &branch),
            Commands::Agents => conversation::cmd_agents(ctx).await,
            Commands::Flows => conversation::cmd_flows(ctx).await,
            Commands::Health => conversation::cmd_health(ctx).await,
            Commands::Chat => chat::cmd_chat(ctx).await,
            Commands::Branches | Commands::Config { .. } | Commands::Completions { .. } => Ok(()),
        }
    }

    fn cmd_branches() -> cerebral_core::Result<()> {
        println!("🧠 Memory branches");
        println!();
        for branch in BranchRegistry::all() {
            println!(
                "  {:<10} {:<15} {:<9} {}",
                branch.name, branch.domain, branch.kind, branch.description
            );
        }
        Ok(())
    }

    fn cmd_config(config: cerebral_config::CerebralConfig, json: bool) -> cerebral_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| CerebralError::Config(e.to_string()))?
            );
        }

        // Validation already passed at load; show what is left to tidy up.
        if let Ok(warnings) = config.validate() {
            for w in &warnings {
                eprintln!("  {w}");
            }
        }
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> cerebral_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "cerebral", &mut std::io::stdout());
        Ok(())
    }
}
