use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod dispatch;
mod format;
mod render;

use dispatch::run_cli;

const LOG_ENV: &str = "CMDKIT_LOG";

#[derive(Parser, Debug)]
#[command(name = "cmdkit")]
#[command(about = "Install, inspect and roll back commandsets in a project", long_about = None)]
struct Cli {
    /// Catalog TOML to use instead of the built-in one.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Directory holding one template folder per commandset.
    #[arg(long)]
    bundle_root: Option<PathBuf>,
    /// Project to operate on. Defaults to the current directory.
    #[arg(long)]
    project: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show every known commandset.
    List,
    /// Show built-in and custom profiles.
    Profiles,
    /// Print the install order for a set of commandsets.
    Order {
        #[arg(required = true)]
        names: Vec<String>,
    },
    Install {
        names: Vec<String>,
        #[arg(long, conflicts_with_all = ["all", "names"])]
        profile: Option<String>,
        #[arg(long, conflicts_with = "names")]
        all: bool,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        no_backup: bool,
    },
    /// Report which declared files exist in the project.
    Status,
    /// List settings files shared by the given commandsets.
    Conflicts {
        #[arg(required = true)]
        names: Vec<String>,
    },
    Versions,
    History,
    Rollback {
        backup_id: String,
    },
    ValidateSettings,
    /// Store a custom profile in the project.
    ProfileSave {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_delimiter = ',', required = true)]
        commandsets: Vec<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    run_cli(Cli::parse())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
