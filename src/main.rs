use clap::{Parser, Subcommand};
use declutter::OrganizeMethod;
use declutter::cli::{Command, execute};
use declutter::config::Config;
use declutter::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "declutter",
    version,
    about = "Organize files by type or date, remove duplicates and empty folders, and undo the last organization."
)]
struct Cli {
    /// Configuration file (defaults to .declutterrc.toml or ~/.config/declutter/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Move the files of a directory into category folders.
    Organize {
        path: PathBuf,
        /// Group by file type or by modification month.
        #[arg(long, value_enum, default_value_t = OrganizeMethod::Type)]
        by: OrganizeMethod,
        /// Show what would be moved without moving anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete files whose content duplicates a file seen earlier.
    Dedupe {
        path: PathBuf,
        /// List duplicates without deleting them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Remove empty folders, deepest first.
    Prune { path: PathBuf },
    /// Move the files of the last organization back.
    Undo,
    /// Show recent activity.
    Logs,
}

impl From<Commands> for Command {
    fn from(value: Commands) -> Self {
        match value {
            Commands::Organize { path, by, dry_run } => Command::Organize {
                path,
                method: by,
                dry_run,
            },
            Commands::Dedupe { path, dry_run } => Command::Dedupe { path, dry_run },
            Commands::Prune { path } => Command::Prune { path },
            Commands::Undo => Command::Undo,
            Commands::Logs => Command::Logs,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_logging(&config.log_file(), config.recent_log_capacity);

    match execute(&cli.command.into(), &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
