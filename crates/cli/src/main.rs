//! pfxctl - PFx Brick control CLI
//!
//! File transfers, event/action table access, one-shot actions and sound
//! profile programming for PFx Bricks over USB or Bluetooth LE.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod client;
mod commands;
mod completion;
mod error;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pfxbrick::FileSpec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::ConnectArgs;
use crate::commands::*;

#[derive(Parser)]
#[command(name = "pfxctl")]
#[command(about = "PFx Brick control CLI - files, event actions and sound profiles")]
#[command(version)]
#[command(long_about = "
pfxctl talks to a PFx Brick over USB (default) or Bluetooth LE.
It manages the brick's file system and event/action table, runs one-shot
actions, and compiles sound profiles into brick programs, scripts and
configuration images.

Use --json for machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    connect: ConnectArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List PFx Bricks attached over USB
    List,

    /// Scan for PFx Bricks advertising over Bluetooth LE
    #[cfg(feature = "ble")]
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value_t = 5)]
        seconds: u64,
    },

    /// Show identity, firmware, ICD revision and name
    Info,

    /// Show or change the brick's name
    Name {
        /// New name (up to 24 bytes)
        name: Option<String>,
    },

    /// List the file directory
    Dir,

    /// Upload a file
    Put {
        /// Host file to upload
        path: PathBuf,
        /// File id on the brick (default: first free id)
        #[arg(long, value_parser = parse_u8)]
        id: Option<u8>,
        /// Name on the brick (default: the host file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Download a file
    Get {
        /// File id (e.g. 0x21) or name
        #[arg(value_parser = parse_file_spec)]
        file: FileSpec,
        /// Output path (default: the brick file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a file
    Rm {
        #[arg(value_parser = parse_file_spec)]
        file: FileSpec,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a file
    Rename {
        #[arg(value_parser = parse_file_spec)]
        file: FileSpec,
        new_name: String,
    },

    /// Erase the file system
    Format {
        /// Full erase instead of a quick format
        #[arg(long)]
        full: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Run a script file
    Run {
        #[arg(value_parser = parse_file_spec)]
        file: FileSpec,
    },

    /// Stop the running script
    Stop,

    /// Restart the brick
    Restart,

    /// Restore factory default configuration
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Event/action table commands
    #[command(subcommand)]
    Events(EventCommands),

    /// Execute one-shot actions
    #[command(subcommand)]
    Action(ActionCommands),

    /// Sound profile commands
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Poll and print the brick's runtime state
    Monitor {
        /// Poll interval in milliseconds
        #[arg(short, long, default_value_t = 500)]
        interval_ms: u64,
        /// Stop after this many samples
        #[arg(short = 'n', long)]
        count: Option<u32>,
        /// Also print brick notifications (Bluetooth only)
        #[arg(long)]
        notify: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Commands {
    fn needs_brick(&self) -> bool {
        match self {
            Commands::List | Commands::Completion { .. } => false,
            #[cfg(feature = "ble")]
            Commands::Scan { .. } => false,
            Commands::Profile(cmd) => cmd.needs_brick(),
            _ => true,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = execute_command(&cli).await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            std::process::exit(error::exit_code(&e));
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    if cli.command.needs_brick() {
        let mut conn = client::Connection::open(&cli.connect).await?;
        let result = commands::execute(&mut conn, &cli.command, cli.json).await;
        conn.close().await;
        return result;
    }
    match &cli.command {
        Commands::List => commands::device::list(cli.json),
        #[cfg(feature = "ble")]
        Commands::Scan { seconds } => commands::device::scan(*seconds, cli.json).await,
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
        Commands::Profile(cmd) => commands::profile::execute_offline(cmd, cli.json).await,
        _ => Ok(()),
    }
}
