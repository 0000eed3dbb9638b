//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the appropriate
//! command handlers.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

use crate::commands;
use crate::logging;

/// A terminal voice memo recorder that uploads clips to a server
#[derive(Parser)]
#[command(name = "vmemo")]
#[command(version)]
#[command(about = "Record voice memos from the terminal and upload them to a server")]
#[command(
    long_about = "Record a voice memo from the microphone with a live elapsed-time display.\n\
On stop, the clip is kept locally for replay and POSTed to the configured\n\
server endpoint as a WAV file.\n\n\
DEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\n\
EXAMPLES:\n    # Record and upload a memo\n    $ vmemo\n\n    # Replay the most recent recording\n    $ vmemo replay\n\n    # Replay the second most recent recording\n    $ vmemo replay 2\n\n    # Edit configuration file\n    $ vmemo config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/vmemo/vmemo.toml\n    Recordings:         ~/.local/share/vmemo/recordings\n    Logs:               ~/.local/state/vmemo/vmemo.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a voice memo and upload it (default)
    ///
    /// Press Enter to start recording, Enter again to stop and upload.
    /// The clip is kept locally for replay regardless of upload success.
    #[command(visible_alias = "r")]
    Record,

    /// Replay a stored recording using the system audio player
    #[command(visible_alias = "rp")]
    Replay {
        /// Recording index (1 = most recent, 2 = second most recent, etc.)
        #[arg(value_name = "N")]
        index: Option<usize>,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Edit the audio device and upload server settings.
    /// Uses $EDITOR environment variable or falls back to nano/vim.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in vmemo.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Save the output to your shell's completion directory or source it
    /// directly.
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "vmemo", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Record) => {
            commands::handle_record().await?;
        }
        Some(Commands::Replay { index }) => {
            commands::handle_replay(index).await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
