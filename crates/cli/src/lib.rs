pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "resub",
    about = "resub operator CLI",
    long_about = "Check host readiness, inspect configuration, and dry-run s/old/new substitutions.",
    after_help = "Examples:\n  resub doctor --json\n  resub config\n  resub try 's/bee/be' 'message to bee replaced'"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config, host reachability, and minimum server version")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Dry-run a substitution command against a message without a host")]
    Try {
        #[arg(help = "The command, e.g. 's/old/new'")]
        command: String,
        #[arg(help = "The previous message the command would edit")]
        message: String,
        #[arg(long, help = "Treat the old text as a regular expression")]
        pattern: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Try { command, message, pattern } => {
            commands::try_run::run(&command, &message, pattern)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
