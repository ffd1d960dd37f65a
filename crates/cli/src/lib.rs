pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "intake",
    about = "Quote intake operator CLI",
    long_about = "Inspect intake configuration, check collaborator readiness, and preview outbound messages.",
    after_help = "Examples:\n  intake doctor --json\n  intake config\n  intake preview request.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and check that every collaborator has its credentials")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Render the SMS and email for a submission file without sending anything")]
    Preview {
        #[arg(help = "Path to a JSON quote submission")]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Preview { file } => commands::preview::run(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
