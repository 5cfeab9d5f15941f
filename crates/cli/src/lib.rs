pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shopfront",
    about = "Shopfront operator CLI",
    long_about = "Inspect configuration, resolve product reviews, and check upstream readiness.",
    after_help = "Examples:\n  shopfront config\n  shopfront reviews <GUID> --random\n  shopfront doctor --json"
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
    #[command(about = "Resolve reviews for an internal product, falling back to the mock API")]
    Reviews {
        #[arg(help = "Internal product GUID")]
        product_id: String,
        #[arg(long, help = "Return one review picked at random")]
        random: bool,
    },
    #[command(about = "Show the external product matched to an internal product")]
    Match {
        #[arg(help = "Internal product GUID")]
        product_id: String,
    },
    #[command(about = "Validate config and check reachability of every upstream")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Reviews { product_id, random } => commands::reviews::run(&product_id, random),
        Command::Match { product_id } => commands::reviews::run_match(&product_id),
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
