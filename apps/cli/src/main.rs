//! # Flama CLI Entry Point
//!
//! Parses arguments, runs the command and turns failures into an exit code.

use clap::Parser;
use std::process::ExitCode;

use flama_cli::error::CliError;
use flama_cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let json = cli.json;

    match flama_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, json),
    }
}

fn report(err: &CliError, json: bool) -> ExitCode {
    match serde_json::to_string(err) {
        Ok(body) if json => eprintln!("{body}"),
        _ => eprintln!("error: {}", err.message),
    }

    ExitCode::from(err.exit_code())
}
