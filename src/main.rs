//! pasat: the Paced Auditory Serial Addition Test on the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod audio;
mod commands;
mod console;
mod store;

#[derive(Parser)]
#[command(name = "pasat", version, about = "Paced Auditory Serial Addition Test")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo (if enabled) and the PASAT for one player
    Run(commands::run::RunArgs),

    /// Write a starter pasat.toml
    Init {
        /// Where to write the config
        #[arg(long, default_value = "pasat.toml")]
        path: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pasat=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Init { path } => commands::init::execute(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
