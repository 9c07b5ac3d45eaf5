use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Health(args) => commands::health::run(args).await,
    }
}
