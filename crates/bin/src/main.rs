use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod flash;
mod output;
mod session;
mod templates;

use cli::{Cli, Commands, ServeArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG overrides the default filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("startpage=info")),
        )
        .init();

    match cli.command {
        None => commands::serve::run(&ServeArgs::default()).await,
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        Some(Commands::Digest(args)) => commands::digest::run(&args).await,
        Some(Commands::Users(args)) => commands::users::run(&args).await,
        Some(Commands::Settings(args)) => commands::settings::run(&args).await,
        Some(Commands::Themes(args)) => commands::themes::run(&args).await,
        Some(Commands::Health(args)) => commands::health::run(&args).await,
    }
}
