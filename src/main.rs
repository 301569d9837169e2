//! Mrag CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mrag::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone();

    let result = match cli.command {
        Commands::Init(args) => mrag::cli::commands::init::execute(args, cli.json).await,
        Commands::Index(args) => {
            mrag::cli::commands::index::execute(args, config_path.as_deref(), cli.json).await
        }
        Commands::Query(args) => {
            mrag::cli::commands::query::execute(args, config_path.as_deref(), cli.json).await
        }
        Commands::Stats(args) => mrag::cli::commands::stats::execute(args, cli.json).await,
        Commands::Store(command) => {
            mrag::cli::commands::store::execute(command, config_path.as_deref(), cli.json).await
        }
    };

    if let Err(err) = result {
        mrag::cli::handle_error(&err, cli.json);
    }
}
