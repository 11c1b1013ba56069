use clap::{Parser, Subcommand};

mod commands;

use commands::{ServerArgs, StatusArgs};

#[derive(Parser)]
#[command(name = "compass")]
#[command(about = "Pre- and post-trade analytics for European bond venues", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard
    Server(ServerArgs),
    /// Print headline activity and the most traded ISINs for a reporting date
    Status(StatusArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Server(args) => commands::run_server(args).await?,
        Commands::Status(args) => commands::run_status(args).await?,
    }

    Ok(())
}
