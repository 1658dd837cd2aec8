//! Ragwise CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP API server
//! - `chat`: Interactive chat or single-message mode
//! - `filters`: Show the metadata filters extracted from a query
//! - `config`: Print the default configuration

use clap::{Parser, Subcommand};

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "ragwise",
    about = "Ragwise: retrieval-augmented enterprise knowledge assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the knowledge assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Conversation thread to continue
        #[arg(short, long, default_value = "default")]
        thread: String,

        /// Print stream events instead of the final reply
        #[arg(long)]
        stream: bool,
    },

    /// Show the metadata filters extracted from a query
    Filters {
        /// The query to analyze
        query: String,
    },

    /// Print the default configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat {
            message,
            thread,
            stream,
        } => commands::chat::run(message, thread, stream).await?,
        Commands::Filters { query } => commands::filters::run(&query)?,
        Commands::Config => commands::config_cmd::print_default(),
    }

    Ok(())
}
