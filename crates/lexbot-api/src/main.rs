//! Lexbot server entry point.
//!
//! Binary name: `lexbot`
//!
//! Parses CLI arguments, loads configuration from the environment, and
//! starts the WebSocket chat server.

mod http;
mod state;

use clap::{Parser, Subcommand};

use state::AppState;

#[derive(Parser)]
#[command(name = "lexbot", about = "Retrieval-augmented session-law chat server")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Export spans via OpenTelemetry (stdout exporter)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the WebSocket chat server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8080, env = "LEXBOT_PORT")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "info,lexbot=debug",
        _ => "trace",
    };
    lexbot_observe::tracing_setup::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))?;

    let result = run(cli.command).await;
    lexbot_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port } => {
            let state = AppState::init()?;
            let router = http::router::build_router(state);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(addr = %addr, "lexbot listening");

            axum::serve(listener, router).await?;
            Ok(())
        }
    }
}
