//! Chat completion gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 CHAT GATEWAY                 │
//!                        │                                              │
//!     Client Request     │  ┌─────────┐   ┌──────────┐   ┌──────────┐  │
//!     ───────────────────┼─▶│  http   │──▶│  guards  │──▶│ upstream │──┼──▶ Provider
//!                        │  │ server  │   │route/auth│   │  client  │  │
//!                        │  └─────────┘   └──────────┘   └────┬─────┘  │
//!                        │                                    │        │
//!     Client Response    │  ┌──────────────────────────┐      │        │
//!     ◀──────────────────┼──│ relay + CORS headers     │◀─────┘        │
//!                        │  └──────────────────────────┘               │
//!                        │                                              │
//!                        │  config · observability · lifecycle          │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use chat_gateway::config::load_startup_config;
use chat_gateway::lifecycle::startup;
use chat_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "chat-gateway")]
#[command(about = "Authenticated forwarding gateway for chat completions", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_startup_config(args.config.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!("chat-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    startup::serve(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
