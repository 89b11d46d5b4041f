//! Deposition Gateway
//!
//! Exposes a small local REST surface and forwards each call to an upstream
//! deposition API with the access token injected.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                 DEPOSIT GATEWAY                   │
//!                         │                                                   │
//!    Client Request       │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!    ─────────────────────┼─▶│  http   │──▶│ handlers │──▶│  translate   │   │
//!                         │  │ server  │   │ (bind)   │   │ (+token)     │   │
//!                         │  └─────────┘   └──────────┘   └──────┬───────┘   │
//!                         │                                      │           │
//!                         │                                      ▼           │
//!    Client Response      │  ┌──────────┐                 ┌──────────────┐   │
//!    ◀────────────────────┼──│normalize │◀────────────────│ client       │◀──┼──── Upstream
//!                         │  │          │                 │ read / write │   │     API
//!                         │  └──────────┘                 └──────────────┘   │
//!                         │                                                   │
//!                         │   config · observability · lifecycle              │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use deposit_gateway::config::loader::load_config;
use deposit_gateway::lifecycle::{startup, Shutdown};
use deposit_gateway::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "deposit-gateway")]
#[command(about = "Credential-injecting gateway for a deposition API", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    init_logging(&config.observability);

    tracing::info!(
        config = %args.config.display(),
        "deposit-gateway v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
