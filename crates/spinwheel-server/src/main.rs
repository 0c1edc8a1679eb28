//! Spinwheel room server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin spinwheel-server
//! cargo run --bin spinwheel-server -- --host 0.0.0.0 --port 5000
//! SPINWHEEL_EXPIRATION_SECS=60 cargo run --bin spinwheel-server
//! ```

use std::time::Duration;

use clap::Parser;
use spinwheel::logger::setup_logger;
use spinwheel::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "spinwheel-server")]
#[command(about = "Multiplayer wheel-of-fortune room server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "SPINWHEEL_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "SPINWHEEL_PORT", default_value_t = 5000)]
    port: u16,

    /// Seconds an empty room is kept before it is deleted
    #[arg(long, env = "SPINWHEEL_EXPIRATION_SECS", default_value_t = 1200)]
    expiration_secs: u64,

    /// Seconds of inbound silence before a connection is closed
    #[arg(long, env = "SPINWHEEL_IDLE_TIMEOUT_SECS", default_value_t = 1800)]
    idle_timeout_secs: u64,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, env = "SPINWHEEL_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn room_config(&self) -> RoomConfig {
        RoomConfig::with_expiration_delay(Duration::from_secs(self.expiration_secs))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let server = SpinwheelServer::builder()
        .bind(&args.bind_addr())
        .room_config(args.room_config())
        .idle_timeout(Duration::from_secs(args.idle_timeout_secs))
        .build()
        .await?;

    tracing::info!(
        addr = %server.local_addr()?,
        expiration_secs = args.expiration_secs,
        "Press Ctrl+C to shut down gracefully"
    );
    server.run_until(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        // Without a signal handler, keep serving until killed.
        std::future::pending::<()>().await;
    }
}
