//! Tsunagi message router server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-server
//! cargo run --bin tsunagi-server -- --host 0.0.0.0 --port 3000 --persist
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use tsunagi_server::{
    infrastructure::{dto::conversion::JsonMessageCodec, store::InMemoryMessageStore},
    router::{
        DEFAULT_OUTBOX_CAPACITY, DEFAULT_PING_PERIOD, DEFAULT_PONG_WAIT, DEFAULT_WRITE_WAIT,
        MessageRouter, RouterConfig,
    },
    ui::Server,
};
use tsunagi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsunagi-server")]
#[command(about = "Real-time WebSocket message router", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Interval between pings sent to each client
    #[arg(long, default_value_t = DEFAULT_PING_PERIOD.as_secs())]
    ping_period_secs: u64,

    /// How long a client may stay silent before it is disconnected
    #[arg(long, default_value_t = DEFAULT_PONG_WAIT.as_secs())]
    pong_wait_secs: u64,

    /// Deadline for a single write to a client
    #[arg(long, default_value_t = DEFAULT_WRITE_WAIT.as_secs())]
    write_wait_secs: u64,

    /// Messages buffered per client before it is treated as too slow
    #[arg(long, default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    outbox_capacity: usize,

    /// Keep routed messages and read receipts in memory
    #[arg(long)]
    persist: bool,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match RouterConfig::new(
        Duration::from_secs(args.ping_period_secs),
        Duration::from_secs(args.pong_wait_secs),
        Duration::from_secs(args.write_wait_secs),
        args.outbox_capacity,
    ) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let mut router = MessageRouter::new(config, Arc::new(JsonMessageCodec));
    if args.persist {
        tracing::info!("In-memory message store enabled");
        router = router.with_store(Arc::new(InMemoryMessageStore::new()));
    }

    let server = Server::new(router);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
