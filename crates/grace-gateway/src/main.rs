//! Grace Gateway Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p grace-gateway
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use grace_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        port = config.gateway.server.port,
        redis = config.redis.is_some(),
        "Starting Grace Gateway Server..."
    );

    if let Err(e) = grace_gateway::run(config).await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}
