//! scholarscan server: HTTP API for PDF eligibility classification.
//!
//! Thin axum server wrapping the shared scholarscan_lib extraction and
//! classification layer.
//!
//! Usage:
//!   SCHOLARSCAN_BIND=127.0.0.1:8000 scholarscan-server
//!
//! Or with args:
//!   scholarscan-server --config /path/to/settings.json --bind 0.0.0.0:8000

use scholarscan_lib::http_server::{self, AppState};
use scholarscan_lib::settings::Settings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse simple args (no clap to keep binary small)
    let args: Vec<String> = std::env::args().collect();
    let mut config_arg: Option<PathBuf> = None;
    let mut bind_arg: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                config_arg = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--bind" if i + 1 < args.len() => {
                bind_arg = Some(args[i + 1].clone());
                i += 2;
            }
            "--help" | "-h" => {
                println!("scholarscan-server: PDF eligibility classification HTTP API");
                println!();
                println!("Usage: scholarscan-server [--config PATH] [--bind ADDR:PORT]");
                println!();
                println!("Environment variables:");
                println!("  SCHOLARSCAN_CONFIG     Settings file path");
                println!("  SCHOLARSCAN_BIND       Bind address (default: 0.0.0.0:8000)");
                println!("  SCHOLARSCAN_STRATEGY   keyword | model");
                println!("  SCHOLARSCAN_MODEL_URL  Model generate endpoint");
                println!("  SCHOLARSCAN_MODEL      Model name");
                std::process::exit(0);
            }
            _ => { i += 1; }
        }
    }

    let (settings, config_path) = match Settings::resolve(config_arg.as_deref()) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("[Server] {}", e);
            std::process::exit(1);
        }
    };

    match &config_path {
        Some(p) => tracing::info!("[Server] Settings: {}", p.display()),
        None => tracing::info!("[Server] Settings: defaults"),
    }

    let bind_addr = bind_arg.unwrap_or_else(|| settings.bind.clone());
    tracing::info!("[Server] Strategy: {}", settings.strategy);
    tracing::info!("[Server] Binding to: {}", bind_addr);

    let state = match AppState::from_settings(settings) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("[Server] Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = http_server::serve(state, &bind_addr).await {
        tracing::error!("[Server] Server error: {}", e);
        std::process::exit(1);
    }
}
