//! Jean-O-Type Studio
//!
//! Upload a model and a photo of jeans to find out which style they are,
//! then compare how each style has trended over the years.
//! Served by a synchronous tiny_http server; no JavaScript frameworks required.
//!
//! Run with:
//!   cargo run --release -- --assets-dir . --trends-dir trends/trends_dropdown
//! Then open http://127.0.0.1:7878
//!
//! Pages:
//!   1. Jean-O-Type: upload a model + image, get the top-2 styles
//!   2. Trends:      overlay monthly popularity for selected styles

mod state;
mod render;
mod routes;
mod handlers;
mod util;

use std::sync::Arc;

use anyhow::anyhow;
use clap::Parser;
use log::info;
use tiny_http::Server;

use state::{StudioConfig, StudioState};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = StudioConfig::parse();
    let server = Server::http(config.addr.as_str())
        .map_err(|e| anyhow!("failed to bind HTTP server on {}: {}", config.addr, e))?;

    println!("╔══════════════════════════════════════════════╗");
    println!("║          Jean-O-Type Studio                  ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Open in your browser:                       ║");
    println!("║  http://{:<37}║", config.addr);
    println!("╚══════════════════════════════════════════════╝");

    info!("assets: {}, trends: {}", config.assets_dir.display(), config.trends_dir.display());
    if !config.assets_dir.join("dino_pics").is_dir() {
        log::warn!("{} has no dino_pics/ directory; results will show placeholders",
                   config.assets_dir.display());
    }

    let shared_state = Arc::new(StudioState::new(config));

    // Each request is dispatched on its own thread so a slow model upload or
    // inference does not stall other page loads.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }

    Ok(())
}
