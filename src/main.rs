mod api;
mod config;
mod core;
mod logger;
mod services;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::signal;
use tracing::{error, info};

use crate::services::summary::client::ChatCompletionsClient;
use crate::services::summary::types::ModelCandidates;
use crate::services::summary::SummaryService;

#[tokio::main]
async fn main() {
    let cfg = match config::Config::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Failed to load config: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = logger::init_logger(&cfg) {
        eprintln!("Failed to init logger: {err}");
        std::process::exit(1);
    }

    cfg.print();

    let Some(candidates) = ModelCandidates::new(cfg.models.clone()) else {
        error!("No candidate models configured");
        std::process::exit(1);
    };

    let client = match ChatCompletionsClient::new(
        cfg.groq_api_key.clone(),
        cfg.groq_base_url.clone(),
        cfg.request_timeout,
    ) {
        Ok(client) => client,
        Err(err) => {
            error!("Failed to build provider client: {err}");
            std::process::exit(1);
        }
    };

    let state = api::AppState::new(SummaryService::new(Arc::new(client), candidates));
    let app = api::router(state, &cfg.cors_origins);

    let ip: IpAddr = match cfg.host.parse() {
        Ok(ip) => ip,
        Err(_) => {
            error!("Invalid HOST: {}", cfg.host);
            std::process::exit(1);
        }
    };
    let addr = SocketAddr::new(ip, cfg.port);
    info!("Server running on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(err) => {
            error!("Failed to bind: {err}");
            std::process::exit(1);
        }
    };

    let server = axum::serve(listener, app);

    if let Err(err) = server.with_graceful_shutdown(shutdown_signal()).await {
        error!("Server error: {err}");
    }
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
