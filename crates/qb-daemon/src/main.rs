//! qb-daemon entry point.
//!
//! Thin: loads config, sets up tracing, starts the board runtime and serves
//! the HTTP surface until ctrl-c. Route handlers live in `routes.rs`; shared
//! state in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use qb_board::BoardState;
use qb_config::{
    load_layered_yaml, report_unused_keys, resolve_cookie, BoardConfig, ConfigConsumer,
    UnusedKeyPolicy,
};
use qb_daemon::{routes, state};
use qb_runtime::{BoardRuntime, Publisher, Sources, DEFAULT_BUS_CAPACITY};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

/// Comma-separated YAML paths in merge order.
const CONFIG_ENV: &str = "QB_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/board.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths_from_env();
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    let unused = report_unused_keys(
        ConfigConsumer::Daemon,
        &loaded.config_json,
        UnusedKeyPolicy::Warn,
    )?;
    if !unused.is_clean() {
        warn!(keys = ?unused.unused_leaf_pointers, "unused config keys");
    }
    let cfg = BoardConfig::from_config_json(&loaded.config_json)?;
    let cookie = resolve_cookie(&cfg);
    info!(
        config_hash = %loaded.config_hash,
        backend = %cfg.backend_url,
        cookie = cookie.is_present(),
        "config loaded"
    );

    let http = reqwest::Client::builder()
        .build()
        .context("http client build failed")?;
    let publisher = Publisher::new(BoardState::new().view(), DEFAULT_BUS_CAPACITY);
    let runtime = BoardRuntime::spawn(Sources::connect(http, &cfg, &cookie), publisher.clone());

    let shared = Arc::new(state::AppState::new(publisher.clone(), Some(loaded.config_hash)));
    let heartbeat = state::spawn_heartbeat(publisher.bus(), Duration::from_secs(1));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr: SocketAddr = cfg
        .daemon_bind
        .parse()
        .with_context(|| format!("invalid daemon.bind: {}", cfg.daemon_bind))?;
    info!("qb-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    heartbeat.abort();
    runtime.shutdown().await;
    info!("qb-daemon stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn config_paths_from_env() -> Vec<String> {
    match std::env::var(CONFIG_ENV) {
        Ok(v) if !v.trim().is_empty() => v
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![DEFAULT_CONFIG_PATH.to_string()],
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler failed; shutting down");
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers(tower_http::cors::Any)
}
