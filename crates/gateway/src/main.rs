use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use gacha_domain::config::Config;
use gacha_gateway::api;
use gacha_gateway::bootstrap;
use gacha_gateway::cli::{Cli, Command, ConfigCommand};
use gacha_gateway::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let (config, config_path) = gacha_gateway::cli::load_config()?;
            let tracer_provider = telemetry::init_tracing(&config.observability);
            let result = run_server(Arc::new(config), config_path).await;
            telemetry::shutdown(tracer_provider);
            result
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            telemetry::init_cli_tracing();
            let (config, config_path) = gacha_gateway::cli::load_config()?;
            let valid = gacha_gateway::cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = gacha_gateway::cli::load_config()?;
            gacha_gateway::cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("gachagate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Start the pull server with the given configuration.
async fn run_server(config: Arc<Config>, config_path: String) -> anyhow::Result<()> {
    tracing::info!(config = %config_path, "gachagate starting");

    // ── Build shared state & spawn background loops ──────────────────
    let state = bootstrap::build_app_state(config.clone())?;
    bootstrap::spawn_background_tasks(&state);

    // ── CORS layer (config-aware) ────────────────────────────────────
    let cors_layer = api::cors::cors_layer(&config.server.cors, &config.challenge.token_header);

    // ── Concurrency limit (backpressure protection) ────────────────
    let max_concurrent = config.server.max_concurrent_requests;
    tracing::info!(max_concurrent, "concurrency limit set");

    // ── Router ───────────────────────────────────────────────────────
    let mut router = api::router();
    match config.server.static_dir.as_deref() {
        Some(dir) if dir.exists() => {
            tracing::info!(dir = %dir.display(), "serving static files");
            router = router.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => {
            tracing::warn!(dir = %dir.display(), "static_dir not found, static files not served");
        }
        None => {}
    }
    let app = router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state);

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "gachagate listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("axum server error")?;

    tracing::info!("shutdown complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM, then return to trigger graceful shutdown of
/// the Axum server.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                let _ = ctrl_c.await;
                tracing::info!("received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }
}
