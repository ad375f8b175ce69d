mod args;
mod catalog;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use emf_config::Config;
use emf_errors::ErrorRegistry;
use emf_server::Server;
use tokio_util::sync::CancellationToken;

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    args.apply(&mut config);

    let _telemetry_guard = emf_telemetry::init(&config.telemetry)?;

    // Error templates are required before the listener binds
    let registry = load_registry(&config.errors.config_path)?;
    tracing::info!(
        errors = registry.len(),
        debug_mode = config.server.debug_mode,
        "error registry loaded"
    );

    let server = Server::new(&config, Arc::new(registry), catalog::router())?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_trigger = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_trigger.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("server stopped");

    Ok(())
}

fn load_registry(path: &Path) -> anyhow::Result<ErrorRegistry> {
    ErrorRegistry::load(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to load error templates");
        anyhow::anyhow!("cannot start without error templates from {}: {e}", path.display())
    })
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
