#![allow(clippy::must_use_candidate)]

mod context;
mod params;
mod response;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Extension, Router};
use emf_config::Config;
use emf_errors::ErrorRegistry;
use tower_http::trace::TraceLayer;

pub use context::{DEBUG_QUERY_PARAM, ErrorContextSettings, RequestErrors, error_context_middleware};
pub use params::{Paginated, Pagination, ParamError, PathParamChecker, path_param_middleware};
pub use response::ErrorResponse;

/// Assembled server with routes and the error pipeline
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Wrap service routes with the error context, parameter checks, and tracing
    ///
    /// # Errors
    ///
    /// Returns an error if the configured path parameter pattern is invalid
    pub fn new(config: &Config, registry: Arc<ErrorRegistry>, routes: Router) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let checker = params::PathParamChecker::from_config(&config.api)
            .map_err(|e| anyhow::anyhow!("invalid path parameter pattern: {e}"))?;
        let routes = with_path_param_check(routes, checker);

        let mut app = Router::new()
            .route("/health", axum::routing::get(|| async { "ok" }))
            .merge(routes);

        // Apply middleware layers (innermost first)

        app = app.layer(Extension(config.api.clone()));

        let settings = ErrorContextSettings::from_config(config, registry);
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            let settings = settings.clone();
            async move { context::error_context_middleware(settings, req, next).await }
        }));

        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

/// Reject requests to `router`'s routes whose path parameters fail `checker`
pub fn with_path_param_check(router: Router, checker: PathParamChecker) -> Router {
    router.route_layer(axum::middleware::from_fn(move |req, next| {
        let checker = checker.clone();
        async move { params::path_param_middleware(checker, req, next).await }
    }))
}
