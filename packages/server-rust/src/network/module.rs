//! Network module with deferred startup lifecycle.
//!
//! `new()` creates resources, `start()` binds the TCP listener, and `serve()`
//! starts accepting connections.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use country_context_core::CountryContext;
use tokio::net::TcpListener;
use tracing::info;

use super::config::NetworkConfig;
use super::handlers::{
    country_by_code_handler, current_country_handler, health_handler, liveness_handler,
    readiness_handler, AppState,
};
use super::lifecycle::LifecycleController;
use super::middleware::build_http_layers;
use crate::country::{CountryContextLayer, CountryResolver};

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state
/// 2. `start()` -- binds TCP listener to the configured address
/// 3. `serve()` -- accepts connections until shutdown is signalled
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    country: &'static CountryContext,
    resolver: Arc<dyn CountryResolver>,
    lifecycle: Arc<LifecycleController>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        country: &'static CountryContext,
        resolver: Arc<dyn CountryResolver>,
    ) -> Self {
        Self {
            config,
            listener: None,
            country,
            resolver,
            lifecycle: Arc::new(LifecycleController::new()),
        }
    }

    /// Returns a shared reference to the lifecycle controller.
    #[must_use]
    pub fn lifecycle(&self) -> Arc<LifecycleController> {
        Arc::clone(&self.lifecycle)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health` -- detailed health JSON
    /// - `GET /health/live` -- liveness probe
    /// - `GET /health/ready` -- readiness probe
    /// - `GET /country` -- the request's country
    /// - `GET /countries/{code}` -- lookup of any country code
    pub fn build_router(&self) -> Router {
        let state = AppState {
            country: self.country,
            lifecycle: Arc::clone(&self.lifecycle),
            start_time: Instant::now(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .route("/country", get(current_country_handler))
            .route("/countries/{code}", get(country_by_code_handler))
            .layer(CountryContextLayer::new(
                self.country,
                Arc::clone(&self.resolver),
            ))
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured one
    /// when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves connections until `shutdown` resolves, then lets in-flight
    /// requests finish.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();
        let lifecycle = Arc::clone(&self.lifecycle);
        let draining = Arc::clone(&self.lifecycle);

        lifecycle.set_ready();
        info!("Serving HTTP connections");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Shutdown requested, draining requests");
                draining.set_draining();
            })
            .await?;

        lifecycle.set_stopped();
        info!("Server stopped");
        Ok(())
    }
}
