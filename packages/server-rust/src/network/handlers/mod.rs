//! HTTP handler definitions for the country server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod country;
pub mod health;

pub use country::{country_by_code_handler, current_country_handler, CountryResponse};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use country_context_core::CountryContext;

use super::LifecycleController;

/// Shared application state passed to all axum handlers via `State` extraction.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide country context; also used by the request hooks.
    pub country: &'static CountryContext,
    /// Health state and shutdown signal.
    pub lifecycle: Arc<LifecycleController>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
