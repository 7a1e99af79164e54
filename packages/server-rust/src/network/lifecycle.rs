//! Server lifecycle state reported by the health probes.
//!
//! Uses `ArcSwap` for lock-free state transitions.

use std::sync::Arc;

use arc_swap::ArcSwap;

/// Server health state.
///
/// State machine: Starting -> Ready -> Draining -> Stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Listener not yet serving.
    Starting,
    /// Serving requests.
    Ready,
    /// Shutdown requested; in-flight requests are finishing.
    Draining,
    /// Server loop has exited.
    Stopped,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        }
    }
}

/// Tracks the health state across startup, serving and shutdown.
#[derive(Debug)]
pub struct LifecycleController {
    state: ArcSwap<HealthState>,
}

impl LifecycleController {
    /// Creates a controller in the `Starting` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(HealthState::Starting),
        }
    }

    pub fn set_ready(&self) {
        self.state.store(Arc::new(HealthState::Ready));
    }

    /// Moves to `Draining`; readiness fails from here on.
    pub fn set_draining(&self) {
        self.state.store(Arc::new(HealthState::Draining));
    }

    pub fn set_stopped(&self) {
        self.state.store(Arc::new(HealthState::Stopped));
    }

    #[must_use]
    pub fn health_state(&self) -> HealthState {
        **self.state.load()
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}
