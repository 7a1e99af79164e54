//! Networking types, configuration, routing, and lifecycle control.

pub mod config;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod module;

pub use config::*;
pub use handlers::AppState;
pub use lifecycle::*;
pub use module::NetworkModule;
