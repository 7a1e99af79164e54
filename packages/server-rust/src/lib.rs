//! Country Context Server — axum request hooks binding each request to a country.

pub mod config;
pub mod country;
pub mod network;
pub mod telemetry;

pub use config::ServerArgs;
pub use country::{ApiError, CountryContextLayer, CountryResolver};
pub use network::{NetworkConfig, NetworkModule};
