//! Network configuration types for the country server.

use std::time::Duration;

use axum::http::header::HeaderName;

use crate::country::DEFAULT_COUNTRY_HEADER;

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Bind address for the server.
    pub host: String,
    /// Port to listen on. 0 means OS-assigned.
    pub port: u16,
    /// Allowed CORS origins. `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Header browsers may send cross-origin to pick the request's country.
    pub country_header: HeaderName,
    /// Maximum time a request may take before it is cancelled with 408.
    pub request_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            country_header: HeaderName::from_static(DEFAULT_COUNTRY_HEADER),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl NetworkConfig {
    /// `host:port` string suitable for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
