//! Command-line and environment configuration for the country server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use axum::http::header::HeaderName;
use clap::Parser;
use country_context_core::{CountryContextConfig, CountryContextError, CountryTable};

use crate::country::{
    ChainResolver, CountryResolver, HeaderResolver, QueryResolver, SubdomainResolver,
    DEFAULT_COUNTRY_HEADER,
};
use crate::network::NetworkConfig;

/// Serves the per-request country context over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(name = "country-server", version)]
pub struct ServerArgs {
    /// Bind address.
    #[arg(long, env = "COUNTRY_SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on (0 picks a free port).
    #[arg(long, env = "COUNTRY_SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Country used when a request does not name one.
    #[arg(long, env = "DEFAULT_COUNTRY")]
    pub default_country: String,

    /// Request header carrying the country code.
    #[arg(long, env = "COUNTRY_HEADER", default_value = DEFAULT_COUNTRY_HEADER)]
    pub country_header: String,

    /// Query parameter carrying the country code.
    #[arg(long, env = "COUNTRY_PARAM")]
    pub country_param: Option<String>,

    /// Base domain whose leftmost subdomain names the country.
    #[arg(long, env = "COUNTRY_BASE_DOMAIN")]
    pub base_domain: Option<String>,

    /// JSON object mapping country codes to names; the ISO 3166 table is used when absent.
    #[arg(long, env = "COUNTRIES_FILE")]
    pub countries_file: Option<PathBuf>,

    /// Seconds before an unfinished request is answered with 408.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Allowed CORS origin; repeat or comma-separate for several.
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "*"
    )]
    pub cors_origins: Vec<String>,

    /// Emit logs as JSON lines.
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl ServerArgs {
    /// # Errors
    ///
    /// Returns an error if `--country-header` is not a valid header name.
    pub fn network_config(&self) -> anyhow::Result<NetworkConfig> {
        Ok(NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            country_header: self.country_header_name()?,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }

    fn country_header_name(&self) -> anyhow::Result<HeaderName> {
        HeaderName::from_bytes(self.country_header.trim().as_bytes())
            .with_context(|| format!("invalid country header {:?}", self.country_header))
    }

    /// # Errors
    ///
    /// Returns [`CountryContextError::MissingDefaultCountry`] for a blank
    /// `--default-country`.
    pub fn context_config(&self) -> Result<CountryContextConfig, CountryContextError> {
        CountryContextConfig::from_lookup(|_| Some(self.default_country.clone()))
    }

    /// Builds the resolver chain: header first, then query parameter, then
    /// subdomain, each only when configured.
    ///
    /// # Errors
    ///
    /// Returns an error if `--country-header` is not a valid header name.
    pub fn resolver(&self) -> anyhow::Result<Arc<dyn CountryResolver>> {
        let header = self.country_header_name()?;
        let mut chain = ChainResolver::new().with(HeaderResolver::new(header));
        if let Some(param) = &self.country_param {
            chain = chain.with(QueryResolver::new(param.clone()));
        }
        if let Some(domain) = &self.base_domain {
            chain = chain.with(SubdomainResolver::new(domain));
        }
        Ok(Arc::new(chain))
    }

    /// Loads the country-name table.
    ///
    /// # Errors
    ///
    /// Returns an error if the countries file cannot be read or parsed.
    pub fn country_table(&self) -> anyhow::Result<CountryTable> {
        let Some(path) = &self.countries_file else {
            return Ok(CountryTable::iso3166());
        };
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read countries file {}", path.display()))?;
        let table = CountryTable::from_json(&json)
            .with_context(|| format!("failed to parse countries file {}", path.display()))?;
        Ok(table)
    }
}
