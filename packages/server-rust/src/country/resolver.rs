//! Strategies for deriving a country code from an inbound request.
//!
//! A resolver only proposes a code. When every resolver declines, the
//! request runs under the configured default country.

use std::sync::Arc;

use axum::http::header::{HeaderName, HOST};
use axum::http::{HeaderMap, Uri};
use country_context_core::CountryCode;

/// Header consulted by [`HeaderResolver::default`].
pub const DEFAULT_COUNTRY_HEADER: &str = "x-country-code";

/// Derives a country code from request data.
pub trait CountryResolver: Send + Sync {
    /// Returns the country the request targets, or `None` to fall back to the default.
    fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> Option<CountryCode>;
}

impl<T: CountryResolver + ?Sized> CountryResolver for Arc<T> {
    fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> Option<CountryCode> {
        (**self).resolve(uri, headers)
    }
}

impl<T: CountryResolver + ?Sized> CountryResolver for Box<T> {
    fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> Option<CountryCode> {
        (**self).resolve(uri, headers)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

// ---------------------------------------------------------------------------
// HeaderResolver
// ---------------------------------------------------------------------------

/// Reads the code verbatim (trimmed) from a request header.
#[derive(Debug, Clone)]
pub struct HeaderResolver {
    header: HeaderName,
}

impl HeaderResolver {
    #[must_use]
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for HeaderResolver {
    fn default() -> Self {
        Self::new(HeaderName::from_static(DEFAULT_COUNTRY_HEADER))
    }
}

impl CountryResolver for HeaderResolver {
    fn resolve(&self, _uri: &Uri, headers: &HeaderMap) -> Option<CountryCode> {
        let value = headers.get(&self.header)?.to_str().ok()?;
        non_blank(value).map(CountryCode::from)
    }
}

// ---------------------------------------------------------------------------
// QueryResolver
// ---------------------------------------------------------------------------

/// Reads the code from a query parameter, e.g. `?country=EG`.
///
/// Values are taken as-is without percent-decoding.
#[derive(Debug, Clone)]
pub struct QueryResolver {
    param: String,
}

impl QueryResolver {
    pub fn new(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
        }
    }
}

impl CountryResolver for QueryResolver {
    fn resolve(&self, uri: &Uri, _headers: &HeaderMap) -> Option<CountryCode> {
        uri.query()?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == self.param)
            .and_then(|(_, value)| non_blank(value))
            .map(CountryCode::from)
    }
}

// ---------------------------------------------------------------------------
// SubdomainResolver
// ---------------------------------------------------------------------------

/// Maps `eg.example.com` to `EG` for base domain `example.com`.
///
/// Only the label directly left of the base domain counts, so
/// `www.eg.example.com` also resolves to `EG`. The label is uppercased.
#[derive(Debug, Clone)]
pub struct SubdomainResolver {
    suffix: String,
}

impl SubdomainResolver {
    pub fn new(base_domain: impl AsRef<str>) -> Self {
        let base = base_domain.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
        Self {
            suffix: format!(".{base}"),
        }
    }
}

impl CountryResolver for SubdomainResolver {
    fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> Option<CountryCode> {
        let host = headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| uri.host())?;
        let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
        let prefix = host.strip_suffix(&self.suffix)?;
        let label = prefix.rsplit('.').next().and_then(non_blank)?;
        Some(CountryCode::new(label.to_ascii_uppercase()))
    }
}

// ---------------------------------------------------------------------------
// ChainResolver
// ---------------------------------------------------------------------------

/// Tries resolvers in order; the first one that yields a code wins.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn CountryResolver>>,
}

impl ChainResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, resolver: impl CountryResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl CountryResolver for ChainResolver {
    fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> Option<CountryCode> {
        self.resolvers.iter().find_map(|r| r.resolve(uri, headers))
    }
}

impl std::fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainResolver")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
