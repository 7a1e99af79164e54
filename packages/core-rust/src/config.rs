use serde::{Deserialize, Serialize};

use crate::error::CountryContextError;
use crate::types::CountryCode;

/// Environment variable holding the default country code.
pub const DEFAULT_COUNTRY_ENV: &str = "DEFAULT_COUNTRY";

/// Configuration for a [`CountryContext`](crate::CountryContext).
///
/// No `Default` impl: the default country is a required deployment setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryContextConfig {
    /// Country every fresh execution context starts with.
    pub default_country: CountryCode,
}

impl CountryContextConfig {
    pub fn new(default_country: impl Into<CountryCode>) -> Self {
        Self {
            default_country: default_country.into(),
        }
    }

    /// Reads `DEFAULT_COUNTRY` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::MissingDefaultCountry`] if the variable is
    /// unset, not valid UTF-8, or blank.
    pub fn from_env() -> Result<Self, CountryContextError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::MissingDefaultCountry`] if the lookup
    /// yields nothing or only whitespace for `DEFAULT_COUNTRY`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CountryContextError> {
        let value =
            lookup(DEFAULT_COUNTRY_ENV).ok_or(CountryContextError::MissingDefaultCountry)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CountryContextError::MissingDefaultCountry);
        }
        Ok(Self::new(trimmed))
    }
}
