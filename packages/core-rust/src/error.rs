use crate::types::CountryCode;

/// Errors raised by the country context.
///
/// `UnbalancedContext` and `UnknownCountry` signal caller bugs or data gaps
/// and are meant to propagate up to the surrounding framework's error path.
/// None of them are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CountryContextError {
    #[error("deactivate without a matching activate (current country: {current})")]
    UnbalancedContext { current: CountryCode },
    #[error("no country name registered for code '{code}'")]
    UnknownCountry { code: CountryCode },
    #[error("required setting DEFAULT_COUNTRY is not set")]
    MissingDefaultCountry,
    #[error("process-wide country context is already installed")]
    AlreadyInstalled,
    #[error("invalid country table: {0}")]
    InvalidTable(String),
}

impl From<serde_json::Error> for CountryContextError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidTable(err.to_string())
    }
}
