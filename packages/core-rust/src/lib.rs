//! Country Context Core — per-execution "current country" stack, registry, and name lookup.

pub mod config;
pub mod context;
mod countries;
pub mod error;
pub mod execution;
pub mod names;
pub mod registry;
pub mod stack;
pub mod types;

pub use config::{CountryContextConfig, DEFAULT_COUNTRY_ENV};
pub use context::{
    activate_country, deactivate_country, get_context_for_current_execution,
    get_current_country_code, get_current_country_name, global, install, scope, with_country,
    with_country_async, CountryContext, CountryGuard, CurrentStack,
};
pub use error::CountryContextError;
pub use execution::ExecutionId;
pub use names::{CountryNames, CountryTable};
pub use registry::ContextRegistry;
pub use stack::CountryContextStack;
pub use types::{CountryCode, CountryName};
