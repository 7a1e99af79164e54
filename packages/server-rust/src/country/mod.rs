//! Framework integration for the country context.
//!
//! - [`resolver`]: derives a country code from request data
//! - [`layer`]: Tower layer implementing the request entry/exit hooks
//! - [`error`]: maps country context failures to HTTP responses

pub mod error;
pub mod layer;
pub mod resolver;

pub use error::ApiError;
pub use layer::{CountryContextLayer, CountryContextService};
pub use resolver::{
    ChainResolver, CountryResolver, HeaderResolver, QueryResolver, SubdomainResolver,
    DEFAULT_COUNTRY_HEADER,
};
