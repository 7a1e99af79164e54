//! Country lookup endpoints.

use axum::extract::{Path, State};
use axum::Json;
use country_context_core::{CountryCode, CountryContext, CountryContextError, CountryName};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::country::ApiError;

/// Code and display name of a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryResponse {
    pub code: CountryCode,
    pub name: CountryName,
}

impl CountryResponse {
    fn current(context: &CountryContext) -> Result<Self, CountryContextError> {
        Ok(Self {
            code: context.current_code(),
            name: context.current_name()?,
        })
    }
}

/// `GET /country` -- the country the request is running under.
///
/// # Errors
///
/// 500 when the request's country has no entry in the name table.
pub async fn current_country_handler(
    State(state): State<AppState>,
) -> Result<Json<CountryResponse>, ApiError> {
    Ok(Json(CountryResponse::current(state.country)?))
}

/// `GET /countries/{code}` -- name of an arbitrary country, looked up with
/// `code` temporarily active.
///
/// # Errors
///
/// 500 when `code` has no entry in the name table.
pub async fn country_by_code_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CountryResponse>, ApiError> {
    let context = state.country;
    let response = context.with_country(code, || CountryResponse::current(context))??;
    Ok(Json(response))
}
