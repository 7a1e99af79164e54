//! Request entry/exit hooks for the country context.
//!
//! Each request runs as its own execution context: the service enters a fresh
//! task-local scope, activates the resolved (or default) country on the way
//! in, and deactivates it on the way out. Deactivation also happens when the
//! request future is dropped early, e.g. by the timeout layer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use country_context_core::CountryContext;
use tower::{Layer, Service};
use tracing::error;

use super::error::ApiError;
use super::resolver::CountryResolver;

// ---------------------------------------------------------------------------
// CountryContextLayer
// ---------------------------------------------------------------------------

/// Tower layer that binds every request to a country.
#[derive(Clone)]
pub struct CountryContextLayer {
    context: &'static CountryContext,
    resolver: Arc<dyn CountryResolver>,
}

impl CountryContextLayer {
    pub fn new(context: &'static CountryContext, resolver: Arc<dyn CountryResolver>) -> Self {
        Self { context, resolver }
    }
}

impl<S> Layer<S> for CountryContextLayer {
    type Service = CountryContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CountryContextService {
            inner,
            context: self.context,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

// ---------------------------------------------------------------------------
// CountryContextService
// ---------------------------------------------------------------------------

/// Service wrapper running the inner service under the request's country.
#[derive(Clone)]
pub struct CountryContextService<S> {
    inner: S,
    context: &'static CountryContext,
    resolver: Arc<dyn CountryResolver>,
}

impl<S> Service<Request<Body>> for CountryContextService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let code = self
            .resolver
            .resolve(req.uri(), req.headers())
            .unwrap_or_else(|| self.context.default_country().clone());

        // The ready clone stays with us; the one polled ready goes into the future.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let context = self.context;

        Box::pin(context.scope(async move {
            let guard = context.enter(code);
            let result = inner.call(req).await;
            match guard.exit() {
                Ok(_) => result,
                Err(err) => {
                    error!(error = %err, "request left the country context unbalanced");
                    Ok(ApiError(err).into_response())
                }
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
