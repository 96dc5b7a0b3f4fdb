//! Bearer token guard for the upload route

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

use crate::error::AppError;

/// Extract the token from an `Authorization` header value
///
/// The token is whatever follows the first space, so `Bearer abc` yields
/// `abc`. A header without a space or with nothing after it carries no token.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .split_once(' ')
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

/// Authentication layer
#[derive(Clone)]
pub struct BearerAuthLayer {
    secret: Option<Arc<str>>,
}

impl BearerAuthLayer {
    /// `None` rejects every token
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.map(Arc::from),
        }
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthMiddleware {
            inner,
            secret: self.secret.clone(),
        }
    }
}

/// Authentication middleware service
#[derive(Clone)]
pub struct BearerAuthMiddleware<S> {
    inner: S,
    secret: Option<Arc<str>>,
}

impl<S> BearerAuthMiddleware<S> {
    fn check(&self, request: &Request<Body>) -> Result<(), AppError> {
        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or(AppError::Unauthorized)?;

        match self.secret.as_deref() {
            Some(secret) if secret == token => Ok(()),
            _ => Err(AppError::Forbidden),
        }
    }
}

impl<S> Service<Request<Body>> for BearerAuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        match self.check(&request) {
            Ok(()) => {
                let future = self.inner.call(request);
                Box::pin(async move { future.await })
            }
            Err(err) => {
                warn!(path = %request.uri().path(), reason = %err, "Upload request not authorized");
                Box::pin(async move { Ok(err.into_response()) })
            }
        }
    }
}
