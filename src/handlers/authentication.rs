// Authentication middleware for Transcritor API
//
// This module provides authentication middleware for the transcription service.
// It verifies that incoming requests have a valid Authorization header when enabled.
// OPTIONS requests are always allowed to support CORS pre-flight requests.
// Token issuance and user accounts live in a separate service; this layer only
// checks the bearer token itself.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header,
    Error,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use lazy_static::lazy_static;
use log::{debug, info, warn};
use std::env;

/// Default setting for authorization requirement
const DEFAULT_ENABLE_AUTHORIZATION: bool = true;

lazy_static! {
    /// Expected API token, read once at startup. When unset, any bearer
    /// token is accepted (development mode).
    static ref API_TOKEN: Option<String> = env::var("TRANSCRITOR_API_TOKEN").ok();
}

/// Helper function to check if authorization is enabled
fn is_authorization_enabled() -> bool {
    env::var("ENABLE_AUTHORIZATION")
        .ok()
        .and_then(|val| val.parse::<bool>().ok())
        .unwrap_or(DEFAULT_ENABLE_AUTHORIZATION)
}

/// Middleware factory for authentication
pub struct Authentication;

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let auth_enabled = is_authorization_enabled();
        if !auth_enabled {
            info!("Authentication requirement is disabled via configuration");
        }
        ok(AuthenticationMiddleware { service })
    }
}

/// Authentication middleware implementation
pub struct AuthenticationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Skip authentication for OPTIONS requests
        if req.method() == actix_web::http::Method::OPTIONS {
            debug!("OPTIONS request - bypassing authentication check");
            let fut = self.service.call(req);
            return Box::pin(async move {
                let res = fut.await?;
                Ok(res)
            });
        }

        if let Err(error) = authenticate(&req) {
            return Box::pin(async move { Err(error) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

/// Authenticate a request by checking the Authorization header
fn authenticate(req: &ServiceRequest) -> Result<(), Error> {
    if !is_authorization_enabled() {
        debug!("Authorization is disabled, allowing request without authentication");
        return Ok(());
    }

    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return validate_token(token);
            } else {
                warn!("Invalid Authorization header format, missing 'Bearer' prefix");
                return Err(ErrorUnauthorized(
                    "Invalid Authorization header format. Must be 'Bearer <token>'",
                ));
            }
        }
        warn!("Authorization header contains invalid characters");
        Err(ErrorUnauthorized("Invalid Authorization header"))
    } else {
        warn!("Missing Authorization header");
        Err(ErrorUnauthorized("Authorization header is required"))
    }
}

/// Validates a token against the configured API token
///
/// When no token is configured, any bearer token is accepted.
fn validate_token(token: &str) -> Result<(), Error> {
    match API_TOKEN.as_deref() {
        Some(expected) if expected != token => {
            warn!("Rejected request with invalid token");
            Err(ErrorUnauthorized("Invalid token"))
        }
        _ => Ok(()),
    }
}
