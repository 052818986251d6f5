// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated callers.
//!
//! Use the `Authenticated` extractor in handlers to require a verified
//! bearer token:
//!
//! ```rust,ignore
//! async fn my_handler(Authenticated(claims): Authenticated) -> impl IntoResponse {
//!     // claims is VerifiedClaims
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
};

use super::{AuthError, VerifiedClaims};
use crate::state::AppState;

/// Pull the raw token out of an `Authorization` header value.
///
/// The value must be exactly `Bearer <token>`: two parts separated by a
/// single space, with a case-sensitive scheme.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let raw = header
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedAuthHeader)?;

    let parts: Vec<&str> = raw.split(' ').collect();
    let [scheme, token] = parts.as_slice() else {
        return Err(AuthError::MalformedAuthHeader);
    };
    if token.is_empty() {
        return Err(AuthError::MalformedAuthHeader);
    }
    if *scheme != "Bearer" {
        return Err(AuthError::InvalidAuthScheme);
    }
    Ok(*token)
}

/// Extractor for verified token claims.
///
/// Runs credential extraction and token verification. The claims are
/// cached in request extensions so that later extractors on the same
/// request reuse them.
///
/// # Example
///
/// ```rust,ignore
/// async fn whoami(Authenticated(claims): Authenticated) -> String {
///     claims.subject
/// }
/// ```
pub struct Authenticated(pub VerifiedClaims);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<VerifiedClaims>().cloned() {
            return Ok(Authenticated(claims));
        }

        let token = bearer_token(parts.headers.get(AUTHORIZATION)).inspect_err(|e| {
            tracing::debug!(code = e.error_code(), "Rejected authorization header");
        })?;

        let claims = state.verifier.verify(token).await.inspect_err(|e| {
            tracing::debug!(code = e.error_code(), error = %e, "Token verification failed");
        })?;

        parts.extensions.insert(claims.clone());
        Ok(Authenticated(claims))
    }
}
