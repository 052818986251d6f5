// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::jwks::KeyResolutionError;
use crate::error::ApiError;

/// Claim that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidClaim {
    Audience,
    Issuer,
    Expiry,
    NotBefore,
    /// A required claim is absent.
    Missing(String),
}

impl fmt::Display for InvalidClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidClaim::Audience => write!(f, "aud"),
            InvalidClaim::Issuer => write!(f, "iss"),
            InvalidClaim::Expiry => write!(f, "exp"),
            InvalidClaim::NotBefore => write!(f, "nbf"),
            InvalidClaim::Missing(claim) => write!(f, "{claim}"),
        }
    }
}

/// Authentication error type.
///
/// Every variant maps to 401 except the permission failures, which map to
/// 403. Messages are fixed; key-resolution detail is only logged.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is expected")]
    MissingAuthHeader,
    /// Header is not exactly `<scheme> <token>`
    #[error("Authorization header must be in the form 'Bearer <token>'")]
    MalformedAuthHeader,
    /// Scheme is not `Bearer`
    #[error("Authorization header must start with 'Bearer'")]
    InvalidAuthScheme,
    /// Token cannot be decoded, or uses a disallowed algorithm
    #[error("Unable to parse authentication token")]
    MalformedToken,
    /// Signing key could not be resolved
    #[error("Unable to verify token")]
    VerificationFailed(#[source] KeyResolutionError),
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// A registered claim did not validate
    #[error("Token claim '{0}' is invalid")]
    InvalidClaims(InvalidClaim),
    /// Token carries no `permissions` claim at all
    #[error("Permissions not included in token")]
    PermissionsClaimMissing,
    /// Required permission not granted
    #[error("Permission '{0}' not granted")]
    PermissionDenied(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "authorization_header_missing",
            AuthError::MalformedAuthHeader => "invalid_header",
            AuthError::InvalidAuthScheme => "invalid_scheme",
            AuthError::MalformedToken => "malformed_token",
            AuthError::VerificationFailed(_) => "verification_failed",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::InvalidClaims(InvalidClaim::Expiry) => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::PermissionsClaimMissing => "permissions_missing",
            AuthError::PermissionDenied(_) => "forbidden",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::PermissionsClaimMissing | AuthError::PermissionDenied(_) => {
                StatusCode::FORBIDDEN
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
