// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission-scoped request gate.
//!
//! Each endpoint names its required permission statically through a marker
//! type. The [`Permitted`] extractor runs [`Authenticated`] and then checks
//! the permission, so a handler taking `Permitted<P>` only executes once
//! the caller holds `P::NAME`.
//!
//! ```rust,ignore
//! async fn delete_booking(
//!     _: Permitted<DeleteBookings>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<DeletedResponse>, ApiError> { ... }
//! ```

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, Authenticated, VerifiedClaims};
use crate::state::AppState;

/// A permission string tied to an endpoint at compile time.
pub trait Permission {
    const NAME: &'static str;
}

macro_rules! permissions {
    ($($(#[$meta:meta])* $ty:ident => $name:literal),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $ty;

            impl Permission for $ty {
                const NAME: &'static str = $name;
            }
        )+
    };
}

permissions! {
    /// Read bookings, and therapist details including their bookings.
    GetBookings => "get:bookings",
    PostBookings => "post:bookings",
    PatchBookings => "patch:bookings",
    DeleteBookings => "delete:bookings",
    PostTherapists => "post:therapists",
    DeleteTherapists => "delete:therapists",
}

/// Require `permission` in the verified claims.
pub fn check_permission(claims: &VerifiedClaims, permission: &str) -> Result<(), AuthError> {
    if !claims.has_permissions_claim() {
        return Err(AuthError::PermissionsClaimMissing);
    }
    if !claims.has_permission(permission) {
        return Err(AuthError::PermissionDenied(permission.to_string()));
    }
    Ok(())
}

/// Extractor that requires the permission `P`.
pub struct Permitted<P> {
    pub claims: VerifiedClaims,
    permission: PhantomData<fn() -> P>,
}

impl<P: Permission> Permitted<P> {
    #[cfg(test)]
    pub(crate) fn granted(claims: VerifiedClaims) -> Self {
        Self {
            claims,
            permission: PhantomData,
        }
    }
}

impl<P: Permission> FromRequestParts<AppState> for Permitted<P> {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated(claims) = Authenticated::from_request_parts(parts, state).await?;

        check_permission(&claims, P::NAME).inspect_err(|e| {
            tracing::debug!(
                subject = %claims.subject,
                permission = P::NAME,
                code = e.error_code(),
                "Permission check failed"
            );
        })?;

        Ok(Self {
            claims,
            permission: PhantomData,
        })
    }
}
