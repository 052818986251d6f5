// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! This module provides bearer token authentication and permission checks
//! for the bookings API.
//!
//! ## Auth Flow
//!
//! 1. Client obtains an access token from the issuer
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. Server:
//!    - Extracts the token from the header
//!    - Resolves the signing key by `kid` from the issuer's JWKS
//!    - Verifies signature, expiry, issuer and audience
//!    - Checks the endpoint's permission against the `permissions` claim
//!
//! ## Security
//!
//! - Only RS256 tokens are accepted; `none` and symmetric algorithms are rejected
//! - JWKS is cached with TTL and refetched once on unknown key ids
//! - Key resolution detail is logged, never returned to the client

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod permission;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use claims::VerifiedClaims;
pub use error::{AuthError, InvalidClaim};
pub use extractor::{bearer_token, Authenticated};
pub use jwks::{JwksManager, KeyResolutionError, SigningKey};
pub use permission::{
    check_permission, DeleteBookings, DeleteTherapists, GetBookings, PatchBookings, Permission,
    Permitted, PostBookings, PostTherapists,
};
pub use verifier::TokenVerifier;
