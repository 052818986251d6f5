// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified, request-scoped claims object.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::InvalidClaim;

/// `aud` is either a single string or an array of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    fn into_vec(self) -> Vec<String> {
        match self {
            Audience::One(aud) => vec![aud],
            Audience::Many(auds) => auds,
        }
    }
}

/// Claims decoded from a bearer token.
///
/// Registered claims are optional here so that an absent one reaches
/// `jsonwebtoken`'s required-claim check instead of failing deserialization.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenClaims {
    /// Subject
    #[serde(default)]
    pub sub: Option<String>,
    /// Issuer
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience
    #[serde(default)]
    pub aud: Option<Audience>,
    /// Expiration timestamp
    #[serde(default)]
    pub exp: Option<i64>,
    /// Not before timestamp (optional)
    #[serde(default)]
    #[allow(dead_code)]
    pub nbf: Option<i64>,
    /// Granted permission strings. `None` when the claim is absent.
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

static NO_PERMISSIONS: LazyLock<BTreeSet<String>> = LazyLock::new(BTreeSet::new);

/// Claims of a token whose signature, issuer, audience and expiry have
/// been verified.
///
/// Built once per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub subject: String,
    pub issuer: String,
    pub audience: Vec<String>,
    pub expires_at: DateTime<Utc>,
    permissions: Option<BTreeSet<String>>,
}

impl VerifiedClaims {
    pub(crate) fn from_token(claims: TokenClaims) -> Result<Self, InvalidClaim> {
        let missing = |claim: &str| InvalidClaim::Missing(claim.to_string());
        let exp = claims.exp.ok_or_else(|| missing("exp"))?;
        Ok(Self {
            subject: claims.sub.ok_or_else(|| missing("sub"))?,
            issuer: claims.iss.ok_or_else(|| missing("iss"))?,
            audience: claims.aud.ok_or_else(|| missing("aud"))?.into_vec(),
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC),
            permissions: claims.permissions.map(|p| p.into_iter().collect()),
        })
    }

    /// Granted permissions. Empty when the claim is absent.
    pub fn permissions(&self) -> &BTreeSet<String> {
        self.permissions.as_ref().unwrap_or(&NO_PERMISSIONS)
    }

    /// Whether the token carried a `permissions` claim at all.
    pub fn has_permissions_claim(&self) -> bool {
        self.permissions.is_some()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions().contains(permission)
    }

    #[cfg(test)]
    pub(crate) fn for_test(permissions: Option<&[&str]>) -> Self {
        Self {
            subject: "auth0|tester".to_string(),
            issuer: "https://issuer.test/".to_string(),
            audience: vec!["bookings".to_string()],
            expires_at: Utc::now() + chrono::Duration::hours(1),
            permissions: permissions.map(|p| p.iter().map(|s| s.to_string()).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: serde_json::Value) -> TokenClaims {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn audience_accepts_string_or_array() {
        let single = decode(serde_json::json!({
            "sub": "u", "iss": "i", "aud": "bookings", "exp": 1
        }));
        assert_eq!(single.aud.unwrap().into_vec(), vec!["bookings"]);

        let many = decode(serde_json::json!({
            "sub": "u", "iss": "i", "aud": ["a", "bookings"], "exp": 1
        }));
        assert_eq!(many.aud.unwrap().into_vec(), vec!["a", "bookings"]);
    }

    #[test]
    fn absent_registered_claims_still_deserialize() {
        let claims = decode(serde_json::json!({"iss": "i", "aud": "bookings", "exp": 1}));
        assert!(claims.sub.is_none());

        match VerifiedClaims::from_token(claims) {
            Err(InvalidClaim::Missing(claim)) => assert_eq!(claim, "sub"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn absent_permissions_claim_is_flagged() {
        let claims = VerifiedClaims::from_token(decode(serde_json::json!({
            "sub": "u", "iss": "i", "aud": "bookings", "exp": 1_800_000_000
        })))
        .unwrap();
        assert!(!claims.has_permissions_claim());
        assert!(claims.permissions().is_empty());
        assert!(!claims.has_permission("get:bookings"));
    }

    #[test]
    fn empty_permissions_claim_is_present() {
        let claims = VerifiedClaims::from_token(decode(serde_json::json!({
            "sub": "u", "iss": "i", "aud": "bookings", "exp": 1_800_000_000,
            "permissions": []
        })))
        .unwrap();
        assert!(claims.has_permissions_claim());
        assert!(claims.permissions().is_empty());
    }

    #[test]
    fn permissions_are_deduplicated() {
        let claims = VerifiedClaims::from_token(decode(serde_json::json!({
            "sub": "u", "iss": "i", "aud": "bookings", "exp": 1_800_000_000,
            "permissions": ["get:bookings", "post:bookings", "get:bookings"]
        })))
        .unwrap();
        assert_eq!(claims.permissions().len(), 2);
        assert!(claims.has_permission("post:bookings"));
        assert_eq!(claims.expires_at.timestamp(), 1_800_000_000);
    }
}
