// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the issuer's signing keys.

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};

use super::claims::{TokenClaims, VerifiedClaims};
use super::error::{AuthError, InvalidClaim};
use super::jwks::JwksManager;
use crate::config::AuthSettings;

/// Verifies signature, issuer, audience and expiry of bearer tokens.
pub struct TokenVerifier {
    keys: JwksManager,
    issuer: String,
    audience: String,
    /// Only this asymmetric algorithm is accepted
    algorithm: Algorithm,
    /// Clock skew tolerance in seconds
    leeway: u64,
}

impl TokenVerifier {
    pub fn new(keys: JwksManager, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm: Algorithm::RS256,
            leeway: 0,
        }
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Build a verifier backed by the remote JWKS endpoint in `settings`.
    pub fn from_settings(settings: &AuthSettings) -> reqwest::Result<Self> {
        let keys = JwksManager::new(settings.jwks_url.clone(), settings.fetch_timeout)?
            .with_cache_ttl(settings.cache_ttl);
        Ok(Self::new(keys, &settings.issuer, &settings.audience).with_leeway(settings.leeway))
    }

    pub fn keys(&self) -> &JwksManager {
        &self.keys
    }

    /// Verify a raw token and return its claims.
    pub async fn verify(&self, token: &str) -> Result<VerifiedClaims, AuthError> {
        // Decode header to get kid (key ID)
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != self.algorithm {
            tracing::debug!(alg = ?header.alg, "Rejected token with unexpected algorithm");
            return Err(AuthError::MalformedToken);
        }
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let key = self.keys.get_signing_key(&kid).await.map_err(|e| {
            tracing::warn!(kid = %kid, error = %e, "Signing key resolution failed");
            AuthError::VerificationFailed(e)
        })?;
        if key.algorithm != header.alg {
            return Err(AuthError::InvalidSignature);
        }

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = decode::<TokenClaims>(token, &key.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => AuthError::InvalidClaims(InvalidClaim::Expiry),
                ErrorKind::ImmatureSignature => AuthError::InvalidClaims(InvalidClaim::NotBefore),
                ErrorKind::InvalidIssuer => AuthError::InvalidClaims(InvalidClaim::Issuer),
                ErrorKind::InvalidAudience => AuthError::InvalidClaims(InvalidClaim::Audience),
                ErrorKind::MissingRequiredClaim(claim) => {
                    AuthError::InvalidClaims(InvalidClaim::Missing(claim.clone()))
                }
                _ => AuthError::MalformedToken,
            })?;

        let claims =
            VerifiedClaims::from_token(token_data.claims).map_err(AuthError::InvalidClaims)?;

        // `exp` must lie strictly in the future
        let now = chrono::Utc::now().timestamp();
        let leeway = i64::try_from(self.leeway).unwrap_or(i64::MAX);
        if claims.expires_at.timestamp().saturating_add(leeway) <= now {
            return Err(AuthError::InvalidClaims(InvalidClaim::Expiry));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::KeyResolutionError;
    use crate::auth::testing::{now, test_verifier, unsigned_token, TokenBuilder, TEST_AUDIENCE};
    use serde_json::json;

    #[tokio::test]
    async fn valid_token_yields_exact_permissions() {
        let token = TokenBuilder::new()
            .permissions(&["get:bookings", "post:bookings"])
            .build();

        let claims = test_verifier().verify(&token).await.unwrap();
        let granted: Vec<&str> = claims.permissions().iter().map(String::as_str).collect();
        assert_eq!(granted, vec!["get:bookings", "post:bookings"]);
        assert_eq!(claims.subject, "auth0|tester");
        assert_eq!(claims.audience, vec![TEST_AUDIENCE]);
        assert!(claims.has_permissions_claim());
    }

    #[tokio::test]
    async fn token_without_permissions_claim_still_verifies() {
        let token = TokenBuilder::new().build();
        let claims = test_verifier().verify(&token).await.unwrap();
        assert!(!claims.has_permissions_claim());
    }

    #[tokio::test]
    async fn unknown_kid_fails_verification() {
        let token = TokenBuilder::new().kid(Some("rotated-away")).build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(
            result,
            Err(AuthError::VerificationFailed(KeyResolutionError::KeyNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn missing_kid_is_malformed() {
        let token = TokenBuilder::new().kid(None).build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn signature_from_other_key_is_rejected() {
        let token = TokenBuilder::new().signing_key(1).build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let result = test_verifier().verify("not-a-token").await;
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[tokio::test]
    async fn symmetric_and_none_algorithms_are_rejected() {
        let claims = json!({
            "iss": crate::auth::testing::TEST_ISSUER,
            "sub": "auth0|tester",
            "aud": TEST_AUDIENCE,
            "exp": now() + 3600,
        });
        for alg in ["HS256", "none"] {
            let result = test_verifier().verify(&unsigned_token(alg, &claims)).await;
            assert!(matches!(result, Err(AuthError::MalformedToken)), "alg {alg}");
        }
    }

    #[tokio::test]
    async fn expired_token_names_exp() {
        let token = TokenBuilder::new().expires_in(-120).build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidClaims(InvalidClaim::Expiry))
        ));
    }

    #[tokio::test]
    async fn expiry_at_now_is_rejected() {
        let token = TokenBuilder::new().expires_in(0).build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidClaims(InvalidClaim::Expiry))
        ));
    }

    #[tokio::test]
    async fn leeway_tolerates_recent_expiry() {
        let token = TokenBuilder::new().expires_in(-5).build();
        let verifier = test_verifier().with_leeway(60);
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_audience_names_aud() {
        let token = TokenBuilder::new().claim("aud", json!("other-api")).build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidClaims(InvalidClaim::Audience))
        ));
    }

    #[tokio::test]
    async fn audience_array_containing_expected_is_accepted() {
        let token = TokenBuilder::new()
            .claim("aud", json!(["other-api", TEST_AUDIENCE]))
            .build();
        assert!(test_verifier().verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_issuer_names_iss() {
        let token = TokenBuilder::new()
            .claim("iss", json!("https://evil.test/"))
            .build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidClaims(InvalidClaim::Issuer))
        ));
    }

    #[tokio::test]
    async fn future_nbf_names_nbf() {
        let token = TokenBuilder::new().claim("nbf", json!(now() + 600)).build();
        let result = test_verifier().verify(&token).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidClaims(InvalidClaim::NotBefore))
        ));
    }

    #[tokio::test]
    async fn missing_subject_is_reported() {
        let token = TokenBuilder::new().without("sub").build();
        let result = test_verifier().verify(&token).await;
        match result {
            Err(AuthError::InvalidClaims(InvalidClaim::Missing(claim))) => assert_eq!(claim, "sub"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn each_missing_registered_claim_is_named() {
        for claim in ["sub", "exp", "iss", "aud"] {
            let token = TokenBuilder::new().without(claim).build();
            let result = test_verifier().verify(&token).await;
            match result {
                Err(AuthError::InvalidClaims(InvalidClaim::Missing(named))) => {
                    assert_eq!(named, claim)
                }
                other => panic!("{claim}: unexpected result: {other:?}"),
            }
        }
    }
}
