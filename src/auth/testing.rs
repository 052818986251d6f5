// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for auth tests: RSA key pairs, JWKS documents and a
//! token builder.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, jwk::JwkSet, Algorithm, EncodingKey, Header};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{JwksManager, TokenVerifier};
use crate::state::AppState;
use crate::storage::Database;

pub const TEST_ISSUER: &str = "https://issuer.test/";
pub const TEST_AUDIENCE: &str = "bookings";
pub const TEST_KID: &str = "test-key";

#[derive(Clone, Debug, Deserialize)]
pub struct RsaKey {
    pub private_key: String,
    pub modulus: String,
    pub exponent: String,
}

impl RsaKey {
    pub fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .expect("Failed to create EncodingKey")
    }
}

pub fn rsa_keys() -> [RsaKey; 2] {
    let key_pairs = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/testdata/rsa-key-pairs.json"
    ));
    serde_json::from_str(key_pairs).expect("Failed to read rsa-key-pairs.json")
}

/// JWKS document publishing the public halves of `keys`.
pub fn jwks_json(keys: &[(&str, &RsaKey)]) -> Value {
    let keys: Vec<Value> = keys
        .iter()
        .map(|(kid, key)| {
            json!({
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": kid,
                "n": key.modulus,
                "e": key.exponent,
            })
        })
        .collect();
    json!({ "keys": keys })
}

pub fn jwk_set(keys: &[(&str, &RsaKey)]) -> JwkSet {
    serde_json::from_value(jwks_json(keys)).expect("Failed to build JwkSet")
}

/// Builds RS256 tokens that are valid for [`test_verifier`] unless altered.
#[derive(Clone, Debug)]
pub struct TokenBuilder {
    kid: Option<String>,
    key: RsaKey,
    claims: Map<String, Value>,
}

impl TokenBuilder {
    pub fn new() -> Self {
        let mut claims = Map::new();
        claims.insert("iss".into(), json!(TEST_ISSUER));
        claims.insert("sub".into(), json!("auth0|tester"));
        claims.insert("aud".into(), json!(TEST_AUDIENCE));
        claims.insert("exp".into(), json!(now() + 3600));
        Self {
            kid: Some(TEST_KID.to_string()),
            key: rsa_keys()[0].clone(),
            claims,
        }
    }

    pub fn kid(mut self, kid: Option<&str>) -> Self {
        self.kid = kid.map(str::to_string);
        self
    }

    /// Sign with another fixture key.
    pub fn signing_key(mut self, index: usize) -> Self {
        self.key = rsa_keys()[index].clone();
        self
    }

    pub fn claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn permissions(self, permissions: &[&str]) -> Self {
        self.claim("permissions", json!(permissions))
    }

    pub fn expires_in(self, seconds: i64) -> Self {
        self.claim("exp", json!(now() + seconds))
    }

    pub fn build(&self) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.kid.clone();
        encode(&header, &self.claims, &self.key.encoding_key()).expect("Failed to sign token")
    }
}

impl Default for TokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand-crafted token with an arbitrary `alg` and a junk signature.
pub fn unsigned_token(alg: &str, claims: &Value) -> String {
    let header = json!({ "alg": alg, "typ": "JWT", "kid": TEST_KID });
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
    )
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Verifier trusting the first fixture key under [`TEST_KID`].
pub fn test_verifier() -> TokenVerifier {
    let keys = rsa_keys();
    let jwks = JwksManager::from_static(&jwk_set(&[(TEST_KID, &keys[0])]));
    TokenVerifier::new(jwks, TEST_ISSUER, TEST_AUDIENCE)
}

pub fn test_state() -> AppState {
    let db = Database::in_memory().expect("Failed to open in-memory database");
    AppState::new(db, test_verifier())
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
