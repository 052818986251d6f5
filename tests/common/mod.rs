// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, jwk::JwkSet, Algorithm, EncodingKey, Header};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceExt;

use therapy_bookings_server::{
    api::router,
    auth::{JwksManager, TokenVerifier},
    state::AppState,
    storage::Database,
};

pub const ISSUER: &str = "https://auth-server.test/";
pub const AUDIENCE: &str = "bookings";
pub const DEFAULT_KID: &str = "default-kid";

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
    let key_pairs = include_str!("../../testdata/rsa-key-pairs.json");
    serde_json::from_str(key_pairs).expect("Failed to read rsa-key-pairs.json")
}

pub fn build_jwks(keys: &[(&str, &RsaKey)]) -> Value {
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

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs()
}

/// Signed token for the default key with the given permissions claim.
pub fn token(permissions: Option<&[&str]>) -> String {
    token_with_kid(DEFAULT_KID, permissions)
}

pub fn token_with_kid(kid: &str, permissions: Option<&[&str]>) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());

    let mut claims = json!({
        "iss": ISSUER,
        "sub": "auth0|integration",
        "aud": AUDIENCE,
        "exp": now() + 600,
    });
    if let Some(permissions) = permissions {
        claims["permissions"] = json!(permissions);
    }

    encode(&header, &claims, &rsa_keys()[0].encoding_key()).expect("Failed to sign token")
}

/// Router over an in-memory database, trusting the first fixture key.
pub fn app() -> Router {
    let keys = rsa_keys();
    let jwks: JwkSet = serde_json::from_value(build_jwks(&[(DEFAULT_KID, &keys[0])]))
        .expect("Failed to build JwkSet");
    app_with_keys(JwksManager::from_static(&jwks))
}

pub fn app_with_keys(jwks: JwksManager) -> Router {
    let db = Database::in_memory().expect("Failed to open in-memory database");
    let verifier = TokenVerifier::new(jwks, ISSUER, AUDIENCE);
    router(AppState::new(db, verifier))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse { status, body }
}

pub async fn send_raw(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse { status, body }
}
