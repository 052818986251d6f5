// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Caching
//!
//! - Keys are cached process-wide with a configurable TTL
//! - An unknown `kid` triggers one re-fetch, at most once per minimum
//!   refetch interval, so issuer key rotation is picked up
//! - Fetches are serialized; tasks that waited on an in-flight fetch reuse
//!   its result
//! - Stale cache is used when a refresh fails
//! - After a failed fetch, further fetches wait out the minimum refetch
//!   interval; requests in that window get stale keys or fail immediately
//!
//! ## Usage
//!
//! Build a JwksManager from `AUTH_JWKS_URL` in main.rs and hand it to the
//! [`TokenVerifier`](super::TokenVerifier).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey};
use tokio::sync::{Mutex, RwLock};
use url::Url;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default upper bound for a single JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between refetches triggered by unknown key ids.
pub const DEFAULT_MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

/// Signing key resolution failure.
#[derive(Debug, thiserror::Error)]
pub enum KeyResolutionError {
    #[error("no key with id '{0}' in the key set")]
    KeyNotFound(String),

    #[error("key set unavailable: {0}")]
    KeySetUnavailable(String),
}

/// Public key record resolved from the key set.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub algorithm: Algorithm,
    pub decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// JWKS cache entry.
struct CacheEntry {
    keys: HashMap<String, SigningKey>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn new(keys: HashMap<String, SigningKey>) -> Self {
        Self {
            keys,
            fetched_at: Instant::now(),
        }
    }

    fn lookup(&self, kid: &str) -> Result<SigningKey, KeyResolutionError> {
        self.keys
            .get(kid)
            .cloned()
            .ok_or_else(|| KeyResolutionError::KeyNotFound(kid.to_string()))
    }
}

/// Outcome of the most recent fetch attempt, guarded by the fetch mutex.
#[derive(Default)]
struct FetchState {
    last_failure: Option<(Instant, String)>,
}

impl FetchState {
    fn record<T>(&mut self, result: &Result<T, KeyResolutionError>) {
        self.last_failure = match result {
            Ok(_) => None,
            Err(e) => Some((Instant::now(), e.to_string())),
        };
    }

    /// Reason of a failure that happened less than `backoff` ago.
    fn recent_failure(&self, backoff: Duration) -> Option<&str> {
        match &self.last_failure {
            Some((at, reason)) if at.elapsed() < backoff => Some(reason),
            _ => None,
        }
    }
}

enum KeySource {
    Remote { url: Url, client: reqwest::Client },
    Static,
}

/// JWKS manager with caching.
///
/// Fetches and caches the issuer's signing keys for JWT verification.
#[derive(Clone)]
pub struct JwksManager {
    source: Arc<KeySource>,
    /// Cache TTL
    cache_ttl: Duration,
    /// Spacing between on-miss refetches
    min_refetch_interval: Duration,
    /// Cached keys by kid
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Held while a fetch is in flight
    fetch_state: Arc<Mutex<FetchState>>,
}

impl JwksManager {
    /// Create a new JWKS manager for a remote endpoint.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://tenant.example.com/.well-known/jwks.json`)
    /// - `fetch_timeout`: Upper bound for one fetch, including the body
    pub fn new(jwks_url: Url, fetch_timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(fetch_timeout).build()?;
        Ok(Self::with_source(KeySource::Remote {
            url: jwks_url,
            client,
        }))
    }

    /// Create a manager over a fixed key set that is never refreshed.
    pub fn from_static(jwks: &JwkSet) -> Self {
        let manager = Self::with_source(KeySource::Static);
        let entry = CacheEntry::new(index_key_set(jwks));
        Self {
            cache: Arc::new(RwLock::new(Some(entry))),
            ..manager
        }
    }

    fn with_source(source: KeySource) -> Self {
        Self {
            source: Arc::new(source),
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refetch_interval: DEFAULT_MIN_REFETCH_INTERVAL,
            cache: Arc::new(RwLock::new(None)),
            fetch_state: Arc::new(Mutex::new(FetchState::default())),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Create with a custom spacing for refetches on unknown key ids.
    pub fn with_min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    /// Get the JWKS URL, if the keys come from a remote endpoint.
    pub fn jwks_url(&self) -> Option<&Url> {
        match &*self.source {
            KeySource::Remote { url, .. } => Some(url),
            KeySource::Static => None,
        }
    }

    fn is_static(&self) -> bool {
        matches!(&*self.source, KeySource::Static)
    }

    /// Resolve the signing key for a key id.
    pub async fn get_signing_key(&self, kid: &str) -> Result<SigningKey, KeyResolutionError> {
        // Check cache first
        let observed = {
            let cache = self.cache.read().await;
            match &*cache {
                Some(entry) => {
                    if self.is_static() || entry.fetched_at.elapsed() < self.cache_ttl {
                        if let Some(key) = entry.keys.get(kid) {
                            return Ok(key.clone());
                        }
                    }
                    Some(entry.fetched_at)
                }
                None => None,
            }
        };

        if self.is_static() {
            return Err(KeyResolutionError::KeyNotFound(kid.to_string()));
        }

        let mut fetch = self.fetch_state.lock().await;

        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                // Another task refreshed while we waited
                if Some(entry.fetched_at) != observed {
                    return entry.lookup(kid);
                }
                let age = entry.fetched_at.elapsed();
                if age < self.cache_ttl && age < self.min_refetch_interval {
                    return Err(KeyResolutionError::KeyNotFound(kid.to_string()));
                }
            }
        }

        if let Some(reason) = fetch.recent_failure(self.min_refetch_interval) {
            let e = KeyResolutionError::KeySetUnavailable(reason.to_string());
            return self.stale_or(kid, e).await;
        }

        let fetched = self.fetch_keys().await;
        fetch.record(&fetched);
        match fetched {
            Ok(keys) => {
                let entry = CacheEntry::new(keys);
                let result = entry.lookup(kid);
                *self.cache.write().await = Some(entry);
                result
            }
            Err(e) => self.stale_or(kid, e).await,
        }
    }

    /// Serve `kid` from the cache regardless of age, or fail with `err`.
    async fn stale_or(
        &self,
        kid: &str,
        err: KeyResolutionError,
    ) -> Result<SigningKey, KeyResolutionError> {
        let cache = self.cache.read().await;
        match cache.as_ref().and_then(|entry| entry.keys.get(kid)) {
            Some(key) => {
                tracing::warn!(kid, error = %err, "JWKS unavailable, using stale signing key");
                Ok(key.clone())
            }
            None => Err(err),
        }
    }

    /// Fetch JWKS from the endpoint and index it by kid.
    async fn fetch_keys(&self) -> Result<HashMap<String, SigningKey>, KeyResolutionError> {
        let KeySource::Remote { url, client } = &*self.source else {
            return Err(KeyResolutionError::KeySetUnavailable(
                "static key set cannot be fetched".to_string(),
            ));
        };

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| KeyResolutionError::KeySetUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyResolutionError::KeySetUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeyResolutionError::KeySetUnavailable(e.to_string()))?;

        let keys = index_key_set(&jwks);
        tracing::info!(url = %url, keys = keys.len(), "Fetched JWKS");
        Ok(keys)
    }

    /// Force refresh the JWKS cache.
    pub async fn refresh(&self) -> Result<(), KeyResolutionError> {
        if self.is_static() {
            return Ok(());
        }
        let mut fetch = self.fetch_state.lock().await;
        let fetched = self.fetch_keys().await;
        fetch.record(&fetched);
        *self.cache.write().await = Some(CacheEntry::new(fetched?));
        Ok(())
    }

    /// Check if JWKS is currently cached and valid.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        match &*cache {
            Some(entry) => self.is_static() || entry.fetched_at.elapsed() < self.cache_ttl,
            None => false,
        }
    }
}

/// Index the usable keys of a set by kid. Keys without a kid or with an
/// unsupported type are skipped.
fn index_key_set(jwks: &JwkSet) -> HashMap<String, SigningKey> {
    let mut keys = HashMap::new();
    for jwk in &jwks.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            continue;
        };
        match jwk_to_decoding_key(jwk) {
            Ok((decoding_key, algorithm)) => {
                keys.insert(
                    kid.clone(),
                    SigningKey {
                        kid,
                        algorithm,
                        decoding_key,
                    },
                );
            }
            Err(reason) => tracing::debug!(kid = %kid, reason, "Skipping unusable JWK"),
        }
    }
    keys
}

/// Convert a JWK to a DecodingKey.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<(DecodingKey, Algorithm), &'static str> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => {
            let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                .map_err(|_| "invalid RSA components")?;

            // Determine algorithm from JWK
            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::RS384) => Algorithm::RS384,
                Some(KeyAlgorithm::RS512) => Algorithm::RS512,
                Some(KeyAlgorithm::PS256) => Algorithm::PS256,
                Some(KeyAlgorithm::PS384) => Algorithm::PS384,
                Some(KeyAlgorithm::PS512) => Algorithm::PS512,
                _ => Algorithm::RS256, // Default for RSA
            };

            Ok((key, alg))
        }
        AlgorithmParameters::EllipticCurve(ec) => {
            let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                .map_err(|_| "invalid EC components")?;

            let alg = match jwk.common.key_algorithm {
                Some(KeyAlgorithm::ES384) => Algorithm::ES384,
                _ => Algorithm::ES256, // Default for EC
            };

            Ok((key, alg))
        }
        _ => Err("unsupported key type"),
    }
}
