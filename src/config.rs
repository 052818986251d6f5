// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup via [`Config::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATABASE_PATH` | redb database file (`:memory:` for ephemeral) | `data/bookings.redb` |
//! | `AUTH_ISSUER` | Expected JWT issuer claim (URL) | Required |
//! | `AUTH_AUDIENCE` | Expected JWT audience claim | Required |
//! | `AUTH_JWKS_URL` | JWKS endpoint for JWT verification | `<issuer>/.well-known/jwks.json` |
//! | `JWKS_CACHE_TTL_SECS` | JWKS cache lifetime | `300` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for a single JWKS fetch | `10` |
//! | `AUTH_LEEWAY_SECS` | Clock skew tolerance for `exp`/`nbf` | `0` |
//! | `EXCITED` | Greeting flavour for `GET /` | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const AUTH_ISSUER_ENV: &str = "AUTH_ISSUER";
pub const AUTH_AUDIENCE_ENV: &str = "AUTH_AUDIENCE";
pub const AUTH_JWKS_URL_ENV: &str = "AUTH_JWKS_URL";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const AUTH_LEEWAY_ENV: &str = "AUTH_LEEWAY_SECS";
pub const EXCITED_ENV: &str = "EXCITED";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_PATH: &str = "data/bookings.redb";

/// Sentinel `DATABASE_PATH` value selecting the in-memory backend.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Well-known JWKS location relative to the issuer.
const JWKS_WELL_KNOWN_PATH: &str = ".well-known/jwks.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Issuer-related settings consumed by the token verifier.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: Url,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub leeway: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_path: String,
    pub auth: AuthSettings,
    pub excited: bool,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            }
        })?;
        let port = parse_or(&lookup, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = SocketAddr::new(host, port);

        let issuer = lookup(AUTH_ISSUER_ENV).ok_or(ConfigError::Missing(AUTH_ISSUER_ENV))?;
        let issuer_url = Url::parse(&issuer).map_err(|e| ConfigError::Invalid {
            name: AUTH_ISSUER_ENV,
            reason: e.to_string(),
        })?;
        let audience = lookup(AUTH_AUDIENCE_ENV).ok_or(ConfigError::Missing(AUTH_AUDIENCE_ENV))?;

        let jwks_url = match lookup(AUTH_JWKS_URL_ENV) {
            Some(raw) => Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                name: AUTH_JWKS_URL_ENV,
                reason: e.to_string(),
            })?,
            None => default_jwks_url(&issuer_url)?,
        };

        let auth = AuthSettings {
            issuer,
            audience,
            jwks_url,
            cache_ttl: Duration::from_secs(parse_or(&lookup, JWKS_CACHE_TTL_ENV, 300)?),
            fetch_timeout: Duration::from_secs(parse_or(&lookup, JWKS_FETCH_TIMEOUT_ENV, 10)?),
            leeway: parse_or(&lookup, AUTH_LEEWAY_ENV, 0)?,
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            bind_addr,
            database_path: lookup(DATABASE_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            auth,
            excited: lookup(EXCITED_ENV).is_some_and(|v| v == "true"),
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// `https://tenant.example.com/` → `https://tenant.example.com/.well-known/jwks.json`
fn default_jwks_url(issuer: &Url) -> Result<Url, ConfigError> {
    let mut base = issuer.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(JWKS_WELL_KNOWN_PATH)
        .map_err(|e| ConfigError::Invalid {
            name: AUTH_ISSUER_ENV,
            reason: e.to_string(),
        })
}
