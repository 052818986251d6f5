// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Therapy Bookings - therapist and booking management API
//!
//! A REST service for therapists and their bookings. Mutating and sensitive
//! read endpoints are gated by permissions carried in issuer-signed bearer
//! tokens.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token verification and permission checks (JWKS)
//! - `config` - Environment configuration
//! - `pagination` - Fixed-size page slicing for list endpoints
//! - `storage` - Embedded storage (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod state;
pub mod storage;
