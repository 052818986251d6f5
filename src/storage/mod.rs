// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Resource access for therapists and bookings, persisted in an embedded
//! redb database. Storage knows nothing about authentication; handlers
//! reach it only after the permission gate has passed.
//!
//! ## Error Mapping
//!
//! - `StorageError::NotFound` → 404
//! - everything else (constraint violations, engine failures) → 422
//!
//! Reads return `Ok(None)` for missing records so that "not found" stays
//! distinct from a failure.

pub mod database;
pub mod repository;

pub use database::{Database, StorageError, StorageResult};
pub use repository::{
    BookingChanges, BookingRepository, NewBooking, StoredBooking, StoredTherapist,
    TherapistRepository,
};
