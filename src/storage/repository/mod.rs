// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the embedded database.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! borrowing the shared [`Database`](super::Database) handle.

pub mod bookings;
pub mod therapists;

pub use bookings::{BookingChanges, BookingRepository, NewBooking, StoredBooking};
pub use therapists::{StoredTherapist, TherapistRepository};
