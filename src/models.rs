// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `ToSchema` for OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Therapists**: public therapist shape and create request
//! - **Bookings**: public booking shape, create and update requests
//! - **Envelopes**: `{success: true, ...}` response bodies per endpoint
//!
//! Required request fields are `Option`s so that a missing field can be
//! answered with 422 rather than a body-parsing 400.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{StoredBooking, StoredTherapist};

// =============================================================================
// Therapist Models
// =============================================================================

/// Public representation of a therapist.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Therapist {
    pub id: u64,
    pub name: String,
}

impl From<StoredTherapist> for Therapist {
    fn from(stored: StoredTherapist) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
        }
    }
}

/// Request to create a therapist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateTherapistRequest {
    /// Display name (required).
    pub name: Option<String>,
}

// =============================================================================
// Booking Models
// =============================================================================

/// Public representation of a booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Booking {
    pub id: u64,
    pub therapist_id: u64,
    /// RFC 3339 UTC timestamp.
    pub start_time: DateTime<Utc>,
}

impl From<StoredBooking> for Booking {
    fn from(stored: StoredBooking) -> Self {
        Self {
            id: stored.id,
            therapist_id: stored.therapist_id,
            start_time: stored.start_time,
        }
    }
}

/// Request to create a booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Owning therapist (required, must exist).
    pub therapist_id: Option<u64>,
    /// Defaults to the creation time.
    pub start_time: Option<DateTime<Utc>>,
}

/// Partial update of a booking. At least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    pub therapist_id: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
}

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TherapistListResponse {
    pub success: bool,
    pub therapists: Vec<Therapist>,
    pub total_therapists: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TherapistDetailResponse {
    pub success: bool,
    pub id: u64,
    pub name: String,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingListResponse {
    pub success: bool,
    pub bookings: Vec<Booking>,
    pub total_bookings: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub success: bool,
    #[serde(flatten)]
    pub booking: Booking,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub success: bool,
    pub created: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: u64,
}

impl BookingResponse {
    pub fn new(booking: impl Into<Booking>) -> Self {
        Self {
            success: true,
            booking: booking.into(),
        }
    }
}

impl CreatedResponse {
    pub fn new(created: u64) -> Self {
        Self {
            success: true,
            created,
        }
    }
}

impl DeletedResponse {
    pub fn new(deleted: u64) -> Self {
        Self {
            success: true,
            deleted,
        }
    }
}
