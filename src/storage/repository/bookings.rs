// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Booking repository.
//!
//! A booking always references an existing therapist. The reference is
//! checked inside the write transaction that stores the booking.

use chrono::{DateTime, Utc};
use redb::{ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::super::database::{
    decode, encode, next_id, Database, BOOKINGS, BOOKING_SEQUENCE, THERAPISTS,
    THERAPIST_BOOKINGS,
};
use super::super::{StorageError, StorageResult};

/// Booking stored in the embedded database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredBooking {
    /// Server-assigned identifier
    pub id: u64,
    /// Owning therapist
    pub therapist_id: u64,
    /// When the booking starts
    pub start_time: DateTime<Utc>,
}

/// Fields for a booking that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub therapist_id: u64,
    /// Defaults to the insertion time when `None`.
    pub start_time: Option<DateTime<Utc>>,
}

/// Partial update applied by [`BookingRepository::update`].
#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub therapist_id: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
}

/// Repository for booking operations.
pub struct BookingRepository<'a> {
    db: &'a Database,
}

impl<'a> BookingRepository<'a> {
    /// Create a new BookingRepository.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List all bookings ordered by id.
    pub fn list_all(&self) -> StorageResult<Vec<StoredBooking>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BOOKINGS)?;

        let mut bookings = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            bookings.push(decode(value.value())?);
        }
        Ok(bookings)
    }

    /// List the bookings of one therapist ordered by id.
    pub fn list_by_therapist(&self, therapist_id: u64) -> StorageResult<Vec<StoredBooking>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(THERAPIST_BOOKINGS)?;
        let table = read_txn.open_table(BOOKINGS)?;

        let mut bookings = Vec::new();
        for entry in index.range((therapist_id, 0)..=(therapist_id, u64::MAX))? {
            let (key, _) = entry?;
            let (_, booking_id) = key.value();
            if let Some(value) = table.get(booking_id)? {
                bookings.push(decode(value.value())?);
            }
        }
        Ok(bookings)
    }

    /// Get a booking by id. `Ok(None)` when absent.
    pub fn get(&self, booking_id: u64) -> StorageResult<Option<StoredBooking>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BOOKINGS)?;
        match table.get(booking_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert a booking for an existing therapist.
    pub fn insert(&self, new: &NewBooking) -> StorageResult<StoredBooking> {
        let write_txn = self.db.begin_write()?;
        let booking = {
            ensure_therapist_exists(&write_txn, new.therapist_id)?;

            let id = next_id(&write_txn, BOOKING_SEQUENCE)?;
            let booking = StoredBooking {
                id,
                therapist_id: new.therapist_id,
                start_time: new.start_time.unwrap_or_else(Utc::now),
            };

            let mut table = write_txn.open_table(BOOKINGS)?;
            table.insert(id, encode(&booking)?.as_slice())?;
            let mut index = write_txn.open_table(THERAPIST_BOOKINGS)?;
            index.insert((booking.therapist_id, id), ())?;
            booking
        };
        write_txn.commit()?;

        tracing::debug!(
            booking_id = booking.id,
            therapist_id = booking.therapist_id,
            "Booking inserted"
        );
        Ok(booking)
    }

    /// Apply a partial update and return the stored result.
    pub fn update(&self, booking_id: u64, changes: &BookingChanges) -> StorageResult<StoredBooking> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(BOOKINGS)?;

            // Read existing value and deserialize before mutating
            let existing: StoredBooking = {
                let value = table
                    .get(booking_id)?
                    .ok_or_else(|| StorageError::NotFound(format!("Booking {booking_id}")))?;
                decode(value.value())?
            };

            let mut updated = existing.clone();
            if let Some(therapist_id) = changes.therapist_id {
                if therapist_id != existing.therapist_id {
                    ensure_therapist_exists(&write_txn, therapist_id)?;
                    let mut index = write_txn.open_table(THERAPIST_BOOKINGS)?;
                    index.remove((existing.therapist_id, booking_id))?;
                    index.insert((therapist_id, booking_id), ())?;
                    updated.therapist_id = therapist_id;
                }
            }
            if let Some(start_time) = changes.start_time {
                updated.start_time = start_time;
            }

            table.insert(booking_id, encode(&updated)?.as_slice())?;
            updated
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Delete a booking.
    pub fn delete(&self, booking_id: u64) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(BOOKINGS)?;
            let existing: StoredBooking = {
                let value = table
                    .remove(booking_id)?
                    .ok_or_else(|| StorageError::NotFound(format!("Booking {booking_id}")))?;
                decode(value.value())?
            };

            let mut index = write_txn.open_table(THERAPIST_BOOKINGS)?;
            index.remove((existing.therapist_id, booking_id))?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

fn ensure_therapist_exists(write_txn: &WriteTransaction, therapist_id: u64) -> StorageResult<()> {
    let therapists = write_txn.open_table(THERAPISTS)?;
    if therapists.get(therapist_id)?.is_none() {
        return Err(StorageError::ConstraintViolation(format!(
            "Therapist {therapist_id} does not exist"
        )));
    }
    Ok(())
}
