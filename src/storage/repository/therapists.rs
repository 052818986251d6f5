// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Therapist repository.
//!
//! Therapists own bookings; deleting a therapist removes its bookings in the
//! same write transaction.

use redb::ReadableTable;
use serde::{Deserialize, Serialize};

use super::super::database::{
    decode, encode, next_id, Database, BOOKINGS, THERAPISTS, THERAPIST_BOOKINGS,
    THERAPIST_SEQUENCE,
};
use super::super::{StorageError, StorageResult};

/// Therapist stored in the embedded database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredTherapist {
    /// Server-assigned identifier
    pub id: u64,
    /// Display name
    pub name: String,
}

/// Repository for therapist operations.
pub struct TherapistRepository<'a> {
    db: &'a Database,
}

impl<'a> TherapistRepository<'a> {
    /// Create a new TherapistRepository.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List all therapists ordered by id.
    pub fn list_all(&self) -> StorageResult<Vec<StoredTherapist>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(THERAPISTS)?;

        let mut therapists = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            therapists.push(decode(value.value())?);
        }
        Ok(therapists)
    }

    /// Get a therapist by id. `Ok(None)` when absent.
    pub fn get(&self, therapist_id: u64) -> StorageResult<Option<StoredTherapist>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(THERAPISTS)?;
        match table.get(therapist_id)? {
            Some(value) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    /// Insert a new therapist and return it with its assigned id.
    pub fn insert(&self, name: &str) -> StorageResult<StoredTherapist> {
        let write_txn = self.db.begin_write()?;
        let therapist = {
            let id = next_id(&write_txn, THERAPIST_SEQUENCE)?;
            let therapist = StoredTherapist {
                id,
                name: name.to_string(),
            };
            let mut table = write_txn.open_table(THERAPISTS)?;
            table.insert(id, encode(&therapist)?.as_slice())?;
            therapist
        };
        write_txn.commit()?;

        tracing::debug!(therapist_id = therapist.id, "Therapist inserted");
        Ok(therapist)
    }

    /// Replace an existing therapist record.
    pub fn update(&self, therapist: &StoredTherapist) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(THERAPISTS)?;
            if table.get(therapist.id)?.is_none() {
                return Err(StorageError::NotFound(format!("Therapist {}", therapist.id)));
            }
            table.insert(therapist.id, encode(therapist)?.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete a therapist and all of its bookings.
    ///
    /// Returns the number of bookings removed by the cascade.
    pub fn delete(&self, therapist_id: u64) -> StorageResult<usize> {
        let write_txn = self.db.begin_write()?;
        let cascaded = {
            let mut therapists = write_txn.open_table(THERAPISTS)?;
            if therapists.remove(therapist_id)?.is_none() {
                return Err(StorageError::NotFound(format!("Therapist {therapist_id}")));
            }

            let mut index = write_txn.open_table(THERAPIST_BOOKINGS)?;
            let booking_ids = index
                .range((therapist_id, 0)..=(therapist_id, u64::MAX))?
                .map(|entry| entry.map(|(key, _)| key.value().1))
                .collect::<Result<Vec<u64>, redb::StorageError>>()?;

            let mut bookings = write_txn.open_table(BOOKINGS)?;
            for booking_id in &booking_ids {
                bookings.remove(*booking_id)?;
                index.remove((therapist_id, *booking_id))?;
            }
            booking_ids.len()
        };
        write_txn.commit()?;

        tracing::debug!(therapist_id, cascaded, "Therapist deleted");
        Ok(cascaded)
    }
}
