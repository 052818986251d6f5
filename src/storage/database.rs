// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `therapists`: therapist id → serialized StoredTherapist
//! - `bookings`: booking id → serialized StoredBooking
//! - `therapist_bookings`: (therapist id, booking id) → () (cascade index)
//! - `sequences`: sequence name → last assigned id
//!
//! Every insert, update and delete runs in its own write transaction, so
//! referential checks and cascades commit atomically with the change.

use std::path::Path;

use redb::backends::InMemoryBackend;
use redb::{ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: therapist id → serialized StoredTherapist (JSON bytes).
pub(crate) const THERAPISTS: TableDefinition<u64, &[u8]> = TableDefinition::new("therapists");

/// Primary table: booking id → serialized StoredBooking (JSON bytes).
pub(crate) const BOOKINGS: TableDefinition<u64, &[u8]> = TableDefinition::new("bookings");

/// Index: (therapist id, booking id) for per-therapist scans and cascades.
pub(crate) const THERAPIST_BOOKINGS: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("therapist_bookings");

/// Id sequences: name → last assigned id. Ids are never reused.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub(crate) const THERAPIST_SEQUENCE: &str = "therapist";
pub(crate) const BOOKING_SEQUENCE: &str = "booking";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Database
// =============================================================================

/// Handle to the embedded database, shared through `AppState`.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::initialize(redb::Database::create(path)?)
    }

    /// Create an ephemeral database that lives only as long as the handle.
    pub fn in_memory() -> StorageResult<Self> {
        let db = redb::Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::initialize(db)
    }

    fn initialize(db: redb::Database) -> StorageResult<Self> {
        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(THERAPISTS)?;
            let _ = write_txn.open_table(BOOKINGS)?;
            let _ = write_txn.open_table(THERAPIST_BOOKINGS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_read(&self) -> StorageResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Verify the database can serve reads.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.begin_read()?;
        let _ = read_txn.open_table(THERAPISTS)?;
        let _ = read_txn.open_table(BOOKINGS)?;
        Ok(())
    }
}

/// Allocate the next id of a sequence inside an open write transaction.
pub(crate) fn next_id(write_txn: &WriteTransaction, sequence: &str) -> StorageResult<u64> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let current = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

pub(crate) fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}
