//! # redb-backed Document Store
//!
//! One redb table per collection, `sequence(u64) -> postcard bytes`.
//!
//! redb holds an exclusive lock on the database file for as long as the
//! `RedbStore` is alive, so two ingestion jobs can never interleave their
//! deletes and inserts on the same file: the second one fails to open.

use super::{Collection, Document, DocumentStore, decode, encode};
use crate::{Result, SmartRaiseError};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::{Path, PathBuf};

/// Table for employees: sequence -> serialized Employee bytes
const EMPLOYEES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("employees");

/// Table for performances: sequence -> serialized Performance bytes
const PERFORMANCES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("performances");

const fn table(collection: Collection) -> TableDefinition<'static, u64, &'static [u8]> {
    match collection {
        Collection::Employees => EMPLOYEES_TABLE,
        Collection::Performances => PERFORMANCES_TABLE,
    }
}

fn write_err(e: impl std::fmt::Display) -> SmartRaiseError {
    SmartRaiseError::IngestionWriteFailed(e.to_string())
}

fn read_err(e: impl std::fmt::Display) -> SmartRaiseError {
    SmartRaiseError::IoError(e.to_string())
}

/// A disk-backed document store using redb.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a document database at the given path.
    ///
    /// Fails with `IngestionWriteFailed` if another process holds the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path)
            .map_err(|e| write_err(format!("open {}: {}", path.display(), e)))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(write_err)?;
            for collection in Collection::ALL {
                let _ = write_txn.open_table(table(collection)).map_err(write_err)?;
            }
            write_txn.commit().map_err(write_err)?;
        }

        Ok(Self { db, path })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStore for RedbStore {
    fn delete_all(&mut self, collection: Collection) -> Result<u64> {
        let def = table(collection);
        let write_txn = self.db.begin_write().map_err(write_err)?;
        let removed = {
            let existing = write_txn.open_table(def).map_err(write_err)?;
            existing.len().map_err(write_err)?
        };
        write_txn.delete_table(def).map_err(write_err)?;
        let _ = write_txn.open_table(def).map_err(write_err)?;
        write_txn.commit().map_err(write_err)?;
        Ok(removed)
    }

    fn insert_many<D: Document>(&mut self, docs: &[D]) -> Result<u64> {
        // Encode everything before opening the transaction.
        let encoded = docs.iter().map(encode).collect::<Result<Vec<_>>>()?;

        let write_txn = self.db.begin_write().map_err(write_err)?;
        {
            let mut docs_table = write_txn
                .open_table(table(D::COLLECTION))
                .map_err(write_err)?;
            let mut next = docs_table
                .last()
                .map_err(write_err)?
                .map_or(0, |(key, _)| key.value().saturating_add(1));
            for bytes in &encoded {
                docs_table
                    .insert(next, bytes.as_slice())
                    .map_err(write_err)?;
                next = next.saturating_add(1);
            }
        }
        write_txn.commit().map_err(write_err)?;
        Ok(encoded.len() as u64)
    }

    fn find_all<D: Document>(&self) -> Result<Vec<D>> {
        let read_txn = self.db.begin_read().map_err(read_err)?;
        let docs_table = read_txn
            .open_table(table(D::COLLECTION))
            .map_err(read_err)?;

        let mut docs = Vec::new();
        for entry in docs_table.iter().map_err(read_err)? {
            let (_, value) = entry.map_err(read_err)?;
            docs.push(decode(value.value())?);
        }
        Ok(docs)
    }

    fn find_first<D: Document>(&self) -> Result<Option<D>> {
        let read_txn = self.db.begin_read().map_err(read_err)?;
        let docs_table = read_txn
            .open_table(table(D::COLLECTION))
            .map_err(read_err)?;
        match docs_table.first().map_err(read_err)? {
            Some((_, value)) => Ok(Some(decode(value.value())?)),
            None => Ok(None),
        }
    }

    fn count(&self, collection: Collection) -> Result<u64> {
        let read_txn = self.db.begin_read().map_err(read_err)?;
        let docs_table = read_txn.open_table(table(collection)).map_err(read_err)?;
        docs_table.len().map_err(read_err)
    }
}

// =============================================================================
// TESTS
// =============================================================================
