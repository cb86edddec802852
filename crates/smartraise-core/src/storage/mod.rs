//! # Document Storage
//!
//! Two named collections of serialized records.
//!
//! - `RedbStore`: embedded on-disk store, one redb table per collection
//! - `MemoryStore`: same semantics, held in memory, for tests and dry runs
//!
//! Documents are postcard-encoded. Insertion order is preserved by keying
//! every document with a monotonically increasing sequence number.

mod redb_store;

pub use redb_store::RedbStore;

use crate::primitives::{EMPLOYEES, PERFORMANCES};
use crate::records::{Employee, Performance};
use crate::{Result, SmartRaiseError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// COLLECTIONS
// =============================================================================

/// The collections the ingestion job writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Employees,
    Performances,
}

impl Collection {
    /// Every collection, in the order ingestion clears them.
    pub const ALL: [Collection; 2] = [Collection::Employees, Collection::Performances];

    /// Stored name of the collection.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Employees => EMPLOYEES,
            Self::Performances => PERFORMANCES,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record type bound to one collection.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;
}

impl Document for Employee {
    const COLLECTION: Collection = Collection::Employees;
}

impl Document for Performance {
    const COLLECTION: Collection = Collection::Performances;
}

pub(crate) fn encode<D: Document>(doc: &D) -> Result<Vec<u8>> {
    postcard::to_allocvec(doc).map_err(|e| {
        SmartRaiseError::SerializationError(format!("encode {}: {}", D::COLLECTION, e))
    })
}

pub(crate) fn decode<D: Document>(bytes: &[u8]) -> Result<D> {
    postcard::from_bytes(bytes).map_err(|e| {
        SmartRaiseError::SerializationError(format!("decode {}: {}", D::COLLECTION, e))
    })
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Collection-level operations used by ingestion and status reporting.
///
/// Each call is atomic on its own; nothing spans calls.
pub trait DocumentStore {
    /// Remove every document in `collection`. Returns how many were removed.
    fn delete_all(&mut self, collection: Collection) -> Result<u64>;

    /// Append documents to their collection, preserving order.
    fn insert_many<D: Document>(&mut self, docs: &[D]) -> Result<u64>;

    /// Every document of the collection, in insertion order.
    fn find_all<D: Document>(&self) -> Result<Vec<D>>;

    /// The first document of the collection, if any.
    fn find_first<D: Document>(&self) -> Result<Option<D>> {
        Ok(self.find_all::<D>()?.into_iter().next())
    }

    /// Number of documents in `collection`.
    fn count(&self, collection: Collection) -> Result<u64>;
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory document store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: BTreeMap<Collection, Vec<Vec<u8>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn delete_all(&mut self, collection: Collection) -> Result<u64> {
        let removed = self
            .collections
            .remove(&collection)
            .map_or(0, |docs| docs.len());
        Ok(removed as u64)
    }

    fn insert_many<D: Document>(&mut self, docs: &[D]) -> Result<u64> {
        let encoded = docs.iter().map(encode).collect::<Result<Vec<_>>>()?;
        let count = encoded.len() as u64;
        self.collections
            .entry(D::COLLECTION)
            .or_default()
            .extend(encoded);
        Ok(count)
    }

    fn find_all<D: Document>(&self) -> Result<Vec<D>> {
        self.collections
            .get(&D::COLLECTION)
            .map_or_else(|| Ok(Vec::new()), |docs| docs.iter().map(|b| decode(b)).collect())
    }

    fn count(&self, collection: Collection) -> Result<u64> {
        Ok(self.collections.get(&collection).map_or(0, Vec::len) as u64)
    }
}

// =============================================================================
// TESTS
// =============================================================================
