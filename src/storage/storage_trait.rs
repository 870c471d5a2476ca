//! Storage Trait
//!
//! This module defines the `Storage` trait, the record store contract behind
//! the interface API.
//!
//! Implementors of this trait are responsible for:
//! - Persisting, updating and deleting interface execution records
//! - Filtered, ordered and windowed retrieval
//! - Grouped counts and numeric totals over a filter
//!
//! Missing records are reported as `Ok(None)` / `Ok(false)`, never as errors.
//! Concurrent writes to the same record are last-write-wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::interfaces::{InterfaceRecord, InterfaceUpdate};
use crate::storage::types::{GroupCount, GroupField, InterfaceFilter, NumericTotals, SortSpec};

#[async_trait]
pub trait Storage: Send + Sync {
    /// Persists a new record and returns its id.
    async fn insert_interface(&self, record: &InterfaceRecord) -> Result<Uuid, StorageError>;

    /// Persists a batch of records.
    async fn insert_interfaces(&self, records: &[InterfaceRecord]) -> Result<usize, StorageError>;

    /// Retrieves a record by id.
    async fn get_interface(&self, id: Uuid) -> Result<Option<InterfaceRecord>, StorageError>;

    /// Applies a partial update and returns the updated record.
    async fn update_interface(
        &self,
        id: Uuid,
        update: &InterfaceUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<InterfaceRecord>, StorageError>;

    /// Deletes a record; `false` when nothing matched.
    async fn delete_interface(&self, id: Uuid) -> Result<bool, StorageError>;

    /// Deletes every record and returns how many were removed.
    async fn clear_interfaces(&self) -> Result<u64, StorageError>;

    /// Retrieves a window of matching records in `sort` order.
    async fn find_interfaces(
        &self,
        filter: &InterfaceFilter,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<InterfaceRecord>, StorageError>;

    /// Counts matching records, ignoring any window.
    async fn count_interfaces(&self, filter: &InterfaceFilter) -> Result<u64, StorageError>;

    /// Counts matching records per distinct value of `field`, largest
    /// bucket first, ties ordered by key.
    async fn count_by(
        &self,
        filter: &InterfaceFilter,
        field: GroupField,
    ) -> Result<Vec<GroupCount>, StorageError>;

    /// Sums the numeric fields of the matching records.
    async fn totals(&self, filter: &InterfaceFilter) -> Result<NumericTotals, StorageError>;
}
