//! Storage subsystem
//!
//! This module provides the record store contract and its implementations
//! for persisting interface execution records.
//!
//! Components:
//! - `storage_trait`: the Storage trait defining a uniform async API.
//! - `types`: filter, sort and aggregate types shared by backends.
//! - `database_storage`: ORM-based SQLite implementation using SeaORM.
//! - `file_storage`: filesystem-backed implementation with an in-memory index.
//! - `interface_filter`: helpers to build and evaluate record filters.
//! - `db_entities`: SeaORM entity model for the database backend.

use std::sync::Arc;

use crate::configuration::types::{StorageBackend, StorageConfig};
use crate::error_handling::types::StorageError;

pub mod database_storage;
pub mod db_entities;
pub mod file_storage;
pub mod interface_filter;
pub mod storage_trait;
pub mod types;

pub use storage_trait::Storage;

/// Opens the backend selected in the configuration.
pub async fn open(config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    match config.backend {
        StorageBackend::Database => Ok(Arc::new(
            database_storage::DatabaseStorage::new_file(&config.database_path).await?,
        )),
        StorageBackend::File => Ok(Arc::new(file_storage::FileStorage::new(
            &config.file_storage_dir,
        )?)),
    }
}

/// Behaviour every backend must share, exercised from each backend's tests.
#[cfg(test)]
pub(crate) mod conformance {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::Storage;
    use crate::error_handling::types::StorageError;
    use crate::interfaces::{InterfaceRecord, InterfaceStatus, InterfaceUpdate, Severity};
    use crate::storage::types::{GroupField, InterfaceFilter, SortField, SortOrder, SortSpec};

    /// A record created `minutes_ago` minutes before now.
    pub fn sample(name: &str, status: InterfaceStatus, minutes_ago: i64) -> InterfaceRecord {
        let at = crate::interfaces::record::truncate_to_millis(
            Utc::now() - Duration::minutes(minutes_ago),
        );
        InterfaceRecord {
            id: Uuid::new_v4(),
            interface_name: name.to_string(),
            integration_key: format!("{}_KEY", name.to_uppercase().replace(' ', "_")),
            status,
            message: "Data synchronization completed successfully".to_string(),
            severity: Severity::Medium,
            execution_time: 1000,
            records_processed: 10,
            source_system: "Workday".to_string(),
            target_system: "SAP ECP".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    pub async fn crud_roundtrip(storage: &dyn Storage) {
        let record = sample("Employee Data Sync", InterfaceStatus::Success, 0);
        let id = storage.insert_interface(&record).await.unwrap();
        assert_eq!(id, record.id);
        assert_eq!(storage.get_interface(id).await.unwrap(), Some(record.clone()));

        let update = InterfaceUpdate {
            status: Some(InterfaceStatus::Failure),
            message: Some("Connection timeout occurred".to_string()),
            ..Default::default()
        };
        let updated = storage
            .update_interface(id, &update, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, InterfaceStatus::Failure);
        assert!(updated.updated_at > record.updated_at);
        assert_eq!(updated.created_at, record.created_at);
        assert_eq!(storage.get_interface(id).await.unwrap(), Some(updated));

        let missing = Uuid::new_v4();
        assert!(storage
            .update_interface(missing, &update, Utc::now())
            .await
            .unwrap()
            .is_none());
        assert!(storage.get_interface(missing).await.unwrap().is_none());

        assert!(storage.delete_interface(id).await.unwrap());
        assert!(!storage.delete_interface(id).await.unwrap());
        assert!(storage.get_interface(id).await.unwrap().is_none());
    }

    pub async fn filters_and_windows(storage: &dyn Storage) {
        let mut records = Vec::new();
        for i in 0..7 {
            let status = if i % 3 == 0 {
                InterfaceStatus::Failure
            } else {
                InterfaceStatus::Success
            };
            let name = if i % 2 == 0 {
                "Payroll Integration"
            } else {
                "Benefits Management"
            };
            let mut r = sample(name, status, i * 10);
            r.execution_time = 100 * (i as u64 + 1);
            if i == 4 {
                r.message = "Rate limit exceeded".to_string();
            }
            records.push(r);
        }
        for r in &records {
            storage.insert_interface(r).await.unwrap();
        }

        let all = InterfaceFilter::default();
        assert_eq!(storage.count_interfaces(&all).await.unwrap(), 7);

        // Default sort is newest first.
        let page = storage
            .find_interfaces(&all, SortSpec::default(), 0, 3)
            .await
            .unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].id, records[0].id);
        assert_eq!(page[2].id, records[2].id);
        let last = storage
            .find_interfaces(&all, SortSpec::default(), 6, 3)
            .await
            .unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, records[6].id);

        let by_exec = SortSpec {
            field: SortField::ExecutionTime,
            order: SortOrder::Asc,
        };
        let asc = storage.find_interfaces(&all, by_exec, 0, 10).await.unwrap();
        assert!(asc.windows(2).all(|w| w[0].execution_time <= w[1].execution_time));

        let failures = InterfaceFilter {
            status: Some(InterfaceStatus::Failure),
            ..Default::default()
        };
        let found = storage
            .find_interfaces(&failures, SortSpec::default(), 0, 50)
            .await
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|r| r.status == InterfaceStatus::Failure));
        assert_eq!(storage.count_interfaces(&failures).await.unwrap(), 3);

        let by_name = InterfaceFilter {
            interface_name: Some("payROLL int".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_interfaces(&by_name).await.unwrap(), 4);

        let keyword = InterfaceFilter {
            keyword: Some("RATE LIMIT".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_interfaces(&keyword).await.unwrap(), 1);
        let keyword = InterfaceFilter {
            keyword: Some("benefits_management_key".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_interfaces(&keyword).await.unwrap(), 3);

        let literal = InterfaceFilter {
            message: Some("%".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_interfaces(&literal).await.unwrap(), 0);

        // Inclusive bounds on created_at.
        let exact = InterfaceFilter {
            created_from: Some(records[3].created_at),
            created_to: Some(records[1].created_at),
            ..Default::default()
        };
        let window = storage
            .find_interfaces(&exact, SortSpec::default(), 0, 50)
            .await
            .unwrap();
        let ids: Vec<Uuid> = window.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![records[1].id, records[2].id, records[3].id]);
    }

    pub async fn aggregates(storage: &dyn Storage) {
        let statuses = [
            InterfaceStatus::Success,
            InterfaceStatus::Success,
            InterfaceStatus::Failure,
        ];
        for (i, status) in statuses.into_iter().enumerate() {
            let mut r = sample("Payroll Integration", status, i as i64);
            r.execution_time = 1000 * (i as u64 + 1);
            r.records_processed = 5;
            if i == 2 {
                r.interface_name = "Time Tracking Sync".to_string();
                r.severity = Severity::Critical;
            }
            storage.insert_interface(&r).await.unwrap();
        }
        let all = InterfaceFilter::default();

        let by_status = storage.count_by(&all, GroupField::Status).await.unwrap();
        assert_eq!(by_status.len(), 2);
        assert_eq!(by_status[0].key, "SUCCESS");
        assert_eq!(by_status[0].count, 2);
        assert_eq!(by_status[1].key, "FAILURE");
        assert_eq!(by_status[1].count, 1);

        let by_severity = storage.count_by(&all, GroupField::Severity).await.unwrap();
        assert_eq!(by_severity[0].key, "MEDIUM");
        assert_eq!(by_severity[1].key, "CRITICAL");

        let by_name = storage
            .count_by(&all, GroupField::InterfaceName)
            .await
            .unwrap();
        assert_eq!(by_name[0].key, "Payroll Integration");
        assert_eq!(by_name[0].count, 2);

        let totals = storage.totals(&all).await.unwrap();
        assert_eq!(totals.count, 3);
        assert_eq!(totals.total_execution_time, 6000);
        assert_eq!(totals.total_records_processed, 15);
        assert!((totals.avg_execution_time() - 2000.0).abs() < f64::EPSILON);

        let nothing = InterfaceFilter {
            source_system: Some("Oracle HCM".to_string()),
            ..Default::default()
        };
        let empty = storage.totals(&nothing).await.unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.total_execution_time, 0);
        assert_eq!(empty.avg_execution_time(), 0.0);
        assert!(storage
            .count_by(&nothing, GroupField::Status)
            .await
            .unwrap()
            .is_empty());
    }

    pub async fn bulk_insert_and_clear(storage: &dyn Storage) {
        let batch: Vec<InterfaceRecord> = (0..1200)
            .map(|i| sample("Organization Structure", InterfaceStatus::Running, i % 60))
            .collect();
        assert_eq!(storage.insert_interfaces(&batch).await.unwrap(), 1200);
        assert_eq!(storage.insert_interfaces(&[]).await.unwrap(), 0);
        assert_eq!(
            storage
                .count_interfaces(&InterfaceFilter::default())
                .await
                .unwrap(),
            1200
        );
        assert_eq!(storage.clear_interfaces().await.unwrap(), 1200);
        assert_eq!(
            storage
                .count_interfaces(&InterfaceFilter::default())
                .await
                .unwrap(),
            0
        );
    }

    pub async fn bulk_insert_is_all_or_nothing(storage: &dyn Storage) {
        let existing = sample("Payroll Integration", InterfaceStatus::Success, 0);
        storage.insert_interface(&existing).await.unwrap();

        let mut batch: Vec<InterfaceRecord> = (0..600)
            .map(|i| sample("Leave Management", InterfaceStatus::Pending, i % 30))
            .collect();
        batch.push(existing.clone());
        assert!(storage.insert_interfaces(&batch).await.is_err());
        assert_eq!(
            storage
                .count_interfaces(&InterfaceFilter::default())
                .await
                .unwrap(),
            1
        );

        let twice = sample("Training Records", InterfaceStatus::Running, 0);
        assert!(storage
            .insert_interfaces(&[twice.clone(), twice.clone()])
            .await
            .is_err());
        assert_eq!(storage.get_interface(twice.id).await.unwrap(), None);
    }

    pub async fn totals_overflow_is_an_error(storage: &dyn Storage) {
        let mut a = sample("Compensation Data", InterfaceStatus::Success, 0);
        let mut b = sample("Compensation Data", InterfaceStatus::Failure, 1);
        a.execution_time = i64::MAX as u64;
        b.execution_time = i64::MAX as u64;
        storage.insert_interfaces(&[a.clone(), b]).await.unwrap();

        assert!(matches!(
            storage.totals(&InterfaceFilter::default()).await,
            Err(StorageError::ReadFailed(_))
        ));
        let single = InterfaceFilter {
            status: Some(InterfaceStatus::Success),
            ..InterfaceFilter::default()
        };
        assert_eq!(
            storage.totals(&single).await.unwrap().total_execution_time,
            a.execution_time
        );
    }

    pub async fn skip_past_signed_range_is_empty(storage: &dyn Storage) {
        storage
            .insert_interface(&sample("Benefits Management", InterfaceStatus::Success, 0))
            .await
            .unwrap();
        let page = storage
            .find_interfaces(&InterfaceFilter::default(), SortSpec::default(), u64::MAX, 1000)
            .await
            .unwrap();
        assert!(page.is_empty());
        let all = storage
            .find_interfaces(&InterfaceFilter::default(), SortSpec::default(), 0, u64::MAX)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    pub async fn contains_folds_ascii_around_accents(storage: &dyn Storage) {
        storage
            .insert_interface(&sample("Gehälter Übertragung", InterfaceStatus::Success, 0))
            .await
            .unwrap();
        let mixed = InterfaceFilter {
            interface_name: Some("GEHälter".to_string()),
            ..Default::default()
        };
        assert_eq!(storage.count_interfaces(&mixed).await.unwrap(), 1);
    }
}
