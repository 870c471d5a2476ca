//! Time-windowed rollups for the dashboard.
//!
//! Every section of a [`Summary`] is computed independently against the same
//! `[now - window, now]` filter on `created_at`.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use super::query_builder::TimeRange;
use super::{InterfaceRecord, InterfaceStatus, Severity};
use crate::error_handling::types::StorageError;
use crate::storage::interface_filter;
use crate::storage::types::{GroupCount, GroupField, NumericTotals, SortField, SortOrder, SortSpec};
use crate::storage::Storage;

pub const TOP_INTERFACES: usize = 5;
pub const RECENT_FAILURES: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_execution_time: u64,
    pub total_records_processed: u64,
    pub avg_execution_time: f64,
}

impl From<NumericTotals> for Totals {
    fn from(totals: NumericTotals) -> Self {
        Self {
            total_execution_time: totals.total_execution_time,
            total_records_processed: totals.total_records_processed,
            avg_execution_time: totals.avg_execution_time(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopInterface {
    pub interface_name: String,
    pub count: u64,
}

/// Projection of a failed execution shown in the "recent failures" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFailure {
    pub interface_name: String,
    pub integration_key: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<InterfaceRecord> for RecentFailure {
    fn from(record: InterfaceRecord) -> Self {
        Self {
            interface_name: record.interface_name,
            integration_key: record.integration_key,
            message: record.message,
            created_at: record.created_at,
        }
    }
}

/// Statuses and severities absent from the window are omitted from the maps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub time_range: String,
    pub status_counts: BTreeMap<InterfaceStatus, u64>,
    pub severity_counts: BTreeMap<Severity, u64>,
    pub totals: Totals,
    pub top_interfaces: Vec<TopInterface>,
    pub recent_failures: Vec<RecentFailure>,
}

/// Computes the rollup for the window ending at `now`.
pub async fn summarize(
    storage: &dyn Storage,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<Summary, StorageError> {
    let (from, to) = range.bounds(now);
    let window = interface_filter::created_between(from, to);
    debug!("Summarizing interfaces between {} and {}", from, to);

    let status_counts = keyed(storage.count_by(&window, GroupField::Status).await?);
    let severity_counts = keyed(storage.count_by(&window, GroupField::Severity).await?);
    let totals = storage.totals(&window).await?.into();

    let top_interfaces = storage
        .count_by(&window, GroupField::InterfaceName)
        .await?
        .into_iter()
        .take(TOP_INTERFACES)
        .map(|group| TopInterface {
            interface_name: group.key,
            count: group.count,
        })
        .collect();

    let mut failures = interface_filter::by_status(InterfaceStatus::Failure);
    failures.created_from = window.created_from;
    failures.created_to = window.created_to;
    let newest_first = SortSpec {
        field: SortField::CreatedAt,
        order: SortOrder::Desc,
    };
    let recent_failures = storage
        .find_interfaces(&failures, newest_first, 0, RECENT_FAILURES)
        .await?
        .into_iter()
        .map(RecentFailure::from)
        .collect();

    Ok(Summary {
        time_range: range.token().to_string(),
        status_counts,
        severity_counts,
        totals,
        top_interfaces,
        recent_failures,
    })
}

fn keyed<K>(groups: Vec<GroupCount>) -> BTreeMap<K, u64>
where
    K: FromStr + Ord,
{
    let mut counts = BTreeMap::new();
    for group in groups {
        match group.key.parse::<K>() {
            Ok(key) => {
                counts.insert(key, group.count);
            }
            Err(_) => warn!("Skipping unrecognised group key `{}`", group.key),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::conformance::sample;
    use crate::storage::file_storage::FileStorage;
    use chrono::Duration;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_last_hour_status_counts() {
        let (_dir, storage) = store();
        for (status, minutes) in [
            (InterfaceStatus::Success, 5),
            (InterfaceStatus::Success, 20),
            (InterfaceStatus::Failure, 40),
        ] {
            storage
                .insert_interface(&sample("Payroll Integration", status, minutes))
                .await
                .unwrap();
        }
        // Outside the one hour window.
        storage
            .insert_interface(&sample("Payroll Integration", InterfaceStatus::Failure, 180))
            .await
            .unwrap();

        let summary = summarize(&storage, TimeRange::LastHour, Utc::now())
            .await
            .unwrap();
        assert_eq!(summary.time_range, "1h");
        assert_eq!(summary.status_counts.len(), 2);
        assert_eq!(summary.status_counts[&InterfaceStatus::Success], 2);
        assert_eq!(summary.status_counts[&InterfaceStatus::Failure], 1);
        assert_eq!(summary.severity_counts[&Severity::Medium], 3);
        assert_eq!(summary.totals.total_execution_time, 3000);
        assert_eq!(summary.totals.total_records_processed, 30);
        assert!((summary.totals.avg_execution_time - 1000.0).abs() < f64::EPSILON);
        assert_eq!(
            summary.top_interfaces,
            vec![TopInterface {
                interface_name: "Payroll Integration".to_string(),
                count: 3
            }]
        );
        assert_eq!(summary.recent_failures.len(), 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["statusCounts"]["SUCCESS"], 2);
        assert_eq!(json["totals"]["totalExecutionTime"], 3000);
        assert_eq!(
            json["recentFailures"][0]["integrationKey"],
            "PAYROLL_INTEGRATION_KEY"
        );
        assert!(json["recentFailures"][0].get("status").is_none());
    }

    #[tokio::test]
    async fn test_empty_window_has_zero_totals() {
        let (_dir, storage) = store();
        storage
            .insert_interface(&sample("Leave Management", InterfaceStatus::Success, 120))
            .await
            .unwrap();

        let summary = summarize(&storage, TimeRange::LastHour, Utc::now())
            .await
            .unwrap();
        assert!(summary.status_counts.is_empty());
        assert!(summary.severity_counts.is_empty());
        assert_eq!(summary.totals.total_execution_time, 0);
        assert_eq!(summary.totals.total_records_processed, 0);
        assert_eq!(summary.totals.avg_execution_time, 0.0);
        assert!(summary.top_interfaces.is_empty());
        assert!(summary.recent_failures.is_empty());
    }

    #[tokio::test]
    async fn test_counts_cover_window_and_failures_are_capped() {
        let (_dir, storage) = store();
        let names = [
            "Employee Data Sync",
            "Payroll Integration",
            "Benefits Management",
            "Time Tracking Sync",
            "Performance Review",
            "Recruitment Data",
            "Training Records",
        ];
        let mut inserted = 0u64;
        for (i, name) in names.iter().enumerate() {
            for j in 0..=i {
                let status = if j % 2 == 0 {
                    InterfaceStatus::Failure
                } else {
                    InterfaceStatus::Pending
                };
                let minutes = (i * 10 + j) as i64;
                storage
                    .insert_interface(&sample(name, status, minutes))
                    .await
                    .unwrap();
                inserted += 1;
            }
        }

        let summary = summarize(&storage, TimeRange::LastDay, Utc::now())
            .await
            .unwrap();
        assert_eq!(summary.status_counts.values().sum::<u64>(), inserted);
        assert_eq!(summary.severity_counts.values().sum::<u64>(), inserted);

        assert_eq!(summary.top_interfaces.len(), TOP_INTERFACES);
        assert_eq!(summary.top_interfaces[0].interface_name, "Training Records");
        assert!(summary
            .top_interfaces
            .windows(2)
            .all(|w| w[0].count >= w[1].count));

        assert_eq!(summary.recent_failures.len(), RECENT_FAILURES as usize);
        assert!(summary
            .recent_failures
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        assert!(summary.recent_failures[0].created_at > Utc::now() - Duration::minutes(5));
    }

    #[test]
    fn test_keyed_skips_unknown_keys() {
        let counts: BTreeMap<InterfaceStatus, u64> = keyed(vec![
            GroupCount {
                key: "SUCCESS".to_string(),
                count: 4,
            },
            GroupCount {
                key: "LOST".to_string(),
                count: 1,
            },
        ]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&InterfaceStatus::Success], 4);
    }
}
