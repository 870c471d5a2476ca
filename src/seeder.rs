//! Random test data for dashboards and load checks.
//!
//! Records are drawn from fixed HR-system vocabularies so that grouped views
//! (top interfaces, per-system filters) show realistic clustering.

use chrono::{DateTime, Duration, Utc};
use log::info;
use rand::Rng;

use crate::error_handling::types::StorageError;
use crate::interfaces::record::truncate_to_millis;
use crate::interfaces::{InterfaceRecord, InterfaceStatus, Severity};
use crate::storage::interface_filter;
use crate::storage::types::InterfaceFilter;
use crate::storage::Storage;

pub const DEFAULT_BATCH_SIZE: usize = 1000;

pub const INTERFACE_NAMES: [&str; 10] = [
    "Employee Data Sync",
    "Payroll Integration",
    "Time Tracking Sync",
    "Benefits Management",
    "Performance Reviews",
    "Recruitment Pipeline",
    "Training Records",
    "Leave Management",
    "Compensation Data",
    "Organization Structure",
];

pub const INTEGRATION_KEYS: [&str; 10] = [
    "EMP_SYNC_001",
    "PAYROLL_INT_002",
    "TIME_TRACK_003",
    "BENEFITS_MGT_004",
    "PERF_REVIEW_005",
    "RECRUIT_PIPE_006",
    "TRAINING_REC_007",
    "LEAVE_MGT_008",
    "COMP_DATA_009",
    "ORG_STRUCT_010",
];

pub const SOURCE_SYSTEMS: [&str; 5] = [
    "SAP SuccessFactors",
    "Workday",
    "Oracle HCM",
    "ADP",
    "BambooHR",
];

pub const TARGET_SYSTEMS: [&str; 5] = [
    "SAP ECP",
    "Oracle ERP",
    "ADP Payroll",
    "BambooHR",
    "Custom HR System",
];

pub const MESSAGES: [&str; 10] = [
    "Data synchronization completed successfully",
    "Connection timeout occurred",
    "Invalid data format detected",
    "Authentication failed",
    "Rate limit exceeded",
    "Network connectivity issues",
    "Data validation errors",
    "System maintenance in progress",
    "API endpoint not found",
    "Database connection failed",
];

/// Counts logged once seeding finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: u64,
    pub total: u64,
    pub success: u64,
    pub failure: u64,
}

fn pick<R: Rng + ?Sized, T: Copy, const N: usize>(rng: &mut R, items: &[T; N]) -> T {
    items[rng.gen_range(0..N)]
}

/// One random record created within the 30 days before `now`.
pub fn generate_record<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> InterfaceRecord {
    let window_ms = Duration::days(30).num_milliseconds();
    let created_at = truncate_to_millis(now - Duration::milliseconds(rng.gen_range(0..=window_ms)));

    InterfaceRecord {
        id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid(),
        interface_name: pick(rng, &INTERFACE_NAMES).to_string(),
        integration_key: pick(rng, &INTEGRATION_KEYS).to_string(),
        status: pick(rng, &InterfaceStatus::ALL),
        message: pick(rng, &MESSAGES).to_string(),
        severity: pick(rng, &Severity::ALL),
        execution_time: rng.gen_range(1000..301_000),
        records_processed: rng.gen_range(0..10_000),
        source_system: pick(rng, &SOURCE_SYSTEMS).to_string(),
        target_system: pick(rng, &TARGET_SYSTEMS).to_string(),
        created_at,
        updated_at: created_at,
    }
}

/// Replaces the store's contents with `count` random records, inserted in
/// batches of `batch_size`.
pub async fn seed<R: Rng + ?Sized>(
    storage: &dyn Storage,
    rng: &mut R,
    count: usize,
    batch_size: usize,
) -> Result<SeedReport, StorageError> {
    let cleared = storage.clear_interfaces().await?;
    info!("Cleared {} existing records", cleared);

    let batch_size = batch_size.max(1);
    let batches = count.div_ceil(batch_size);
    let now = Utc::now();
    let mut inserted = 0u64;

    for i in 0..batches {
        let size = batch_size.min(count - i * batch_size);
        let batch: Vec<InterfaceRecord> = (0..size).map(|_| generate_record(rng, now)).collect();
        inserted += storage.insert_interfaces(&batch).await? as u64;
        info!("Inserted batch {}/{} ({} records)", i + 1, batches, size);
    }

    let report = SeedReport {
        inserted,
        total: storage.count_interfaces(&InterfaceFilter::default()).await?,
        success: storage
            .count_interfaces(&interface_filter::by_status(InterfaceStatus::Success))
            .await?,
        failure: storage
            .count_interfaces(&interface_filter::by_status(InterfaceStatus::Failure))
            .await?,
    };
    info!(
        "Seeded {} records: total {}, success {}, failure {}",
        report.inserted, report.total, report.success, report.failure
    );
    Ok(report)
}
