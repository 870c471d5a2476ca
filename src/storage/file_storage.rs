use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::interfaces::{InterfaceRecord, InterfaceUpdate};
use crate::storage::interface_filter::{compare_records, CompiledFilter};
use crate::storage::storage_trait::Storage;
use crate::storage::types::{GroupCount, GroupField, InterfaceFilter, NumericTotals, SortSpec};

/// Filesystem-backed record store.
///
/// Every record lives in `<base>/interfaces/<id>.json`. The directory is
/// loaded into an in-memory index at start-up; queries run against the index
/// and writes go to disk before the index is updated.
pub struct FileStorage {
    base_path: PathBuf,
    index: RwLock<HashMap<Uuid, InterfaceRecord>>,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        let records_dir = base_path.join("interfaces");
        fs::create_dir_all(&records_dir).map_err(|e| {
            error!("Failed to create records dir {}: {}", records_dir.display(), e);
            StorageError::WriteFailed(e.to_string())
        })?;

        let storage = Self {
            base_path,
            index: RwLock::new(HashMap::new()),
        };
        let loaded = storage.load_index()?;
        info!(
            "FileStorage initialized at {} ({} records)",
            storage.base_path.display(),
            loaded
        );
        Ok(storage)
    }

    fn records_dir(&self) -> PathBuf {
        self.base_path.join("interfaces")
    }

    fn record_path(&self, id: Uuid) -> PathBuf {
        self.records_dir().join(format!("{}.json", id))
    }

    fn read_index(&self) -> Result<RwLockReadGuard<'_, HashMap<Uuid, InterfaceRecord>>, StorageError> {
        self.index
            .read()
            .map_err(|_| StorageError::ReadFailed("record index poisoned".to_string()))
    }

    fn write_index(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<Uuid, InterfaceRecord>>, StorageError> {
        self.index
            .write()
            .map_err(|_| StorageError::WriteFailed("record index poisoned".to_string()))
    }

    fn load_index(&self) -> Result<usize, StorageError> {
        let dir = self.records_dir();
        let mut index = self.write_index()?;
        for entry in fs::read_dir(&dir).map_err(|e| {
            error!("Failed to read records dir {}: {}", dir.display(), e);
            StorageError::ReadFailed(e.to_string())
        })? {
            let path = entry
                .map_err(|e| {
                    error!("Dir entry error: {}", e);
                    StorageError::ReadFailed(e.to_string())
                })?
                .path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match Self::parse_record_file(&path) {
                Ok(record) => {
                    index.insert(record.id, record);
                }
                Err(e) => warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }
        Ok(index.len())
    }

    fn parse_record_file(path: &Path) -> Result<InterfaceRecord, StorageError> {
        let content = fs::read_to_string(path).map_err(|e| StorageError::ReadFailed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| StorageError::ReadFailed(e.to_string()))
    }

    // Write-then-rename so a crash never leaves a half-written document.
    fn write_record_file(&self, record: &InterfaceRecord) -> Result<(), StorageError> {
        let path = self.record_path(record.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(record).map_err(|e| {
            error!("Failed to serialize record {}: {}", record.id, e);
            StorageError::WriteFailed(e.to_string())
        })?;
        File::create(&tmp)
            .and_then(|mut f| f.write_all(&json))
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                error!("Failed to write record file {}: {}", path.display(), e);
                StorageError::WriteFailed(e.to_string())
            })?;
        debug!("Saved record {} to {}", record.id, path.display());
        Ok(())
    }

    fn remove_record_file(&self, id: Uuid) -> Result<(), StorageError> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to remove record file {}: {}", path.display(), e);
                Err(StorageError::WriteFailed(e.to_string()))
            }
        }
    }

    fn matching<'a>(
        index: &'a HashMap<Uuid, InterfaceRecord>,
        filter: &InterfaceFilter,
    ) -> Vec<&'a InterfaceRecord> {
        let compiled = CompiledFilter::new(filter);
        index.values().filter(|r| compiled.matches(r)).collect()
    }
}

/// Sums stay within the signed 64-bit range, the same bound SQLite enforces.
fn add_counter(acc: u64, value: u64) -> Result<u64, StorageError> {
    acc.checked_add(value)
        .filter(|sum| i64::try_from(*sum).is_ok())
        .ok_or_else(|| {
            error!("Totals overflowed while summing {} + {}", acc, value);
            StorageError::ReadFailed("integer overflow".to_string())
        })
}

#[async_trait]
impl Storage for FileStorage {
    async fn insert_interface(&self, record: &InterfaceRecord) -> Result<Uuid, StorageError> {
        let mut index = self.write_index()?;
        if index.contains_key(&record.id) {
            return Err(StorageError::WriteFailed(format!(
                "record {} already exists",
                record.id
            )));
        }
        self.write_record_file(record)?;
        index.insert(record.id, record.clone());
        Ok(record.id)
    }

    /// All or nothing: ids are checked up front and files written before a
    /// failure are removed again.
    async fn insert_interfaces(&self, records: &[InterfaceRecord]) -> Result<usize, StorageError> {
        let mut index = self.write_index()?;
        let mut batch_ids = HashSet::with_capacity(records.len());
        for record in records {
            if index.contains_key(&record.id) || !batch_ids.insert(record.id) {
                return Err(StorageError::WriteFailed(format!(
                    "record {} already exists",
                    record.id
                )));
            }
        }

        for (written, record) in records.iter().enumerate() {
            if let Err(e) = self.write_record_file(record) {
                for done in &records[..written] {
                    if let Err(cleanup) = self.remove_record_file(done.id) {
                        warn!("Could not roll back record {}: {}", done.id, cleanup);
                    }
                }
                return Err(e);
            }
        }
        for record in records {
            index.insert(record.id, record.clone());
        }
        Ok(records.len())
    }

    async fn get_interface(&self, id: Uuid) -> Result<Option<InterfaceRecord>, StorageError> {
        Ok(self.read_index()?.get(&id).cloned())
    }

    async fn update_interface(
        &self,
        id: Uuid,
        update: &InterfaceUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<InterfaceRecord>, StorageError> {
        let mut index = self.write_index()?;
        let mut record = match index.get(&id) {
            Some(record) => record.clone(),
            None => return Ok(None),
        };
        update.apply(&mut record, now);
        self.write_record_file(&record)?;
        index.insert(id, record.clone());
        Ok(Some(record))
    }

    async fn delete_interface(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut index = self.write_index()?;
        if !index.contains_key(&id) {
            return Ok(false);
        }
        self.remove_record_file(id)?;
        index.remove(&id);
        Ok(true)
    }

    async fn clear_interfaces(&self) -> Result<u64, StorageError> {
        let mut index = self.write_index()?;
        let ids: Vec<Uuid> = index.keys().copied().collect();
        for id in &ids {
            self.remove_record_file(*id)?;
            index.remove(id);
        }
        info!("Cleared {} records from {}", ids.len(), self.base_path.display());
        Ok(ids.len() as u64)
    }

    async fn find_interfaces(
        &self,
        filter: &InterfaceFilter,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<InterfaceRecord>, StorageError> {
        let index = self.read_index()?;
        let mut records = Self::matching(&index, filter);
        records.sort_by(|a, b| compare_records(a, b, sort));
        Ok(records
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count_interfaces(&self, filter: &InterfaceFilter) -> Result<u64, StorageError> {
        let index = self.read_index()?;
        Ok(Self::matching(&index, filter).len() as u64)
    }

    async fn count_by(
        &self,
        filter: &InterfaceFilter,
        field: GroupField,
    ) -> Result<Vec<GroupCount>, StorageError> {
        let index = self.read_index()?;
        let mut buckets: HashMap<String, u64> = HashMap::new();
        for record in Self::matching(&index, filter) {
            let key = match field {
                GroupField::Status => record.status.as_str().to_string(),
                GroupField::Severity => record.severity.as_str().to_string(),
                GroupField::InterfaceName => record.interface_name.clone(),
            };
            *buckets.entry(key).or_insert(0) += 1;
        }
        let mut groups: Vec<GroupCount> = buckets
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect();
        groups.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        Ok(groups)
    }

    async fn totals(&self, filter: &InterfaceFilter) -> Result<NumericTotals, StorageError> {
        let index = self.read_index()?;
        let mut totals = NumericTotals::default();
        for r in Self::matching(&index, filter) {
            totals.count += 1;
            totals.total_execution_time =
                add_counter(totals.total_execution_time, r.execution_time)?;
            totals.total_records_processed =
                add_counter(totals.total_records_processed, r.records_processed)?;
        }
        Ok(totals)
    }
}
