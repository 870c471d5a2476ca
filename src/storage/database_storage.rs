use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::interfaces::{InterfaceRecord, InterfaceStatus, InterfaceUpdate, Severity};
use crate::storage::db_entities::{ActiveModel, Column, Entity, Model};
use crate::storage::storage_trait::Storage;
use crate::storage::types::{
    GroupCount, GroupField, InterfaceFilter, NumericTotals, SortField, SortOrder, SortSpec,
};

const SCHEMA: [&str; 5] = [
    "CREATE TABLE IF NOT EXISTS interface_executions (
        id TEXT PRIMARY KEY NOT NULL,
        interface_name TEXT NOT NULL,
        integration_key TEXT NOT NULL,
        status TEXT NOT NULL CHECK (status IN ('SUCCESS', 'FAILURE', 'PENDING', 'RUNNING')),
        message TEXT NOT NULL,
        severity TEXT NOT NULL DEFAULT 'MEDIUM'
            CHECK (severity IN ('LOW', 'MEDIUM', 'HIGH', 'CRITICAL')),
        execution_time INTEGER NOT NULL DEFAULT 0 CHECK (execution_time >= 0),
        records_processed INTEGER NOT NULL DEFAULT 0 CHECK (records_processed >= 0),
        source_system TEXT NOT NULL,
        target_system TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        CHECK (created_at <= updated_at)
    );",
    "CREATE INDEX IF NOT EXISTS idx_interface_created_at
        ON interface_executions (created_at DESC);",
    "CREATE INDEX IF NOT EXISTS idx_interface_status_created_at
        ON interface_executions (status, created_at DESC);",
    "CREATE INDEX IF NOT EXISTS idx_interface_name_created_at
        ON interface_executions (interface_name, created_at DESC);",
    "CREATE INDEX IF NOT EXISTS idx_interface_key_created_at
        ON interface_executions (integration_key, created_at DESC);",
];

// Rows per INSERT statement, well under SQLite's bound-variable limit.
const INSERT_CHUNK: usize = 500;

fn read_failed(e: DbErr) -> StorageError {
    error!("Database read failed: {}", e);
    StorageError::ReadFailed(e.to_string())
}

fn write_failed(e: DbErr) -> StorageError {
    error!("Database write failed: {}", e);
    StorageError::WriteFailed(e.to_string())
}

fn to_i64(field: &str, value: u64) -> Result<i64, StorageError> {
    i64::try_from(value).map_err(|_| StorageError::WriteFailed(format!("{} overflows", field)))
}

fn to_active_model(record: &InterfaceRecord) -> Result<ActiveModel, StorageError> {
    Ok(ActiveModel {
        id: Set(record.id.to_string()),
        interface_name: Set(record.interface_name.clone()),
        integration_key: Set(record.integration_key.clone()),
        status: Set(record.status.as_str().to_string()),
        message: Set(record.message.clone()),
        severity: Set(record.severity.as_str().to_string()),
        execution_time: Set(to_i64("executionTime", record.execution_time)?),
        records_processed: Set(to_i64("recordsProcessed", record.records_processed)?),
        source_system: Set(record.source_system.clone()),
        target_system: Set(record.target_system.clone()),
        created_at: Set(record.created_at.timestamp_millis()),
        updated_at: Set(record.updated_at.timestamp_millis()),
    })
}

fn from_millis(field: &str, ms: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::ReadFailed(format!("invalid {} timestamp {}", field, ms)))
}

fn into_record(model: Model) -> Result<InterfaceRecord, StorageError> {
    let corrupt = |what: String| StorageError::ReadFailed(format!("row {}: {}", model.id, what));
    Ok(InterfaceRecord {
        id: Uuid::parse_str(&model.id).map_err(|e| corrupt(e.to_string()))?,
        status: model
            .status
            .parse::<InterfaceStatus>()
            .map_err(|e| corrupt(format!("{}", e)))?,
        severity: model
            .severity
            .parse::<Severity>()
            .map_err(|e| corrupt(format!("{}", e)))?,
        execution_time: u64::try_from(model.execution_time)
            .map_err(|_| corrupt("negative execution_time".to_string()))?,
        records_processed: u64::try_from(model.records_processed)
            .map_err(|_| corrupt("negative records_processed".to_string()))?,
        created_at: from_millis("created_at", model.created_at)?,
        updated_at: from_millis("updated_at", model.updated_at)?,
        interface_name: model.interface_name,
        integration_key: model.integration_key,
        message: model.message,
        source_system: model.source_system,
        target_system: model.target_system,
    })
}

fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Case-insensitive "contains" predicate on a text column. SQLite's `lower()`
/// only folds ASCII, so the needle is lowered the same way.
fn contains_ci(column: Column, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_ascii_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

fn condition(filter: &InterfaceFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(status) = filter.status {
        cond = cond.add(Column::Status.eq(status.as_str()));
    }
    if let Some(severity) = filter.severity {
        cond = cond.add(Column::Severity.eq(severity.as_str()));
    }
    let text = [
        (Column::InterfaceName, &filter.interface_name),
        (Column::IntegrationKey, &filter.integration_key),
        (Column::SourceSystem, &filter.source_system),
        (Column::TargetSystem, &filter.target_system),
        (Column::Message, &filter.message),
    ];
    for (column, needle) in text {
        if let Some(needle) = needle {
            cond = cond.add(contains_ci(column, needle));
        }
    }
    if let Some(keyword) = &filter.keyword {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(Column::Message, keyword))
                .add(contains_ci(Column::IntegrationKey, keyword)),
        );
    }
    if let Some(from) = filter.created_from {
        cond = cond.add(Column::CreatedAt.gte(from.timestamp_millis()));
    }
    if let Some(to) = filter.created_to {
        cond = cond.add(Column::CreatedAt.lte(to.timestamp_millis()));
    }
    cond
}

fn sort_column(field: SortField) -> Column {
    match field {
        SortField::Id => Column::Id,
        SortField::InterfaceName => Column::InterfaceName,
        SortField::IntegrationKey => Column::IntegrationKey,
        SortField::Status => Column::Status,
        SortField::Message => Column::Message,
        SortField::Severity => Column::Severity,
        SortField::ExecutionTime => Column::ExecutionTime,
        SortField::RecordsProcessed => Column::RecordsProcessed,
        SortField::SourceSystem => Column::SourceSystem,
        SortField::TargetSystem => Column::TargetSystem,
        SortField::CreatedAt => Column::CreatedAt,
        SortField::UpdatedAt => Column::UpdatedAt,
    }
}

fn group_column(field: GroupField) -> Column {
    match field {
        GroupField::Status => Column::Status,
        GroupField::Severity => Column::Severity,
        GroupField::InterfaceName => Column::InterfaceName,
    }
}

fn sea_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

/// SQLite-backed record store built on SeaORM.
pub struct DatabaseStorage {
    db: DatabaseConnection,
}

impl DatabaseStorage {
    /// Opens (creating if needed) the SQLite file at `path` and applies the
    /// schema.
    pub async fn new_file<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create database dir {}: {}", parent.display(), e);
                StorageError::WriteFailed(e.to_string())
            })?;
        }

        let mut opts = ConnectOptions::new(format!("sqlite://{}?mode=rwc", path.display()));
        opts.max_connections(5).sqlx_logging(false);
        let db = Database::connect(opts).await.map_err(|e| {
            error!("Failed to open database {}: {}", path.display(), e);
            StorageError::ConnectionFailed(e.to_string())
        })?;

        for statement in SCHEMA {
            db.execute_unprepared(statement)
                .await
                .map_err(write_failed)?;
        }
        info!("DatabaseStorage initialized at {}", path.display());

        Ok(Self { db })
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    async fn insert_interface(&self, record: &InterfaceRecord) -> Result<Uuid, StorageError> {
        Entity::insert(to_active_model(record)?)
            .exec_without_returning(&self.db)
            .await
            .map_err(write_failed)?;
        debug!("Inserted interface {}", record.id);
        Ok(record.id)
    }

    async fn insert_interfaces(&self, records: &[InterfaceRecord]) -> Result<usize, StorageError> {
        if records.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin().await.map_err(write_failed)?;
        for chunk in records.chunks(INSERT_CHUNK) {
            let models = chunk
                .iter()
                .map(to_active_model)
                .collect::<Result<Vec<_>, _>>()?;
            Entity::insert_many(models)
                .exec_without_returning(&txn)
                .await
                .map_err(write_failed)?;
        }
        txn.commit().await.map_err(write_failed)?;
        debug!("Inserted batch of {} interfaces", records.len());
        Ok(records.len())
    }

    async fn get_interface(&self, id: Uuid) -> Result<Option<InterfaceRecord>, StorageError> {
        Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(read_failed)?
            .map(into_record)
            .transpose()
    }

    async fn update_interface(
        &self,
        id: Uuid,
        update: &InterfaceUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<InterfaceRecord>, StorageError> {
        let mut record = match self.get_interface(id).await? {
            Some(record) => record,
            None => return Ok(None),
        };
        update.apply(&mut record, now);

        match to_active_model(&record)?.update(&self.db).await {
            Ok(_) => Ok(Some(record)),
            // Deleted between the read and the write.
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(write_failed(e)),
        }
    }

    async fn delete_interface(&self, id: Uuid) -> Result<bool, StorageError> {
        let result = Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(write_failed)?;
        Ok(result.rows_affected > 0)
    }

    async fn clear_interfaces(&self) -> Result<u64, StorageError> {
        let result = Entity::delete_many()
            .exec(&self.db)
            .await
            .map_err(write_failed)?;
        Ok(result.rows_affected)
    }

    async fn find_interfaces(
        &self,
        filter: &InterfaceFilter,
        sort: SortSpec,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<InterfaceRecord>, StorageError> {
        // SQLite binds OFFSET/LIMIT as i64.
        if i64::try_from(skip).is_err() {
            return Ok(Vec::new());
        }
        let limit = limit.min(i64::MAX as u64);
        let models = Entity::find()
            .filter(condition(filter))
            .order_by(sort_column(sort.field), sea_order(sort.order))
            .order_by(Column::Id, Order::Asc)
            .offset(skip)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(read_failed)?;
        models.into_iter().map(into_record).collect()
    }

    async fn count_interfaces(&self, filter: &InterfaceFilter) -> Result<u64, StorageError> {
        Entity::find()
            .filter(condition(filter))
            .count(&self.db)
            .await
            .map_err(read_failed)
    }

    async fn count_by(
        &self,
        filter: &InterfaceFilter,
        field: GroupField,
    ) -> Result<Vec<GroupCount>, StorageError> {
        let column = group_column(field);
        let rows: Vec<(String, i64)> = Entity::find()
            .select_only()
            .column(column)
            .column_as(Expr::col(Column::Id).count(), "count")
            .filter(condition(filter))
            .group_by(column)
            .order_by(Expr::col(Column::Id).count(), Order::Desc)
            .order_by(column, Order::Asc)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(read_failed)?;
        Ok(rows
            .into_iter()
            .map(|(key, count)| GroupCount {
                key,
                count: count.max(0) as u64,
            })
            .collect())
    }

    async fn totals(&self, filter: &InterfaceFilter) -> Result<NumericTotals, StorageError> {
        let row: Option<(i64, Option<i64>, Option<i64>)> = Entity::find()
            .select_only()
            .column_as(Expr::col(Column::Id).count(), "count")
            .column_as(Expr::col(Column::ExecutionTime).sum(), "total_execution_time")
            .column_as(
                Expr::col(Column::RecordsProcessed).sum(),
                "total_records_processed",
            )
            .filter(condition(filter))
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(read_failed)?;
        Ok(match row {
            Some((count, exec, records)) => NumericTotals {
                count: count.max(0) as u64,
                total_execution_time: exec.unwrap_or(0).max(0) as u64,
                total_records_processed: records.unwrap_or(0).max(0) as u64,
            },
            None => NumericTotals::default(),
        })
    }
}
