//! SeaORM entity model used by the database storage backend.
//!
//! Maps to the `interface_executions` table created by `database_storage`.
//! Enums are stored as their wire strings and timestamps as Unix
//! milliseconds so that range predicates and orderings stay numeric.

use sea_orm::entity::prelude::*;

/// Interface executions table entity model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "interface_executions")]
pub struct Model {
    /// UUID as string primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub interface_name: String,
    pub integration_key: String,
    /// `SUCCESS` | `FAILURE` | `PENDING` | `RUNNING`
    pub status: String,
    pub message: String,
    /// `LOW` | `MEDIUM` | `HIGH` | `CRITICAL`
    pub severity: String,
    /// Milliseconds
    pub execution_time: i64,
    pub records_processed: i64,
    pub source_system: String,
    pub target_system: String,
    /// Unix milliseconds
    pub created_at: i64,
    /// Unix milliseconds
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
