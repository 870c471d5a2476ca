use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error_handling::types::ValidationError;
use crate::interfaces::{InterfaceStatus, Severity};

/// Conjunction of optional predicates over interface records.
///
/// Text predicates are case-insensitive "contains" matches. The file backend
/// folds case with Unicode rules; SQLite's `lower()` folds ASCII letters only,
/// so non-ASCII text may match differently between backends. `keyword`
/// matches when either `message` or `integration_key` contains it. Date
/// bounds are inclusive on `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceFilter {
    pub status: Option<InterfaceStatus>,
    pub severity: Option<Severity>,
    pub interface_name: Option<String>,
    pub integration_key: Option<String>,
    pub source_system: Option<String>,
    pub target_system: Option<String>,
    pub message: Option<String>,
    pub keyword: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    InterfaceName,
    IntegrationKey,
    Status,
    Message,
    Severity,
    ExecutionTime,
    RecordsProcessed,
    SourceSystem,
    TargetSystem,
    CreatedAt,
    UpdatedAt,
}

impl FromStr for SortField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "interfaceName" => Ok(SortField::InterfaceName),
            "integrationKey" => Ok(SortField::IntegrationKey),
            "status" => Ok(SortField::Status),
            "message" => Ok(SortField::Message),
            "severity" => Ok(SortField::Severity),
            "executionTime" => Ok(SortField::ExecutionTime),
            "recordsProcessed" => Ok(SortField::RecordsProcessed),
            "sourceSystem" => Ok(SortField::SourceSystem),
            "targetSystem" => Ok(SortField::TargetSystem),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            other => Err(ValidationError::invalid("sortBy", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ValidationError::invalid("sortOrder", other)),
        }
    }
}

/// Single-field ordering. Backends break ties on `id` ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// Fields supported by grouped counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Status,
    Severity,
    InterfaceName,
}

/// One bucket of a grouped count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: u64,
}

/// Scalar rollup over the numeric fields of the matching records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NumericTotals {
    pub count: u64,
    pub total_execution_time: u64,
    pub total_records_processed: u64,
}

impl NumericTotals {
    pub fn avg_execution_time(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_execution_time as f64 / self.count as f64
        }
    }
}
