//! Interface execution records and the write-time validation applied to
//! caller-supplied payloads.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{InterfaceStatus, Severity};
use crate::error_handling::types::ValidationError;

/// One entry per integration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceRecord {
    pub id: Uuid,
    pub interface_name: String,
    pub integration_key: String,
    pub status: InterfaceStatus,
    pub message: String,
    pub severity: Severity,
    /// Milliseconds
    pub execution_time: u64,
    pub records_processed: u64,
    pub source_system: String,
    pub target_system: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Drops sub-millisecond precision so that every backend round-trips the
/// same instant.
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

/// Validated payload for a record about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInterfaceRecord {
    pub interface_name: String,
    pub integration_key: String,
    pub status: InterfaceStatus,
    pub message: String,
    pub severity: Severity,
    pub execution_time: u64,
    pub records_processed: u64,
    pub source_system: String,
    pub target_system: String,
}

// Wire shape of a create body. Unknown keys (including `id` and the
// timestamps) are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody {
    interface_name: Option<String>,
    integration_key: Option<String>,
    status: Option<String>,
    message: Option<String>,
    severity: Option<String>,
    execution_time: Option<i64>,
    records_processed: Option<i64>,
    source_system: Option<String>,
    target_system: Option<String>,
}

// Wire shape of an update body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UpdateBody {
    interface_name: Option<String>,
    integration_key: Option<String>,
    status: Option<String>,
    message: Option<String>,
    severity: Option<String>,
    execution_time: Option<i64>,
    records_processed: Option<i64>,
    source_system: Option<String>,
    target_system: Option<String>,
}

fn required_text(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        None => Err(ValidationError::MissingField(field.to_string())),
        Some(v) => non_empty(field, v),
    }
}

fn non_empty(field: &str, value: String) -> Result<String, ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field.to_string()))
    } else {
        Ok(value)
    }
}

/// Upper bound for `executionTime` and `recordsProcessed` (2^53 - 1, the
/// largest integer a JSON number carries exactly).
pub const MAX_COUNTER: u64 = (1 << 53) - 1;

fn non_negative(field: &str, value: i64) -> Result<u64, ValidationError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_COUNTER)
        .ok_or_else(|| ValidationError::invalid(field, value.to_string()))
}

fn ensure_object(body: &Value) -> Result<(), ValidationError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(ValidationError::Malformed(
            "request body must be a JSON object".to_string(),
        ))
    }
}

impl NewInterfaceRecord {
    /// Validates a JSON create body.
    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        ensure_object(&body)?;
        let raw: CreateBody =
            serde_json::from_value(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;

        let status: InterfaceStatus = match raw.status {
            Some(s) => s.parse()?,
            None => return Err(ValidationError::MissingField("status".to_string())),
        };
        let severity: Severity = match raw.severity {
            Some(s) => s.parse()?,
            None => Severity::default(),
        };

        Ok(Self {
            interface_name: required_text("interfaceName", raw.interface_name)?,
            integration_key: required_text("integrationKey", raw.integration_key)?,
            status,
            message: required_text("message", raw.message)?,
            severity,
            execution_time: non_negative("executionTime", raw.execution_time.unwrap_or(0))?,
            records_processed: non_negative(
                "recordsProcessed",
                raw.records_processed.unwrap_or(0),
            )?,
            source_system: required_text("sourceSystem", raw.source_system)?,
            target_system: required_text("targetSystem", raw.target_system)?,
        })
    }

    /// Builds the stored record, stamping both timestamps with `now`.
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> InterfaceRecord {
        let now = truncate_to_millis(now);
        InterfaceRecord {
            id,
            interface_name: self.interface_name,
            integration_key: self.integration_key,
            status: self.status,
            message: self.message,
            severity: self.severity,
            execution_time: self.execution_time,
            records_processed: self.records_processed,
            source_system: self.source_system,
            target_system: self.target_system,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceUpdate {
    pub interface_name: Option<String>,
    pub integration_key: Option<String>,
    pub status: Option<InterfaceStatus>,
    pub message: Option<String>,
    pub severity: Option<Severity>,
    pub execution_time: Option<u64>,
    pub records_processed: Option<u64>,
    pub source_system: Option<String>,
    pub target_system: Option<String>,
}

impl InterfaceUpdate {
    /// Validates a JSON update body. Fields outside the record's mutable set
    /// are rejected.
    pub fn from_json(body: Value) -> Result<Self, ValidationError> {
        ensure_object(&body)?;
        if let Some(obj) = body.as_object() {
            for key in ["id", "_id", "createdAt", "updatedAt"] {
                if obj.contains_key(key) {
                    return Err(ValidationError::UnknownField(key.to_string()));
                }
            }
        }
        let raw: UpdateBody =
            serde_json::from_value(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;

        Ok(Self {
            interface_name: raw
                .interface_name
                .map(|v| non_empty("interfaceName", v))
                .transpose()?,
            integration_key: raw
                .integration_key
                .map(|v| non_empty("integrationKey", v))
                .transpose()?,
            status: raw.status.map(|s| s.parse::<InterfaceStatus>()).transpose()?,
            message: raw.message.map(|v| non_empty("message", v)).transpose()?,
            severity: raw.severity.map(|s| s.parse::<Severity>()).transpose()?,
            execution_time: raw
                .execution_time
                .map(|v| non_negative("executionTime", v))
                .transpose()?,
            records_processed: raw
                .records_processed
                .map(|v| non_negative("recordsProcessed", v))
                .transpose()?,
            source_system: raw
                .source_system
                .map(|v| non_empty("sourceSystem", v))
                .transpose()?,
            target_system: raw
                .target_system
                .map(|v| non_empty("targetSystem", v))
                .transpose()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == InterfaceUpdate::default()
    }

    /// Applies the update in place. `updated_at` always moves forward, even
    /// when two writes land within the same millisecond.
    pub fn apply(&self, record: &mut InterfaceRecord, now: DateTime<Utc>) {
        if let Some(v) = &self.interface_name {
            record.interface_name = v.clone();
        }
        if let Some(v) = &self.integration_key {
            record.integration_key = v.clone();
        }
        if let Some(v) = self.status {
            record.status = v;
        }
        if let Some(v) = &self.message {
            record.message = v.clone();
        }
        if let Some(v) = self.severity {
            record.severity = v;
        }
        if let Some(v) = self.execution_time {
            record.execution_time = v;
        }
        if let Some(v) = self.records_processed {
            record.records_processed = v;
        }
        if let Some(v) = &self.source_system {
            record.source_system = v.clone();
        }
        if let Some(v) = &self.target_system {
            record.target_system = v.clone();
        }
        let floor = record.updated_at + Duration::milliseconds(1);
        record.updated_at = truncate_to_millis(now).max(floor);
    }
}
