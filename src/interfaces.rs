//! Interface execution domain.
//!
//! This module provides the core types describing one run of an HR system
//! integration job, together with the query and aggregation logic served by
//! the HTTP API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error_handling::types::ValidationError;

/// Submodule for record types and write-time validation.
pub mod record;
/// Submodule translating request parameters into store queries.
pub mod query_builder;
/// Submodule for CRUD orchestration over a `Storage` backend.
pub mod service;
/// Submodule computing time-windowed rollups.
pub mod summary;

pub use record::{InterfaceRecord, InterfaceUpdate, NewInterfaceRecord};

/// Outcome of an interface execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceStatus {
    Success,
    Failure,
    Pending,
    Running,
}

impl InterfaceStatus {
    pub const ALL: [InterfaceStatus; 4] = [
        InterfaceStatus::Success,
        InterfaceStatus::Failure,
        InterfaceStatus::Pending,
        InterfaceStatus::Running,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceStatus::Success => "SUCCESS",
            InterfaceStatus::Failure => "FAILURE",
            InterfaceStatus::Pending => "PENDING",
            InterfaceStatus::Running => "RUNNING",
        }
    }
}

impl FromStr for InterfaceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(InterfaceStatus::Success),
            "FAILURE" => Ok(InterfaceStatus::Failure),
            "PENDING" => Ok(InterfaceStatus::Pending),
            "RUNNING" => Ok(InterfaceStatus::Running),
            other => Err(ValidationError::invalid("status", other)),
        }
    }
}

impl fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business impact of a record, independent of its status.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(ValidationError::invalid("severity", other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_exact() {
        for status in InterfaceStatus::ALL {
            assert_eq!(status.as_str().parse::<InterfaceStatus>().unwrap(), status);
        }
        assert!("success".parse::<InterfaceStatus>().is_err());
        assert!("DONE".parse::<InterfaceStatus>().is_err());
    }

    #[test]
    fn test_severity_defaults_to_medium() {
        assert_eq!(Severity::default(), Severity::Medium);
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert!(serde_json::from_str::<Severity>("\"URGENT\"").is_err());
    }
}
