//! Helpers for building and evaluating `InterfaceFilter` values.
//!
//! Backends that cannot push predicates down to a query engine evaluate
//! filters and orderings in memory with the functions below.

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

pub use crate::storage::types::InterfaceFilter;
use crate::interfaces::{InterfaceRecord, InterfaceStatus};
use crate::storage::types::{SortField, SortOrder, SortSpec};

/// Build an `InterfaceFilter` matching records created in `[from, to]`.
pub fn created_between(from: DateTime<Utc>, to: DateTime<Utc>) -> InterfaceFilter {
    InterfaceFilter {
        created_from: Some(from),
        created_to: Some(to),
        ..Default::default()
    }
}

/// Build an `InterfaceFilter` matching records with the exact status.
pub fn by_status(status: InterfaceStatus) -> InterfaceFilter {
    InterfaceFilter {
        status: Some(status),
        ..Default::default()
    }
}

fn contains_matcher(needle: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Filter compiled for repeated in-memory evaluation.
pub struct CompiledFilter {
    filter: InterfaceFilter,
    interface_name: Option<Regex>,
    integration_key: Option<Regex>,
    source_system: Option<Regex>,
    target_system: Option<Regex>,
    message: Option<Regex>,
    keyword: Option<Regex>,
}

impl CompiledFilter {
    pub fn new(filter: &InterfaceFilter) -> Self {
        let compile = |s: &Option<String>| s.as_deref().and_then(contains_matcher);
        Self {
            interface_name: compile(&filter.interface_name),
            integration_key: compile(&filter.integration_key),
            source_system: compile(&filter.source_system),
            target_system: compile(&filter.target_system),
            message: compile(&filter.message),
            keyword: compile(&filter.keyword),
            filter: filter.clone(),
        }
    }

    pub fn matches(&self, record: &InterfaceRecord) -> bool {
        let f = &self.filter;
        if let Some(status) = f.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(severity) = f.severity {
            if record.severity != severity {
                return false;
            }
        }
        let text_checks = [
            (&self.interface_name, record.interface_name.as_str()),
            (&self.integration_key, record.integration_key.as_str()),
            (&self.source_system, record.source_system.as_str()),
            (&self.target_system, record.target_system.as_str()),
            (&self.message, record.message.as_str()),
        ];
        for (matcher, value) in text_checks {
            if let Some(re) = matcher {
                if !re.is_match(value) {
                    return false;
                }
            }
        }
        if let Some(re) = &self.keyword {
            if !re.is_match(&record.message) && !re.is_match(&record.integration_key) {
                return false;
            }
        }
        if let Some(from) = f.created_from {
            if record.created_at < from {
                return false;
            }
        }
        if let Some(to) = f.created_to {
            if record.created_at > to {
                return false;
            }
        }
        true
    }
}

/// Orders two records by `sort`, breaking ties on id.
pub fn compare_records(a: &InterfaceRecord, b: &InterfaceRecord, sort: SortSpec) -> Ordering {
    let primary = match sort.field {
        SortField::Id => Ordering::Equal,
        SortField::InterfaceName => a.interface_name.cmp(&b.interface_name),
        SortField::IntegrationKey => a.integration_key.cmp(&b.integration_key),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::Message => a.message.cmp(&b.message),
        SortField::Severity => a.severity.as_str().cmp(b.severity.as_str()),
        SortField::ExecutionTime => a.execution_time.cmp(&b.execution_time),
        SortField::RecordsProcessed => a.records_processed.cmp(&b.records_processed),
        SortField::SourceSystem => a.source_system.cmp(&b.source_system),
        SortField::TargetSystem => a.target_system.cmp(&b.target_system),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    let by_id = a.id.to_string().cmp(&b.id.to_string());
    match (sort.field, sort.order) {
        (SortField::Id, SortOrder::Desc) => by_id.reverse(),
        (SortField::Id, SortOrder::Asc) => by_id,
        (_, SortOrder::Asc) => primary.then(by_id),
        (_, SortOrder::Desc) => primary.reverse().then(by_id),
    }
}
