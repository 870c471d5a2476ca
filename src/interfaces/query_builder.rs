//! Translation of untrusted list-request parameters into a validated filter,
//! ordering and pagination window.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::{InterfaceStatus, Severity};
use crate::configuration::types::QueryConfig;
use crate::error_handling::types::ValidationError;
use crate::storage::types::{InterfaceFilter, SortField, SortOrder, SortSpec};

/// Look-back window selectable by the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    LastHour,
    #[default]
    LastDay,
    LastWeek,
    LastMonth,
}

impl TimeRange {
    pub fn duration(&self) -> Duration {
        match self {
            TimeRange::LastHour => Duration::hours(1),
            TimeRange::LastDay => Duration::hours(24),
            TimeRange::LastWeek => Duration::days(7),
            TimeRange::LastMonth => Duration::days(30),
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            TimeRange::LastHour => "1h",
            TimeRange::LastDay => "24h",
            TimeRange::LastWeek => "7d",
            TimeRange::LastMonth => "30d",
        }
    }

    /// Lenient parse: unrecognised or absent tokens fall back to 24h.
    pub fn parse_or_default(token: Option<&str>) -> Self {
        token.and_then(|t| t.parse().ok()).unwrap_or_default()
    }

    /// `[now - window, now]`
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - self.duration(), now)
    }
}

impl FromStr for TimeRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(TimeRange::LastHour),
            "24h" => Ok(TimeRange::LastDay),
            "7d" => Ok(TimeRange::LastWeek),
            "30d" => Ok(TimeRange::LastMonth),
            other => Err(ValidationError::invalid("timeRange", other)),
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Pagination metadata returned alongside a page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total_items: u64) -> Self {
        Self {
            current_page: page,
            total_pages: total_items.div_ceil(limit.max(1)),
            total_items,
            items_per_page: limit,
        }
    }
}

/// Validated list request.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceQuery {
    pub filter: InterfaceFilter,
    pub sort: SortSpec,
    /// 1-indexed
    pub page: u64,
    pub limit: u64,
}

impl InterfaceQuery {
    /// Offset of the first record of the page.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Builds a query from raw request parameters. Empty values count as
    /// absent; unknown keys are ignored.
    pub fn from_params(
        params: &HashMap<String, String>,
        config: &QueryConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let get = |key: &str| param(params, key);
        let text = |key: &str| param(params, key).map(str::to_string);

        let mut filter = InterfaceFilter {
            status: get("status").map(InterfaceStatus::from_str).transpose()?,
            severity: get("severity").map(Severity::from_str).transpose()?,
            interface_name: text("interfaceName"),
            integration_key: text("integrationKey"),
            source_system: text("sourceSystem"),
            target_system: text("targetSystem"),
            message: text("message"),
            keyword: text("keyword"),
            created_from: get("startDate")
                .map(|v| parse_date("startDate", v))
                .transpose()?,
            created_to: get("endDate").map(|v| parse_date("endDate", v)).transpose()?,
        };

        if let Some(token) = get("timeRange") {
            let (from, _) = token.parse::<TimeRange>()?.bounds(now);
            filter.created_from = Some(match filter.created_from {
                Some(start) => start.max(from),
                None => from,
            });
        }

        let sort = SortSpec {
            field: get("sortBy")
                .map(SortField::from_str)
                .transpose()?
                .unwrap_or(SortSpec::default().field),
            order: get("sortOrder")
                .map(SortOrder::from_str)
                .transpose()?
                .unwrap_or(SortSpec::default().order),
        };

        let page = get("page")
            .map(|v| positive("page", v))
            .transpose()?
            .unwrap_or(1);
        let limit = get("limit")
            .map(|v| positive("limit", v))
            .transpose()?
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        // Offsets are bound as signed 64-bit integers by the SQL backend.
        let offset_fits = (page - 1)
            .checked_mul(limit)
            .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !offset_fits {
            return Err(ValidationError::invalid("page", page.to_string()));
        }

        Ok(Self {
            filter,
            sort,
            page,
            limit,
        })
    }
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn positive(field: &str, value: &str) -> Result<u64, ValidationError> {
    match value.parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ValidationError::invalid(field, value)),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC) or `YYYY-MM-DD`
/// (UTC midnight).
pub fn parse_date(field: &str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(ValidationError::invalid(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn build(pairs: &[(&str, &str)]) -> Result<InterfaceQuery, ValidationError> {
        InterfaceQuery::from_params(&params(pairs), &QueryConfig::default(), Utc::now())
    }

    #[test]
    fn test_defaults() {
        let q = build(&[]).unwrap();
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 50);
        assert_eq!(q.skip(), 0);
        assert_eq!(q.sort, SortSpec::default());
        assert_eq!(q.filter, InterfaceFilter::default());
    }

    #[test]
    fn test_filters_and_sort() {
        let q = build(&[
            ("status", "FAILURE"),
            ("severity", "HIGH"),
            ("interfaceName", " payroll "),
            ("sourceSystem", ""),
            ("sortBy", "executionTime"),
            ("sortOrder", "asc"),
            ("page", "3"),
            ("limit", "20"),
            ("somethingElse", "ignored"),
        ])
        .unwrap();
        assert_eq!(q.filter.status, Some(InterfaceStatus::Failure));
        assert_eq!(q.filter.severity, Some(Severity::High));
        assert_eq!(q.filter.interface_name.as_deref(), Some("payroll"));
        assert_eq!(q.filter.source_system, None);
        assert_eq!(q.sort.field, SortField::ExecutionTime);
        assert_eq!(q.sort.order, SortOrder::Asc);
        assert_eq!(q.skip(), 40);
    }

    #[test]
    fn test_rejects_untrusted_values() {
        for pairs in [
            [("status", "success")],
            [("severity", "URGENT")],
            [("sortBy", "password")],
            [("sortOrder", "sideways")],
            [("page", "0")],
            [("page", "-2")],
            [("limit", "abc")],
            [("startDate", "yesterday")],
            [("timeRange", "2w")],
        ] {
            assert!(build(&pairs).is_err(), "{:?}", pairs);
        }
    }

    #[test]
    fn test_page_offset_must_fit_signed_range() {
        assert_eq!(
            build(&[("page", "10000000000000000"), ("limit", "1000")]).unwrap_err(),
            ValidationError::invalid("page", "10000000000000000")
        );
        assert!(build(&[("page", "18446744073709551615")]).is_err());
        let q = build(&[("page", "1000000"), ("limit", "1000")]).unwrap();
        assert_eq!(q.skip(), 999_999_000);
    }

    #[test]
    fn test_limit_is_clamped() {
        let q = build(&[("limit", "100000")]).unwrap();
        assert_eq!(q.limit, QueryConfig::default().max_page_size);
    }

    #[test]
    fn test_date_formats() {
        let q = build(&[
            ("startDate", "2024-03-01"),
            ("endDate", "2024-03-02T12:30:00+02:00"),
        ])
        .unwrap();
        assert_eq!(
            q.filter.created_from.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert_eq!(
            q.filter.created_to.unwrap().to_rfc3339(),
            "2024-03-02T10:30:00+00:00"
        );
        assert!(parse_date("endDate", "2024-03-02T10:30:00.250").is_ok());
    }

    #[test]
    fn test_time_range_narrows_start_date() {
        let now = Utc::now();
        let q = InterfaceQuery::from_params(
            &params(&[("timeRange", "1h"), ("startDate", "2020-01-01")]),
            &QueryConfig::default(),
            now,
        )
        .unwrap();
        assert_eq!(q.filter.created_from, Some(now - Duration::hours(1)));
    }

    #[test]
    fn test_time_range_tokens() {
        assert_eq!(TimeRange::parse_or_default(Some("7d")), TimeRange::LastWeek);
        assert_eq!(TimeRange::parse_or_default(Some("bogus")), TimeRange::LastDay);
        assert_eq!(TimeRange::parse_or_default(None), TimeRange::LastDay);
        assert_eq!(TimeRange::LastMonth.duration(), Duration::days(30));
        assert_eq!(TimeRange::LastHour.to_string(), "1h");
    }

    #[test]
    fn test_pagination_arithmetic() {
        assert_eq!(Pagination::new(1, 50, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 50, 50).total_pages, 1);
        assert_eq!(Pagination::new(2, 50, 51).total_pages, 2);
        assert_eq!(Pagination::new(1, 7, 100).total_pages, 15);
    }
}
