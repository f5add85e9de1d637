//! # Query Filter
//!
//! The pagination marker set of list operations travels as one `QueryFilter`.
//! `QueryValues` accumulates query pairs and always encodes them in key order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Query key of free-text search.
pub const QUERY_KEY_SEARCH: &str = "q";

/// Page size used when none is requested.
pub const DEFAULT_QUERY_FILTER_LIMIT: u8 = 50;

/// Largest page size honoured.
pub const MAX_QUERY_FILTER_LIMIT: u8 = 250;

const LIMIT_KEY: &str = "limit";
const PAGE_KEY: &str = "page";
const SORT_BY_KEY: &str = "sortBy";
const CREATED_BEFORE_KEY: &str = "createdBefore";
const CREATED_AFTER_KEY: &str = "createdAfter";
const UPDATED_BEFORE_KEY: &str = "updatedBefore";
const UPDATED_AFTER_KEY: &str = "updatedAfter";
const INCLUDE_ARCHIVED_KEY: &str = "includeArchived";

/// Sort direction on creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    /// Oldest first.
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Newest first.
    #[serde(rename = "desc")]
    Descending,
}

impl SortBy {
    /// Wire token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Filter carried by every list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryFilter {
    /// 1-based page.
    pub page: u64,
    /// Page size.
    pub limit: u8,
    /// Only rows created before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Only rows created after this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Only rows updated before this instant.
    pub updated_before: Option<DateTime<Utc>>,
    /// Only rows updated after this instant.
    pub updated_after: Option<DateTime<Utc>>,
    /// Sort direction.
    pub sort_by: SortBy,
    /// Include soft-deleted rows.
    pub include_archived: Option<bool>,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_QUERY_FILTER_LIMIT,
            created_before: None,
            created_after: None,
            updated_before: None,
            updated_after: None,
            sort_by: SortBy::Ascending,
            include_archived: None,
        }
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

impl QueryFilter {
    /// Parses a filter from a raw query string; unknown keys and malformed values are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut filter = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PAGE_KEY => {
                    if let Ok(page) = value.parse::<u64>() {
                        filter.page = page.max(1);
                    }
                }
                LIMIT_KEY => {
                    if let Ok(limit) = value.parse::<u64>() {
                        filter.limit = limit.clamp(1, MAX_QUERY_FILTER_LIMIT as u64) as u8;
                    }
                }
                SORT_BY_KEY => {
                    if value == "desc" {
                        filter.sort_by = SortBy::Descending;
                    }
                }
                CREATED_BEFORE_KEY => filter.created_before = parse_timestamp(&value),
                CREATED_AFTER_KEY => filter.created_after = parse_timestamp(&value),
                UPDATED_BEFORE_KEY => filter.updated_before = parse_timestamp(&value),
                UPDATED_AFTER_KEY => filter.updated_after = parse_timestamp(&value),
                INCLUDE_ARCHIVED_KEY => filter.include_archived = value.parse().ok(),
                _ => {}
            }
        }
        filter
    }

    /// Rows to skip for the current page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(u64::from(self.limit))
    }

    /// The query pairs of this filter; unset optional bounds are omitted.
    pub fn to_values(&self) -> QueryValues {
        let mut values = QueryValues::new();
        values.set(LIMIT_KEY, self.limit.to_string());
        values.set(PAGE_KEY, self.page.to_string());
        values.set(SORT_BY_KEY, self.sort_by.as_str());
        let bounds = [
            (CREATED_BEFORE_KEY, &self.created_before),
            (CREATED_AFTER_KEY, &self.created_after),
            (UPDATED_BEFORE_KEY, &self.updated_before),
            (UPDATED_AFTER_KEY, &self.updated_after),
        ];
        for (key, bound) in bounds {
            if let Some(bound) = bound {
                values.set(key, timestamp(bound));
            }
        }
        if let Some(include_archived) = self.include_archived {
            values.set(INCLUDE_ARCHIVED_KEY, include_archived.to_string());
        }
        values
    }
}

/// Ordered query pair accumulator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues {
    pairs: BTreeMap<String, String>,
}

impl QueryValues {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.pairs.insert(key.to_string(), value.into());
    }

    /// Reads `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// True when no pairs are set.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` rendering, keys sorted.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_filter_encoding() {
        assert_eq!(
            QueryFilter::default().to_values().encode(),
            "limit=50&page=1&sortBy=asc"
        );
    }

    #[test]
    fn test_extra_values_sort_into_place() {
        let mut values = QueryFilter::default().to_values();
        values.set(QUERY_KEY_SEARCH, "tom ato");
        values.set("includeVotes", true.to_string());
        assert_eq!(
            values.encode(),
            "includeVotes=true&limit=50&page=1&q=tom+ato&sortBy=asc"
        );
    }

    #[test]
    fn test_bounds_are_rfc3339() {
        let filter = QueryFilter {
            created_after: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            include_archived: Some(true),
            ..Default::default()
        };
        let values = filter.to_values();
        assert_eq!(values.get("createdAfter"), Some("2024-01-02T03:04:05Z"));
        assert_eq!(values.get("includeArchived"), Some("true"));
    }

    #[test]
    fn test_parsing_round_trips_and_clamps() {
        let filter = QueryFilter::from_query(
            "page=3&limit=9000&sortBy=desc&createdAfter=2024-01-02T03:04:05Z&bogus=1",
        );
        assert_eq!(filter.page, 3);
        assert_eq!(filter.limit, MAX_QUERY_FILTER_LIMIT);
        assert_eq!(filter.sort_by, SortBy::Descending);
        assert!(filter.created_after.is_some());
        assert_eq!(filter.offset(), 500);
        assert_eq!(QueryFilter::from_query(""), QueryFilter::default());
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        let filter = QueryFilter::from_query("page=18446744073709551615");
        assert_eq!(filter.page, u64::MAX);
        assert_eq!(filter.offset(), u64::MAX);
    }
}
