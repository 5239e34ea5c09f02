use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Name of the query parameter carrying the requested timezones
pub const TIMEZONE_QUERY_PARAM: &str = "tz";

/// Set of timezone names requested by a single call
///
/// Names are kept verbatim (no trimming) and deduplicated. An ordered set is
/// used so resolution happens in a stable, lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeZoneRequest {
    zones: BTreeSet<String>,
}

impl TimeZoneRequest {
    /// Build a request from a raw (still percent-encoded) query string
    ///
    /// Only the first `tz` parameter is honoured. A missing query, a missing
    /// parameter and an empty parameter value all produce an empty request.
    pub fn from_query(query: Option<&str>) -> Self {
        let Some(query) = query else {
            return Self::default();
        };

        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == TIMEZONE_QUERY_PARAM)
            .map(|(_, value)| Self::from_param(&value))
            .unwrap_or_default()
    }

    /// Build a request from a decoded, comma separated parameter value
    pub fn from_param(value: &str) -> Self {
        if value.is_empty() {
            return Self::default();
        }

        Self {
            zones: value.split(',').map(str::to_string).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(String::as_str)
    }
}

/// Formatted current time keyed by timezone name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeZoneReport {
    /// Timezone name (or `UTC` when none were requested) to timestamp
    pub timezones: BTreeMap<String, String>,
}

impl TimeZoneReport {
    pub fn insert(&mut self, zone: impl Into<String>, timestamp: String) {
        self.timezones.insert(zone.into(), timestamp);
    }
}
