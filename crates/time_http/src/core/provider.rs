use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::core::{
    error::{TimeServerError, TimeServerResult},
    models::{TimeZoneReport, TimeZoneRequest},
    utils::{self, UTC_KEY},
};

/// Source of the current instant
pub type Clock = fn() -> DateTime<Utc>;

/// Time server implementation
///
/// Holds no per-request state; every call builds its own report.
#[derive(Clone, Copy)]
pub struct TimeServer {
    pub(crate) clock: Clock,
}

impl TimeServer {
    pub fn new() -> Self {
        Self { clock: Utc::now }
    }

    /// Resolve an IANA name; the empty name resolves to UTC
    pub(crate) fn parse_timezone(&self, timezone_name: &str) -> TimeServerResult<Tz> {
        if timezone_name.is_empty() {
            return Ok(Tz::UTC);
        }

        Tz::from_str(timezone_name).map_err(|_| TimeServerError::InvalidTimezone {
            timezone: timezone_name.to_string(),
        })
    }

    /// Report the current time for every requested zone
    pub fn current_time(&self, request: &TimeZoneRequest) -> TimeServerResult<TimeZoneReport> {
        self.time_at(request, (self.clock)())
    }

    /// Report `now` for every requested zone
    ///
    /// An empty request yields a single `UTC` entry. The first name that fails
    /// to resolve aborts the whole report.
    pub fn time_at(
        &self,
        request: &TimeZoneRequest,
        now: DateTime<Utc>,
    ) -> TimeServerResult<TimeZoneReport> {
        let mut report = TimeZoneReport::default();

        if request.is_empty() {
            report.insert(UTC_KEY, utils::format_rfc822(&now));
            return Ok(report);
        }

        for zone_name in request.iter() {
            let timezone = self.parse_timezone(zone_name)?;
            report.insert(zone_name, utils::format_zoned(&now.with_timezone(&timezone)));
        }

        Ok(report)
    }
}

impl Default for TimeServer {
    fn default() -> Self {
        Self::new()
    }
}
