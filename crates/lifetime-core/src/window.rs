//! The merge-time window a report covers.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

use crate::error::{LifetimeError, Result};

/// Inclusive bounds on merge time. An absent `before` leaves the window open
/// up to the present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub after: DateTime<Utc>,
    pub before: Option<DateTime<Utc>>,
}

impl ReportWindow {
    pub fn new(after: DateTime<Utc>, before: Option<DateTime<Utc>>) -> Result<Self> {
        if let Some(before) = before {
            if before < after {
                return Err(LifetimeError::EmptyWindow {
                    after: after.to_rfc3339(),
                    before: before.to_rfc3339(),
                });
            }
        }
        Ok(Self { after, before })
    }

    /// Parse both bounds from user-supplied timestamps.
    pub fn parse(after: &str, before: Option<&str>) -> Result<Self> {
        let after = parse_timestamp(after)?;
        let before = before.map(parse_timestamp).transpose()?;
        Self::new(after, before)
    }

    /// The most recently completed UTC calendar day relative to `now`.
    ///
    /// Ends one nanosecond before midnight so a merge at exactly 00:00 belongs
    /// to the next day's window only.
    pub fn last_full_day(now: DateTime<Utc>) -> Self {
        let yesterday = now.date_naive() - Duration::days(1);
        let after = start_of_day(yesterday);
        Self {
            after,
            before: Some(after + Duration::days(1) - Duration::nanoseconds(1)),
        }
    }

    /// Whether a merge at `ts` falls inside the window (both ends inclusive).
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        if ts < self.after {
            return false;
        }
        match self.before {
            Some(before) => ts <= before,
            None => true,
        }
    }

    /// The `updated_after` query value GitLab expects.
    pub fn updated_after_param(&self) -> String {
        self.after.format("%Y-%m-%dT%H:%M:%S.0000Z").to_string()
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.before {
            Some(before) => write!(f, "{} to {}", self.after.to_rfc3339(), before.to_rfc3339()),
            None => write!(f, "{} to now", self.after.to_rfc3339()),
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Parse an ISO 8601 timestamp.
///
/// Accepts RFC 3339 with any offset, plus naive date-times and bare dates,
/// which are taken as UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(start_of_day)
        .map_err(|e| LifetimeError::Timestamp {
            input: input.to_string(),
            message: e.to_string(),
        })
}
