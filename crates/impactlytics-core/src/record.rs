//! Raw analytics tables as loaded from the pipeline database.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Placeholder Google Analytics emits for a missing dimension value.
pub const NOT_SET: &str = "(not set)";

/// Daily session starts per landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub date: NaiveDate,
    pub landing_page: String,
    pub sessions: i64,
}

/// Daily page views and engaged sessions per page path.
///
/// Bounce rate is deliberately absent: it is derived as
/// `engaged_sessions / page_views` after summing both at whatever grouping
/// level is being reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewRecord {
    pub date: NaiveDate,
    pub page_path: String,
    pub page_views: i64,
    pub engaged_sessions: i64,
}

/// Daily active users per default channel group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub date: NaiveDate,
    pub channel_group: String,
    pub active_users: i64,
}

/// One immutable snapshot of the three source tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsTables {
    pub session_starts: Vec<SessionRecord>,
    pub page_views: Vec<PageViewRecord>,
    pub channels: Vec<ChannelRecord>,
}

impl AnalyticsTables {
    pub fn row_count(&self) -> usize {
        self.session_starts.len() + self.page_views.len() + self.channels.len()
    }
}

/// Append a trailing `/` so `/blog` and `/blog/` aggregate together.
pub fn normalize_path(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// `(not set)` arrives as `(not set)/` after normalization, hence the prefix match.
pub fn is_not_set(key: &str) -> bool {
    key.starts_with(NOT_SET)
}

/// Reduce a stored date or timestamp to a plain calendar date.
///
/// Values carrying an offset are converted to UTC before the time is dropped.
pub fn parse_record_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(ts.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts.date());
        }
    }
    Err(CoreError::InvalidDate(raw.to_string()))
}
