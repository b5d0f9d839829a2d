use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::record::normalize_path;

pub const VALID_METRICS: &[&str] = &["session_start", "page_views", "bounce_rate"];

/// Page selector value meaning "all pages".
pub const AGGREGATE: &str = "Aggregate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    SessionStart,
    PageViews,
    BounceRate,
}

impl Metric {
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        match raw.map(str::trim) {
            None | Some("") | Some("session_start") => Ok(Self::SessionStart),
            Some("page_views") => Ok(Self::PageViews),
            Some("bounce_rate") => Ok(Self::BounceRate),
            Some(other) => Err(CoreError::InvalidMetric(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::SessionStart => "session_start",
            Metric::PageViews => "page_views",
            Metric::BounceRate => "bounce_rate",
        }
    }

    /// Ratio metrics are aggregated as numerator and denominator separately.
    pub fn is_ratio(&self) -> bool {
        matches!(self, Metric::BounceRate)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Page,
    Channel,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Page => "Top pages",
            Dimension::Channel => "Channel Group",
        }
    }
}

/// Which slice of the data feeds the metric chart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageFilter {
    #[default]
    Aggregate,
    Entity(String),
}

impl PageFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Aggregate,
            Some(v) if v == AGGREGATE => Self::Aggregate,
            Some(v) => Self::Entity(normalize_path(v)),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            PageFilter::Aggregate => true,
            PageFilter::Entity(page) => page == key,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PageFilter::Aggregate => AGGREGATE,
            PageFilter::Entity(page) => page,
        }
    }
}

impl Serialize for PageFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
