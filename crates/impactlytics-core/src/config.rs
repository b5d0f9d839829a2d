use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;
use crate::report::ReportOptions;

/// Release date of the article the dashboard was first built around.
pub const DEFAULT_RELEASE_DATE: &str = "2023-03-09";

pub const DEFAULT_SEARCH_PATH: &str = "dlt_google_analytics_pipeline.dlt_google_analytics_data";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Path of the DuckDB file written by the upstream Google Analytics pipeline.
    pub db_path: String,
    /// Schema search path applied on open so the three tables resolve unqualified.
    pub search_path: String,
    pub duckdb_memory_limit: String,
    pub cache_ttl_secs: u64,
    pub min_release_date: NaiveDate,
    pub default_release_date: NaiveDate,
    pub timezone: Tz,
    pub cors_origins: Vec<String>,
    pub report: ReportOptions,
}

fn parse_date_var(name: &str, default: &str) -> Result<NaiveDate, String> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid {name} (expected YYYY-MM-DD): {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let min_release_date = parse_date_var("IMPACTLYTICS_MIN_RELEASE_DATE", DEFAULT_RELEASE_DATE)?;
        let default_release_date =
            parse_date_var("IMPACTLYTICS_DEFAULT_RELEASE_DATE", DEFAULT_RELEASE_DATE)?;
        if default_release_date < min_release_date {
            return Err(
                "IMPACTLYTICS_DEFAULT_RELEASE_DATE must not precede IMPACTLYTICS_MIN_RELEASE_DATE"
                    .to_string(),
            );
        }

        Ok(Self {
            port: std::env::var("IMPACTLYTICS_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            db_path: std::env::var("IMPACTLYTICS_DB_PATH")
                .unwrap_or_else(|_| "dlt_google_analytics_pipeline.duckdb".to_string()),
            search_path: std::env::var("IMPACTLYTICS_SEARCH_PATH")
                .unwrap_or_else(|_| DEFAULT_SEARCH_PATH.to_string()),
            duckdb_memory_limit: std::env::var("IMPACTLYTICS_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
            cache_ttl_secs: std::env::var("IMPACTLYTICS_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86_400),
            min_release_date,
            default_release_date,
            timezone: std::env::var("IMPACTLYTICS_TIMEZONE")
                .unwrap_or_else(|_| "UTC".to_string())
                .parse::<Tz>()
                .map_err(|e| format!("invalid IMPACTLYTICS_TIMEZONE: {e}"))?,
            cors_origins: std::env::var("IMPACTLYTICS_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            report: ReportOptions {
                top_n: std::env::var("IMPACTLYTICS_TOP_N")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                ..ReportOptions::default()
            },
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Latest selectable release date: yesterday in the configured timezone.
    pub fn max_release_date(&self) -> NaiveDate {
        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        today - chrono::Duration::days(1)
    }

    /// Reject release dates outside `[min_release_date, yesterday]`.
    pub fn check_release_date(&self, date: NaiveDate) -> Result<NaiveDate, CoreError> {
        let max = self.max_release_date();
        if date < self.min_release_date || date > max {
            return Err(CoreError::ReleaseDateOutOfRange {
                date,
                min: self.min_release_date,
                max,
            });
        }
        Ok(date)
    }
}
