use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("metric must be one of: session_start, page_views, bounce_rate (got {0:?})")]
    InvalidMetric(String),

    #[error("unparseable date value: {0:?}")]
    InvalidDate(String),

    #[error("page {0:?} is not among the top pages for this selection")]
    UnknownPage(String),

    #[error("release_date {date} is outside the allowed range {min}..={max}")]
    ReleaseDateOutOfRange {
        date: NaiveDate,
        min: NaiveDate,
        max: NaiveDate,
    },
}
