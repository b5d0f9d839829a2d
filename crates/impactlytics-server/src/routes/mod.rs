pub mod export;
pub mod health;
pub mod options;
pub mod report;
pub mod snapshot;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use impactlytics_core::{
    config::Config, report::rank_pages, AnalyticsTables, CoreError, Metric, PageFilter,
    ReportRequest,
};

use crate::{error::AppError, state::AppState};

/// Query string shared by the options, report and export endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionQuery {
    pub release_date: Option<String>,
    pub metric: Option<String>,
    pub page: Option<String>,
}

/// Parse `release_date` (default: configured default) and check it lies in
/// `[min_release_date, yesterday]`.
pub(crate) fn parse_release_date(raw: Option<&str>, config: &Config) -> Result<NaiveDate, AppError> {
    let date = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => config.default_release_date,
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| CoreError::InvalidDate(s.to_string()))?,
    };
    Ok(config.check_release_date(date)?)
}

/// Validate a full selection against the current tables.
///
/// The page must be `Aggregate` or one of the top pages for the chosen
/// release date and metric.
pub(crate) async fn resolve_selection(
    state: &AppState,
    query: &SelectionQuery,
) -> Result<(Arc<AnalyticsTables>, ReportRequest), AppError> {
    let release_date = parse_release_date(query.release_date.as_deref(), &state.config)?;
    let metric = Metric::parse(query.metric.as_deref())?;
    let page = PageFilter::parse(query.page.as_deref());

    let tables = state.tables().await?;
    if let PageFilter::Entity(path) = &page {
        let top = rank_pages(&tables, release_date, metric, &state.config.report);
        if !top.contains(path) {
            return Err(CoreError::UnknownPage(path.clone()).into());
        }
    }

    Ok((
        tables,
        ReportRequest {
            release_date,
            metric,
            page,
        },
    ))
}
