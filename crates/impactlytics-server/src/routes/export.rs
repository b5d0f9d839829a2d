use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};

use serde::Deserialize;

use impactlytics_core::{
    build_report,
    comparison::{ChannelComparisonRow, ComparisonTable, MetricValue},
    metric::Dimension,
};

use super::{resolve_selection, SelectionQuery};
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(flatten)]
    pub selection: SelectionQuery,
    /// `pages` (default) or `channels`.
    pub table: Option<String>,
}

/// `GET /api/report/export`: download a comparison table as CSV.
///
/// `table=pages` exports the metric comparison for the top pages;
/// `table=channels` exports the week-before/week-after channel table.
/// Response: `Content-Type: text/csv` with `Content-Disposition: attachment`.
#[tracing::instrument(skip(state))]
pub async fn export_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let table = query.table.as_deref().unwrap_or("pages");
    if table != "pages" && table != "channels" {
        return Err(AppError::BadRequest(format!(
            "unsupported table: {table}; expected 'pages' or 'channels'"
        )));
    }

    let (tables, request) = resolve_selection(&state, &query.selection).await?;
    let report = build_report(&tables, &request, &state.config.report);

    let (csv, filename) = if table == "channels" {
        (
            build_channel_csv(&report.channel_comparison)?,
            format!("impactlytics-channels-{}.csv", request.release_date),
        )
    } else {
        (
            build_csv(&report.comparison)?,
            format!(
                "impactlytics-{}-{}.csv",
                request.metric, request.release_date
            ),
        )
    };
    build_csv_response(&filename, Bytes::from(csv))
}

/// Sanitize a CSV field value against formula injection.
///
/// Spreadsheet apps interpret values that begin with `=`, `+`, `-`, `@`, TAB,
/// or CR as formula expressions. A leading single quote keeps them literal.
fn sanitize_csv_field(val: &str) -> Cow<'_, str> {
    if val.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        Cow::Owned(format!("'{val}"))
    } else {
        Cow::Borrowed(val)
    }
}

fn format_value(value: &MetricValue) -> String {
    match value {
        MetricValue::Count(n) => n.to_string(),
        MetricValue::Ratio(Some(r)) => format!("{r:.2}"),
        MetricValue::Ratio(None) => String::new(),
    }
}

fn build_csv(table: &ComparisonTable) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::with_capacity(table.rows.len() * 64));

    wtr.write_record([table.dimension_label, "before_release", "after_release"])
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    for row in &table.rows {
        let entity = sanitize_csv_field(&row.entity);
        let before = format_value(&row.before);
        let after = format_value(&row.after);
        wtr.write_record([entity.as_ref(), before.as_str(), after.as_str()])
            .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

fn build_channel_csv(rows: &[ChannelComparisonRow]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::with_capacity(rows.len() * 64));

    wtr.write_record([Dimension::Channel.label(), "week_before", "week_after"])
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;

    for row in rows {
        let channel = sanitize_csv_field(&row.channel);
        wtr.write_record([
            channel.as_ref(),
            row.week_before.to_string().as_str(),
            row.week_after.to_string().as_str(),
        ])
        .map_err(|e| anyhow::anyhow!("csv write_record failed: {e}"))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {e}"))
}

fn build_csv_response(filename: &str, csv_bytes: Bytes) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(axum::body::Body::from(csv_bytes))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("response build failed: {e}")))
}
