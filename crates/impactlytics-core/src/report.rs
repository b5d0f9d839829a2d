//! One render of the release-impact dashboard as a pure function of its inputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::comparison::{
    channel_week_comparison, ratio_comparison, sum_comparison, ChannelComparisonRow,
    ComparisonTable,
};
use crate::metric::{Dimension, Metric, PageFilter, AGGREGATE};
use crate::ranking::{top_entities, DEFAULT_TOP_N};
use crate::record::{AnalyticsTables, PageViewRecord, SessionRecord};
use crate::series::{
    channel_weekly_bars, daily_series, weekly_ratio_series, ChannelBar, DailyPoint, WeeklyPoint,
};
use crate::trend::DAILY_PERIOD;
use crate::window::{
    apply_window, Flagged, ReleaseWindow, DEFAULT_CHANNEL_WINDOW_DAYS, DEFAULT_WINDOW_DAYS,
};

pub const RELEASE_LABEL: &str = "Article release";
pub const CHANNEL_CHART_TITLE: &str = "Weekly active users by session default channel group";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub top_n: usize,
    pub window_days: i64,
    pub channel_window_days: i64,
    pub trend_period: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            window_days: DEFAULT_WINDOW_DAYS,
            channel_window_days: DEFAULT_CHANNEL_WINDOW_DAYS,
            trend_period: DAILY_PERIOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub release_date: NaiveDate,
    pub metric: Metric,
    pub page: PageFilter,
}

/// Vertical marker drawn at the release date; `y` positions the label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseMarker {
    pub date: NaiveDate,
    pub label: &'static str,
    pub y: f64,
}

impl ReleaseMarker {
    fn at(date: NaiveDate, y: f64) -> Self {
        Self {
            date,
            label: RELEASE_LABEL,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricChart {
    Daily {
        title: String,
        points: Vec<DailyPoint>,
        marker: ReleaseMarker,
    },
    Weekly {
        title: String,
        points: Vec<WeeklyPoint>,
        marker: ReleaseMarker,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelChart {
    pub title: &'static str,
    pub bars: Vec<ChannelBar>,
    pub marker: ReleaseMarker,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub window: ReleaseWindow,
    pub metric: Metric,
    pub page: PageFilter,
    pub top_entities: Vec<String>,
    pub comparison: ComparisonTable,
    pub metric_chart: MetricChart,
    pub channel_comparison: Vec<ChannelComparisonRow>,
    pub channel_chart: ChannelChart,
}

/// A windowed row reduced to what additive metrics need.
struct Keyed<'a> {
    key: &'a str,
    date: NaiveDate,
    post_release: bool,
    value: i64,
}

/// Window whichever table backs `metric`; the other side stays empty.
fn windowed(
    tables: &AnalyticsTables,
    window: &ReleaseWindow,
    metric: Metric,
) -> (Vec<Flagged<SessionRecord>>, Vec<Flagged<PageViewRecord>>) {
    match metric {
        Metric::SessionStart => (apply_window(&tables.session_starts, window), Vec::new()),
        Metric::PageViews | Metric::BounceRate => {
            (Vec::new(), apply_window(&tables.page_views, window))
        }
    }
}

fn keyed_rows<'a>(
    metric: Metric,
    sessions: &'a [Flagged<SessionRecord>],
    views: &'a [Flagged<PageViewRecord>],
) -> Vec<Keyed<'a>> {
    match metric {
        Metric::SessionStart => sessions
            .iter()
            .map(|f| Keyed {
                key: f.record.landing_page.as_str(),
                date: f.record.date,
                post_release: f.post_release,
                value: f.record.sessions,
            })
            .collect(),
        Metric::PageViews | Metric::BounceRate => views
            .iter()
            .map(|f| Keyed {
                key: f.record.page_path.as_str(),
                date: f.record.date,
                post_release: f.post_release,
                value: f.record.page_views,
            })
            .collect(),
    }
}

fn chart_title(prefix: &str, metric: Metric, page: &PageFilter) -> String {
    match page {
        PageFilter::Aggregate => format!("{prefix} {metric} site-wide"),
        PageFilter::Entity(p) => format!("{prefix} {metric} for {p}"),
    }
}

/// Top pages for a metric inside the release window.
///
/// Bounce rate ranks pages by page views, the ratio's denominator.
pub fn rank_pages(
    tables: &AnalyticsTables,
    release_date: NaiveDate,
    metric: Metric,
    options: &ReportOptions,
) -> Vec<String> {
    let window = ReleaseWindow::new(release_date, options.window_days, options.channel_window_days);
    let (sessions, views) = windowed(tables, &window, metric);
    let rows = keyed_rows(metric, &sessions, &views);
    top_entities(rows.iter().map(|r| (r.key, r.value)), options.top_n)
}

/// Entries for the page selector: `Aggregate` followed by the top pages.
pub fn page_options(
    tables: &AnalyticsTables,
    release_date: NaiveDate,
    metric: Metric,
    options: &ReportOptions,
) -> Vec<String> {
    std::iter::once(AGGREGATE.to_string())
        .chain(rank_pages(tables, release_date, metric, options))
        .collect()
}

/// Build every table and chart for one selection.
///
/// Pure: identical inputs always produce an identical report.
pub fn build_report(
    tables: &AnalyticsTables,
    request: &ReportRequest,
    options: &ReportOptions,
) -> Report {
    let window = ReleaseWindow::new(
        request.release_date,
        options.window_days,
        options.channel_window_days,
    );
    let metric = request.metric;
    let page = &request.page;

    let (sessions, views) = windowed(tables, &window, metric);
    let rows = keyed_rows(metric, &sessions, &views);
    let top = top_entities(rows.iter().map(|r| (r.key, r.value)), options.top_n);

    let (comparison, metric_chart) = if metric.is_ratio() {
        let comparison = ratio_comparison(
            views.iter().map(|f| {
                (
                    f.record.page_path.as_str(),
                    f.post_release,
                    f.record.engaged_sessions,
                    f.record.page_views,
                )
            }),
            &top,
            metric,
            Dimension::Page,
        );
        let points = weekly_ratio_series(
            views.iter().map(|f| (f.week, f.record.date)),
            views
                .iter()
                .filter(|f| page.matches(&f.record.page_path))
                .map(|f| (f.week, f.record.engaged_sessions, f.record.page_views)),
        );
        let y = points
            .iter()
            .filter_map(|p| p.value)
            .fold(0.0_f64, f64::max);
        let chart = MetricChart::Weekly {
            title: chart_title("Weekly", metric, page),
            marker: ReleaseMarker::at(window.release_date, y),
            points,
        };
        (comparison, chart)
    } else {
        let comparison = sum_comparison(
            rows.iter().map(|r| (r.key, r.post_release, r.value)),
            &top,
            metric,
            Dimension::Page,
        );
        let points = daily_series(
            rows.iter()
                .filter(|r| page.matches(r.key))
                .map(|r| (r.date, r.value)),
            &window,
            options.trend_period,
        );
        let y = points.iter().map(|p| p.value).max().unwrap_or(0) as f64;
        let chart = MetricChart::Daily {
            title: chart_title("Daily", metric, page),
            marker: ReleaseMarker::at(window.release_date, y),
            points,
        };
        (comparison, chart)
    };

    let channels = apply_window(&tables.channels, &window);
    let channel_comparison = channel_week_comparison(&channels, &window);
    let weekly = channel_weekly_bars(&channels);
    let channel_chart = ChannelChart {
        title: CHANNEL_CHART_TITLE,
        bars: weekly.bars,
        marker: ReleaseMarker::at(window.release_date, weekly.max_weekly_total as f64),
    };

    Report {
        window,
        metric,
        page: page.clone(),
        top_entities: top,
        comparison,
        metric_chart,
        channel_comparison,
        channel_chart,
    }
}
