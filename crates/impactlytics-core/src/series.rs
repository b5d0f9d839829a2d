//! Chart series: zero-filled daily values with trend, and weekly buckets.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::comparison::RatioParts;
use crate::record::ChannelRecord;
use crate::trend::trend_line;
use crate::window::{Flagged, ReleaseWindow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: i64,
    pub trend: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPoint {
    pub week: i64,
    /// First date of the bucket, used as the x position.
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelBar {
    pub week: i64,
    pub date: NaiveDate,
    pub channel: String,
    pub active_users: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelWeekly {
    pub bars: Vec<ChannelBar>,
    /// Largest stacked weekly total, first bucket included.
    pub max_weekly_total: i64,
}

/// Daily sums over every day of the window; days without data are 0.
pub fn daily_series<I>(rows: I, window: &ReleaseWindow, period: usize) -> Vec<DailyPoint>
where
    I: IntoIterator<Item = (NaiveDate, i64)>,
{
    let mut sums: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (date, value) in rows {
        *sums.entry(date).or_insert(0) += value;
    }

    let filled: Vec<(NaiveDate, i64)> = window
        .days()
        .map(|day| (day, sums.get(&day).copied().unwrap_or(0)))
        .collect();
    let observed: Vec<f64> = filled.iter().map(|(_, v)| *v as f64).collect();
    let trend = trend_line(&observed, period);

    filled
        .into_iter()
        .zip(trend)
        .map(|((date, value), trend)| DailyPoint { date, value, trend })
        .collect()
}

/// First date seen for each week bucket.
fn week_start_dates<I>(rows: I) -> BTreeMap<i64, NaiveDate>
where
    I: IntoIterator<Item = (i64, NaiveDate)>,
{
    let mut map: BTreeMap<i64, NaiveDate> = BTreeMap::new();
    for (week, date) in rows {
        map.entry(week)
            .and_modify(|d| *d = (*d).min(date))
            .or_insert(date);
    }
    map
}

/// Weekly ratio series, first (partial) bucket dropped.
///
/// `buckets` are `(week, date)` for the whole windowed table so every week
/// keeps a plotting date even when the selected slice has no rows there;
/// `rows` are `(week, numerator, denominator)` for the selected slice.
pub fn weekly_ratio_series<B, R>(buckets: B, rows: R) -> Vec<WeeklyPoint>
where
    B: IntoIterator<Item = (i64, NaiveDate)>,
    R: IntoIterator<Item = (i64, i64, i64)>,
{
    let dates = week_start_dates(buckets);
    let mut parts: BTreeMap<i64, RatioParts> = BTreeMap::new();
    for (week, numerator, denominator) in rows {
        parts.entry(week).or_default().add(numerator, denominator);
    }

    dates
        .into_iter()
        .skip(1)
        .map(|(week, date)| WeeklyPoint {
            week,
            date,
            value: parts.get(&week).and_then(RatioParts::ratio),
        })
        .collect()
}

/// Active users per (week, channel) for stacked bars, first bucket dropped.
pub fn channel_weekly_bars(records: &[Flagged<ChannelRecord>]) -> ChannelWeekly {
    let dates = week_start_dates(records.iter().map(|f| (f.week, f.record.date)));

    let mut sums: BTreeMap<(i64, &str), i64> = BTreeMap::new();
    let mut weekly_totals: BTreeMap<i64, i64> = BTreeMap::new();
    for f in records {
        *sums
            .entry((f.week, f.record.channel_group.as_str()))
            .or_insert(0) += f.record.active_users;
        *weekly_totals.entry(f.week).or_insert(0) += f.record.active_users;
    }

    let first_week = dates.keys().next().copied();
    let bars = sums
        .into_iter()
        .filter(|((week, _), _)| Some(*week) != first_week)
        .filter_map(|((week, channel), active_users)| {
            dates.get(&week).map(|date| ChannelBar {
                week,
                date: *date,
                channel: channel.to_string(),
                active_users,
            })
        })
        .collect();

    ChannelWeekly {
        bars,
        max_weekly_total: weekly_totals.values().copied().max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::DAILY_PERIOD;
    use crate::window::apply_window;
    use chrono::Duration;

    fn release() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 9).expect("date")
    }

    #[test]
    fn gaps_are_zero_filled_not_omitted() {
        let window = ReleaseWindow::around(release());
        // Data every day except a 10-day hole starting at the release date.
        let rows: Vec<(NaiveDate, i64)> = window
            .days()
            .filter(|d| *d < release() || *d >= release() + Duration::days(10))
            .map(|d| (d, 5))
            .collect();
        let series = daily_series(rows, &window, DAILY_PERIOD);
        assert_eq!(series.len(), 61);
        let gap: Vec<i64> = series
            .iter()
            .filter(|p| p.date >= release() && p.date < release() + Duration::days(10))
            .map(|p| p.value)
            .collect();
        assert_eq!(gap, vec![0; 10]);
        assert!(series.iter().all(|p| p.trend.is_some()));
    }

    #[test]
    fn daily_series_sums_same_day_rows() {
        let window = ReleaseWindow::around(release());
        let series = daily_series(
            vec![(release(), 2), (release(), 3)],
            &window,
            DAILY_PERIOD,
        );
        let day = series
            .iter()
            .find(|p| p.date == release())
            .expect("release day");
        assert_eq!(day.value, 5);
    }

    #[test]
    fn weekly_ratio_drops_first_bucket_and_keeps_empty_weeks() {
        let d = |offset: i64| release() + Duration::days(offset);
        let buckets = vec![(1, d(-10)), (2, d(-3)), (3, d(0)), (2, d(-5))];
        let rows = vec![(2, 1, 4), (2, 1, 6), (1, 9, 9)];
        let series = weekly_ratio_series(buckets, rows);
        assert_eq!(
            series,
            vec![
                WeeklyPoint {
                    week: 2,
                    date: d(-5),
                    value: Some(0.2),
                },
                WeeklyPoint {
                    week: 3,
                    date: d(0),
                    value: None,
                },
            ]
        );
    }

    #[test]
    fn channel_bars_stack_by_week_and_skip_first_bucket() {
        let window = ReleaseWindow::around(release());
        let rec = |offset: i64, channel: &str, users: i64| ChannelRecord {
            date: release() + Duration::days(offset),
            channel_group: channel.to_string(),
            active_users: users,
        };
        let records = apply_window(
            &[
                rec(-30, "Direct", 500),
                rec(-1, "Direct", 3),
                rec(-2, "Email", 4),
                rec(0, "Direct", 10),
                rec(1, "Direct", 5),
            ],
            &window,
        );
        let weekly = channel_weekly_bars(&records);
        assert_eq!(weekly.max_weekly_total, 500);
        let release_week = window.week_of(release());
        let after: Vec<&ChannelBar> = weekly
            .bars
            .iter()
            .filter(|b| b.week == release_week)
            .collect();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].active_users, 15);
        assert_eq!(after[0].date, release());
        assert!(weekly.bars.iter().all(|b| b.active_users != 500));
        let before: Vec<(&str, i64)> = weekly
            .bars
            .iter()
            .filter(|b| b.week == release_week - 1)
            .map(|b| (b.channel.as_str(), b.active_users))
            .collect();
        assert_eq!(before, vec![("Direct", 3), ("Email", 4)]);
    }
}
