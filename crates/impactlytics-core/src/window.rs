//! Release-date windowing, before/after flagging and week realignment.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::record::{normalize_path, ChannelRecord, PageViewRecord, SessionRecord};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_CHANNEL_WINDOW_DAYS: i64 = 7;

/// Date ranges derived from a chosen release date. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReleaseWindow {
    pub release_date: NaiveDate,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub channel_window_start: NaiveDate,
    pub channel_window_end: NaiveDate,
}

impl ReleaseWindow {
    pub fn new(release_date: NaiveDate, window_days: i64, channel_window_days: i64) -> Self {
        Self {
            release_date,
            window_start: release_date - Duration::days(window_days),
            window_end: release_date + Duration::days(window_days),
            channel_window_start: release_date - Duration::days(channel_window_days),
            channel_window_end: release_date + Duration::days(channel_window_days),
        }
    }

    pub fn around(release_date: NaiveDate) -> Self {
        Self::new(release_date, DEFAULT_WINDOW_DAYS, DEFAULT_CHANNEL_WINDOW_DAYS)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.window_start && date <= self.window_end
    }

    pub fn contains_channel_week(&self, date: NaiveDate) -> bool {
        date >= self.channel_window_start && date <= self.channel_window_end
    }

    /// The release date itself counts as "after".
    pub fn is_after(&self, date: NaiveDate) -> bool {
        date >= self.release_date
    }

    /// Every calendar day of the window, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.window_start;
        let len = (self.window_end - self.window_start).num_days() + 1;
        (0..len.max(0)).map(move |offset| start + Duration::days(offset))
    }

    pub fn week_of(&self, date: NaiveDate) -> i64 {
        realigned_week(date, self.release_date)
    }
}

/// Week bucket whose boundaries fall on the release date's weekday.
///
/// Starts from a Monday-based week counter that does not wrap at year ends,
/// then moves days on or after the release weekday into the next bucket. For
/// a Thursday release, Monday to Wednesday keep their week and Thursday to
/// Sunday move to week + 1, so the release date always opens a bucket.
pub fn realigned_week(date: NaiveDate, release_date: NaiveDate) -> i64 {
    // 0001-01-01 is a Monday and has num_days_from_ce() == 1.
    let monday_week = (i64::from(date.num_days_from_ce()) - 1).div_euclid(7);
    let anchor = release_date.weekday().num_days_from_monday();
    let shift = i64::from(date.weekday().num_days_from_monday() >= anchor);
    monday_week + shift
}

/// A windowed record tagged with its before/after flag and realigned week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flagged<T> {
    pub record: T,
    pub post_release: bool,
    pub week: i64,
}

pub trait DatedRecord: Clone {
    fn date(&self) -> NaiveDate;

    /// Canonicalize the dimension key; a no-op for non-path dimensions.
    fn normalize(&mut self) {}
}

impl DatedRecord for SessionRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn normalize(&mut self) {
        self.landing_page = normalize_path(&self.landing_page);
    }
}

impl DatedRecord for PageViewRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn normalize(&mut self) {
        self.page_path = normalize_path(&self.page_path);
    }
}

impl DatedRecord for ChannelRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Keep records inside the ±window range, normalized and flagged.
pub fn apply_window<T: DatedRecord>(records: &[T], window: &ReleaseWindow) -> Vec<Flagged<T>> {
    records
        .iter()
        .filter(|r| window.contains(r.date()))
        .map(|r| {
            let mut record = r.clone();
            record.normalize();
            let date = record.date();
            Flagged {
                post_release: window.is_after(date),
                week: window.week_of(date),
                record,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn page(d: NaiveDate, path: &str) -> PageViewRecord {
        PageViewRecord {
            date: d,
            page_path: path.to_string(),
            page_views: 1,
            engaged_sessions: 1,
        }
    }

    #[test]
    fn window_bounds_are_thirty_days_each_side() {
        let w = ReleaseWindow::around(date(2023, 3, 9));
        assert_eq!(w.window_start, date(2023, 2, 7));
        assert_eq!(w.window_end, date(2023, 4, 8));
        assert_eq!(w.channel_window_start, date(2023, 3, 2));
        assert_eq!(w.channel_window_end, date(2023, 3, 16));
        assert_eq!(w.days().count(), 61);
    }

    #[test]
    fn apply_window_keeps_inclusive_range_only() {
        let w = ReleaseWindow::around(date(2023, 3, 9));
        let records = vec![
            page(date(2023, 2, 6), "/early"),
            page(date(2023, 2, 7), "/first"),
            page(date(2023, 4, 8), "/last"),
            page(date(2023, 4, 9), "/late"),
        ];
        let kept = apply_window(&records, &w);
        let paths: Vec<&str> = kept.iter().map(|f| f.record.page_path.as_str()).collect();
        assert_eq!(paths, vec!["/first/", "/last/"]);
        assert!(kept.iter().all(|f| w.contains(f.record.date)));
    }

    #[test]
    fn release_day_is_flagged_after() {
        let w = ReleaseWindow::around(date(2023, 3, 9));
        let kept = apply_window(
            &[page(date(2023, 3, 8), "/a/"), page(date(2023, 3, 9), "/a/")],
            &w,
        );
        assert!(!kept[0].post_release);
        assert!(kept[1].post_release);
    }

    #[test]
    fn thursday_release_matches_iso_week_shift() {
        let release = date(2023, 3, 9);
        assert_eq!(release.weekday(), Weekday::Thu);
        // Mon..Wed stay in the ISO week, Thu..Sun move to the next bucket.
        let monday = date(2023, 3, 6);
        let wednesday = date(2023, 3, 8);
        let thursday = date(2023, 3, 9);
        let sunday = date(2023, 3, 12);
        let next_wednesday = date(2023, 3, 15);
        assert_eq!(realigned_week(monday, release), realigned_week(wednesday, release));
        assert_eq!(realigned_week(thursday, release), realigned_week(wednesday, release) + 1);
        assert_eq!(realigned_week(sunday, release), realigned_week(thursday, release));
        assert_eq!(realigned_week(next_wednesday, release), realigned_week(thursday, release));
        assert_eq!(
            i64::from(thursday.iso_week().week()) + 1 - i64::from(monday.iso_week().week()),
            realigned_week(thursday, release) - realigned_week(monday, release)
        );
    }

    #[test]
    fn release_date_opens_a_bucket_for_every_weekday() {
        for offset in 0..7 {
            let release = date(2023, 3, 6) + Duration::days(offset);
            let release_week = realigned_week(release, release);
            assert_eq!(realigned_week(release - Duration::days(1), release), release_week - 1);
            assert_eq!(realigned_week(release + Duration::days(6), release), release_week);
            assert_eq!(realigned_week(release + Duration::days(7), release), release_week + 1);
        }
    }

    #[test]
    fn realigned_week_does_not_wrap_at_year_end() {
        let release = date(2023, 1, 5);
        assert_eq!(
            realigned_week(date(2023, 1, 5), release),
            realigned_week(date(2022, 12, 29), release) + 1
        );
    }
}
