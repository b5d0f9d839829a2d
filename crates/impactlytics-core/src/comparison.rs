//! Before/after comparison tables.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::metric::{Dimension, Metric};
use crate::record::ChannelRecord;
use crate::window::{Flagged, ReleaseWindow};

pub const TOTAL_ROW: &str = "Total";

const BEFORE: usize = 0;
const AFTER: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(i64),
    /// `None` when the denominator is zero.
    Ratio(Option<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub entity: String,
    pub before: MetricValue,
    pub after: MetricValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub metric: Metric,
    pub dimension_label: &'static str,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn total(&self) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.entity == TOTAL_ROW)
    }
}

fn slot(post_release: bool) -> usize {
    if post_release {
        AFTER
    } else {
        BEFORE
    }
}

/// Before/after table for additive metrics.
///
/// Input rows are `(entity, post_release, value)`. Only `top` entities get a
/// row, in `top` order; the trailing `Total` row sums every entity.
pub fn sum_comparison<'a, I>(
    rows: I,
    top: &[String],
    metric: Metric,
    dimension: Dimension,
) -> ComparisonTable
where
    I: IntoIterator<Item = (&'a str, bool, i64)>,
{
    let mut cells: BTreeMap<&str, [i64; 2]> = BTreeMap::new();
    let mut total = [0i64; 2];
    for (key, post_release, value) in rows {
        let idx = slot(post_release);
        cells.entry(key).or_insert([0, 0])[idx] += value;
        total[idx] += value;
    }

    let mut out: Vec<ComparisonRow> = top
        .iter()
        .filter_map(|entity| {
            cells.get(entity.as_str()).map(|cell| ComparisonRow {
                entity: entity.clone(),
                before: MetricValue::Count(cell[BEFORE]),
                after: MetricValue::Count(cell[AFTER]),
            })
        })
        .collect();
    out.push(ComparisonRow {
        entity: TOTAL_ROW.to_string(),
        before: MetricValue::Count(total[BEFORE]),
        after: MetricValue::Count(total[AFTER]),
    });

    ComparisonTable {
        metric,
        dimension_label: dimension.label(),
        rows: out,
    }
}

/// Numerator and denominator sums for one cell of a ratio metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatioParts {
    pub numerator: i64,
    pub denominator: i64,
}

impl RatioParts {
    pub fn add(&mut self, numerator: i64, denominator: i64) {
        self.numerator += numerator;
        self.denominator += denominator;
    }

    pub fn ratio(&self) -> Option<f64> {
        if self.denominator == 0 {
            None
        } else {
            Some(self.numerator as f64 / self.denominator as f64)
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Before/after table for ratio metrics.
///
/// Input rows are `(entity, post_release, numerator, denominator)`. Both
/// parts are summed per cell and divided last; values are rounded to two
/// decimals.
pub fn ratio_comparison<'a, I>(
    rows: I,
    top: &[String],
    metric: Metric,
    dimension: Dimension,
) -> ComparisonTable
where
    I: IntoIterator<Item = (&'a str, bool, i64, i64)>,
{
    let mut cells: BTreeMap<&str, [RatioParts; 2]> = BTreeMap::new();
    let mut total = [RatioParts::default(); 2];
    for (key, post_release, numerator, denominator) in rows {
        let idx = slot(post_release);
        cells.entry(key).or_default()[idx].add(numerator, denominator);
        total[idx].add(numerator, denominator);
    }

    let value = |parts: &RatioParts| MetricValue::Ratio(parts.ratio().map(round2));

    let mut out: Vec<ComparisonRow> = top
        .iter()
        .filter_map(|entity| {
            cells.get(entity.as_str()).map(|cell| ComparisonRow {
                entity: entity.clone(),
                before: value(&cell[BEFORE]),
                after: value(&cell[AFTER]),
            })
        })
        .collect();
    out.push(ComparisonRow {
        entity: TOTAL_ROW.to_string(),
        before: value(&total[BEFORE]),
        after: value(&total[AFTER]),
    });

    ComparisonTable {
        metric,
        dimension_label: dimension.label(),
        rows: out,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelComparisonRow {
    pub channel: String,
    pub week_before: i64,
    pub week_after: i64,
}

/// Active users per channel for the week before and the week after release.
///
/// Rows cover the channels seen in the week after; a channel absent from the
/// week before reports 0 there. Rows are sorted by channel name.
pub fn channel_week_comparison(
    records: &[Flagged<ChannelRecord>],
    window: &ReleaseWindow,
) -> Vec<ChannelComparisonRow> {
    let mut before: BTreeMap<&str, i64> = BTreeMap::new();
    let mut after: BTreeMap<&str, i64> = BTreeMap::new();
    for row in records
        .iter()
        .filter(|f| window.contains_channel_week(f.record.date))
    {
        let bucket = if row.post_release {
            &mut after
        } else {
            &mut before
        };
        *bucket.entry(row.record.channel_group.as_str()).or_insert(0) += row.record.active_users;
    }

    after
        .into_iter()
        .map(|(channel, week_after)| ChannelComparisonRow {
            channel: channel.to_string(),
            week_before: before.get(channel).copied().unwrap_or(0),
            week_after,
        })
        .collect()
}
