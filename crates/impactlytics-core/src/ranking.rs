use std::collections::BTreeMap;

use crate::record::is_not_set;

pub const DEFAULT_TOP_N: usize = 10;

/// Rank dimension values by their summed metric, highest first.
///
/// Equal sums are ordered by key so the result never depends on input order.
/// `(not set)` values are skipped and do not count toward `limit`.
pub fn top_entities<'a, I>(rows: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for (key, value) in rows {
        *totals.entry(key).or_insert(0) += value;
    }

    let mut ranked: Vec<(&str, i64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .filter(|(key, _)| !is_not_set(key))
        .take(limit)
        .map(|(key, _)| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_summed_value_descending() {
        let rows = vec![("/a/", 5), ("/b/", 7), ("/a/", 4), ("/c/", 1)];
        assert_eq!(top_entities(rows, 10), vec!["/a/", "/b/", "/c/"]);
    }

    #[test]
    fn excludes_not_set_without_consuming_a_slot() {
        let rows = vec![("(not set)/", 100), ("/a/", 3), ("/b/", 2), ("/c/", 1)];
        assert_eq!(top_entities(rows, 2), vec!["/a/", "/b/"]);
    }

    #[test]
    fn caps_at_limit() {
        let keys: Vec<String> = (0..15).map(|i| format!("/p{i:02}/")).collect();
        let rows = keys.iter().enumerate().map(|(i, k)| (k.as_str(), i as i64));
        let top = top_entities(rows, DEFAULT_TOP_N);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0], "/p14/");
        assert_eq!(top[9], "/p05/");
    }

    #[test]
    fn ties_break_lexicographically_regardless_of_input_order() {
        let forward = top_entities(vec![("/b/", 3), ("/a/", 3), ("/c/", 9)], 10);
        let reverse = top_entities(vec![("/c/", 9), ("/a/", 3), ("/b/", 3)], 10);
        assert_eq!(forward, vec!["/c/", "/a/", "/b/"]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn empty_or_sentinel_only_input_yields_nothing() {
        assert!(top_entities(Vec::<(&str, i64)>::new(), 10).is_empty());
        assert!(top_entities(vec![("(not set)", 4)], 10).is_empty());
    }
}
