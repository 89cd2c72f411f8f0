// Reshapes store rows into per-key point sequences
use super::plot::Point;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;

/// One row from the store: a bucket (or a raw observation for `full`).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow<K> {
    pub key: K,
    pub time: DateTime<Utc>,
    pub value: f64,
    pub count: Option<i64>,
}

impl<K> AggregatedRow<K> {
    pub fn new(key: K, time: DateTime<Utc>, value: f64) -> Self {
        Self {
            key,
            time,
            value,
            count: None,
        }
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }
}

/// Per-bucket statistics of a single timer source.
#[derive(Debug, Clone, PartialEq)]
pub struct TimerStatsRow {
    pub time: DateTime<Utc>,
    pub average: f64,
    pub fifty: f64,
    pub ninety: f64,
}

#[derive(Debug, Clone)]
pub struct Aggregation<K> {
    pub points: HashMap<K, Vec<Point>>,
    pub totals: HashMap<K, i64>,
}

impl<K> Default for Aggregation<K> {
    fn default() -> Self {
        Self {
            points: HashMap::new(),
            totals: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> Aggregation<K> {
    pub fn total(&self, key: &K) -> i64 {
        self.totals.get(key).copied().unwrap_or(0)
    }

    /// Multiplies every value by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        for points in self.points.values_mut() {
            for p in points.iter_mut() {
                p.value *= factor;
            }
        }
        self
    }
}

/// Groups rows by key in arrival order and sums counts into per-key totals.
///
/// The store delivers rows ascending in time, so each key's points come out
/// ordered without sorting here.
pub fn aggregate<K, I>(rows: I) -> Aggregation<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = AggregatedRow<K>>,
{
    let mut agg = Aggregation::default();

    for row in rows {
        *agg.totals.entry(row.key.clone()).or_insert(0) += row.count.unwrap_or(0);
        agg.points
            .entry(row.key)
            .or_insert_with(Vec::new)
            .push(Point::new(row.time, row.value));
    }

    agg
}

/// Like [`aggregate`] but the total of each key is its number of points.
pub fn aggregate_counting_points<K, I>(rows: I) -> Aggregation<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = AggregatedRow<K>>,
{
    let mut agg = aggregate(rows);
    agg.totals = agg
        .points
        .iter()
        .map(|(k, pts)| (k.clone(), pts.len() as i64))
        .collect();
    agg
}
