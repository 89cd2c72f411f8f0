// Orders keys by total volume
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedKey<K> {
    pub key: K,
    pub total: i64,
}

/// Keys sorted by total, largest first. Equal totals are ordered by key
/// ascending so the result never depends on map iteration order.
pub fn rank<K: Ord + Clone>(totals: &HashMap<K, i64>) -> Vec<RankedKey<K>> {
    let mut ranked: Vec<RankedKey<K>> = totals
        .iter()
        .map(|(k, v)| RankedKey {
            key: k.clone(),
            total: *v,
        })
        .collect();

    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    ranked
}

/// The `limit` highest ranked keys.
pub fn top<K: Ord + Clone>(totals: &HashMap<K, i64>, limit: usize) -> Vec<RankedKey<K>> {
    let mut ranked = rank(totals);
    ranked.truncate(limit);
    ranked
}
