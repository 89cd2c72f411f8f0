// Merges per-key series into a labeled plot
use super::plot::{Label, PlotModel, Point, Series};
use super::ranking::RankedKey;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

const FALLBACK_COLOUR: &str = "black";

/// One key's data waiting to be placed in a plot.
#[derive(Debug, Clone)]
pub struct SeriesEntry {
    pub name: String,
    pub total: i64,
    pub colour: Option<String>,
    pub points: Vec<Point>,
}

impl SeriesEntry {
    pub fn new(name: impl Into<String>, total: i64, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            total,
            colour: None,
            points,
        }
    }

    pub fn with_colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = Some(colour.into());
        self
    }

    pub fn label_text(&self) -> String {
        format!("{} (n={})", self.name, self.total)
    }
}

pub enum KeyOrder<K> {
    /// Natural key order.
    Ascending,
    /// The given ranking; keys missing from it are dropped.
    Ranked(Vec<RankedKey<K>>),
}

#[derive(Debug, Clone, Copy)]
pub enum ColourPolicy<'a> {
    /// Each entry's own colour.
    Keyed,
    /// `palette[i % len]` by emission position.
    RoundRobin(&'a [String]),
    Uniform { series: &'a str, label: &'a str },
}

impl ColourPolicy<'_> {
    fn pick(&self, index: usize, entry: &SeriesEntry) -> (String, String) {
        match self {
            ColourPolicy::Keyed => {
                let c = entry
                    .colour
                    .clone()
                    .unwrap_or_else(|| FALLBACK_COLOUR.to_string());
                (c.clone(), c)
            }
            ColourPolicy::RoundRobin(palette) => {
                let c = if palette.is_empty() {
                    FALLBACK_COLOUR.to_string()
                } else {
                    palette[index % palette.len()].clone()
                };
                (c.clone(), c)
            }
            ColourPolicy::Uniform { series, label } => (series.to_string(), label.to_string()),
        }
    }
}

pub struct PlotAssembler<K> {
    entries: HashMap<K, SeriesEntry>,
}

impl<K> Default for PlotAssembler<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Ord + Hash + Clone + Display> PlotAssembler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, entry: SeriesEntry) {
        self.entries.insert(key, entry);
    }

    /// Appends every entry to `plot` in `order`, one series and one label each.
    pub fn emit(mut self, order: KeyOrder<K>, colours: ColourPolicy<'_>, plot: &mut PlotModel) {
        let keys: Vec<K> = match order {
            KeyOrder::Ascending => {
                let mut keys: Vec<K> = self.entries.keys().cloned().collect();
                keys.sort();
                keys
            }
            KeyOrder::Ranked(ranked) => ranked.into_iter().map(|r| r.key).collect(),
        };

        let mut index = 0;
        for key in keys {
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };

            let (series_colour, label_colour) = colours.pick(index, &entry);
            let text = entry.label_text();
            plot.add_series(
                Series::new(key.to_string(), series_colour, entry.points),
                Label::new(text, label_colour),
            );
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ranking::rank;
    use chrono::{TimeZone, Utc};

    fn points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                Point::new(
                    Utc.with_ymd_and_hms(2024, 1, 1, 0, i as u32, 0).unwrap(),
                    i as f64,
                )
            })
            .collect()
    }

    #[test]
    fn test_ascending_numeric_order() {
        let mut assembler = PlotAssembler::new();
        for k in [30, 4, 17] {
            assembler.insert(k, SeriesEntry::new(format!("t{}", k), 1, points(1)));
        }
        let mut plot = PlotModel::new();
        assembler.emit(KeyOrder::Ascending, ColourPolicy::Keyed, &mut plot);

        let keys: Vec<_> = plot.series().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["4", "17", "30"]);
        let labels: Vec<_> = plot.labels().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(labels, vec!["t4 (n=1)", "t17 (n=1)", "t30 (n=1)"]);
    }

    #[test]
    fn test_two_keys_labels_match_series() {
        let mut assembler = PlotAssembler::new();
        assembler.insert(1, SeriesEntry::new("requests", 10, points(3)).with_colour("red"));
        assembler.insert(2, SeriesEntry::new("errors", 4, points(3)).with_colour("blue"));
        let mut plot = PlotModel::new();
        assembler.emit(KeyOrder::Ascending, ColourPolicy::Keyed, &mut plot);

        assert_eq!(plot.series().len(), 2);
        assert_eq!(plot.labels()[0].text, "requests (n=10)");
        assert_eq!(plot.labels()[1].text, "errors (n=4)");
        assert_eq!(plot.series()[0].colour, "red");
        assert_eq!(plot.labels()[1].colour, "blue");
        assert!(plot.series().iter().all(|s| s.points.len() == 3));
    }

    #[test]
    fn test_ranked_order_and_truncation() {
        let totals: HashMap<String, i64> =
            [("a".to_string(), 5), ("b".to_string(), 20), ("c".to_string(), 20)]
                .into_iter()
                .collect();
        let mut assembler = PlotAssembler::new();
        for (k, v) in &totals {
            assembler.insert(k.clone(), SeriesEntry::new(k.clone(), *v, points(1)));
        }
        let mut ranked = rank(&totals);
        ranked.truncate(2);

        let mut plot = PlotModel::new();
        assembler.emit(
            KeyOrder::Ranked(ranked),
            ColourPolicy::Uniform {
                series: "#e34a33",
                label: "lightgrey",
            },
            &mut plot,
        );

        let labels: Vec<_> = plot.labels().iter().map(|l| l.text.as_str()).collect();
        assert_eq!(labels, vec!["b (n=20)", "c (n=20)"]);
        assert!(plot.series().iter().all(|s| s.colour == "#e34a33"));
        assert!(plot.labels().iter().all(|l| l.colour == "lightgrey"));
    }

    #[test]
    fn test_round_robin_wraps() {
        let palette = vec!["red".to_string(), "green".to_string()];
        let mut assembler = PlotAssembler::new();
        for k in 0..5 {
            assembler.insert(k, SeriesEntry::new(k.to_string(), 0, vec![]));
        }
        let mut plot = PlotModel::new();
        assembler.emit(KeyOrder::Ascending, ColourPolicy::RoundRobin(&palette), &mut plot);

        let colours: Vec<_> = plot.series().iter().map(|s| s.colour.as_str()).collect();
        assert_eq!(colours, vec!["red", "green", "red", "green", "red"]);
    }

    #[test]
    fn test_round_robin_empty_palette() {
        let mut assembler = PlotAssembler::new();
        assembler.insert(1, SeriesEntry::new("x", 0, vec![]));
        let mut plot = PlotModel::new();
        assembler.emit(KeyOrder::Ascending, ColourPolicy::RoundRobin(&[]), &mut plot);
        assert_eq!(plot.series()[0].colour, FALLBACK_COLOUR);
    }
}
