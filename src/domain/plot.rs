// Plot domain models
use super::time_window::TimeRange;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl Point {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub key: String,
    pub colour: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(key: String, colour: String, points: Vec<Point>) -> Self {
        Self { key, colour, points }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub colour: String,
}

impl Label {
    pub fn new(text: String, colour: String) -> Self {
        Self { text, colour }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Latest {
    pub point: Point,
    pub colour: String,
}

/// Renderer-agnostic data of one chart.
///
/// `labels()[i]` always describes `series()[i]`: both lists only grow together
/// through [`PlotModel::add_series`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotModel {
    title: String,
    subtitle: String,
    unit: String,
    x_axis: Option<TimeRange>,
    x_label: String,
    y_axis: Option<(f64, f64)>,
    threshold: Option<(f64, f64)>,
    latest: Option<Latest>,
    series: Vec<Series>,
    labels: Vec<Label>,
}

impl PlotModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_series(&mut self, series: Series, label: Label) {
        self.series.push(series);
        self.labels.push(label);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_subtitle(&mut self, subtitle: impl Into<String>) {
        self.subtitle = subtitle.into();
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    pub fn set_x_axis(&mut self, range: TimeRange, label: impl Into<String>) {
        self.x_axis = Some(range);
        self.x_label = label.into();
    }

    pub fn set_y_axis(&mut self, min: f64, max: f64) {
        self.y_axis = Some((min, max));
    }

    pub fn set_threshold(&mut self, lower: f64, upper: f64) {
        self.threshold = Some((lower, upper));
    }

    pub fn set_latest(&mut self, point: Point, colour: impl Into<String>) {
        self.latest = Some(Latest {
            point,
            colour: colour.into(),
        });
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn x_axis(&self) -> Option<&TimeRange> {
        self.x_axis.as_ref()
    }

    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    pub fn y_axis(&self) -> Option<(f64, f64)> {
        self.y_axis
    }

    pub fn threshold(&self) -> Option<(f64, f64)> {
        self.threshold
    }

    pub fn latest(&self) -> Option<&Latest> {
        self.latest.as_ref()
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Series zipped with the label that describes each of them.
    pub fn labeled_series(&self) -> impl Iterator<Item = (&Series, &Label)> {
        self.series.iter().zip(self.labels.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_add_series_keeps_labels_aligned() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let mut plot = PlotModel::new();
        plot.add_series(
            Series::new("a".into(), "red".into(), vec![Point::new(t, 1.0)]),
            Label::new("a (n=1)".into(), "red".into()),
        );
        plot.add_series(
            Series::new("b".into(), "blue".into(), vec![]),
            Label::new("b (n=0)".into(), "blue".into()),
        );

        assert_eq!(plot.series().len(), plot.labels().len());
        let pairs: Vec<_> = plot
            .labeled_series()
            .map(|(s, l)| (s.key.as_str(), l.text.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "a (n=1)"), ("b", "b (n=0)")]);
        assert!(!plot.is_empty());
    }

    #[test]
    fn test_empty_plot() {
        let plot = PlotModel::new();
        assert!(plot.is_empty());
        assert!(plot.latest().is_none());
    }
}
