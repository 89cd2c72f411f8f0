// Sparse tabular rendering of a plot for CSV export
use super::plot::PlotModel;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;

/// Timestamp layout understood by Dygraphs.
pub const DYGRAPH_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub const TIME_COLUMN: &str = "time";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the table as CSV. An empty table writes nothing, not even a header.
    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        let mut w = csv::Writer::from_writer(writer);
        w.write_record(&self.headers)?;
        for row in &self.rows {
            w.write_record(row)?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> anyhow::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }
}

/// One row per distinct timestamp across all series, one column per label.
///
/// Columns are the label texts sorted lexicographically behind a leading
/// `time` column. A cell with no observation is an empty string so charting
/// tools can tell a gap from a zero.
pub fn render(plot: &PlotModel) -> Table {
    let mut values: BTreeMap<DateTime<Utc>, HashMap<&str, f64>> = BTreeMap::new();

    for (series, label) in plot.labeled_series() {
        for point in &series.points {
            values
                .entry(point.time)
                .or_default()
                .insert(label.text.as_str(), point.value);
        }
    }

    if values.is_empty() {
        return Table::default();
    }

    let columns: BTreeSet<&str> = plot.labels().iter().map(|l| l.text.as_str()).collect();

    let mut headers = Vec::with_capacity(columns.len() + 1);
    headers.push(TIME_COLUMN.to_string());
    headers.extend(columns.iter().map(|c| c.to_string()));

    let rows = values
        .iter()
        .map(|(time, cells)| {
            let mut row = Vec::with_capacity(headers.len());
            row.push(time.format(DYGRAPH_TIME_FORMAT).to_string());
            row.extend(columns.iter().map(|c| match cells.get(c) {
                Some(v) => format_value(*v),
                None => String::new(),
            }));
            row
        })
        .collect();

    Table { headers, rows }
}

pub fn format_value(value: f64) -> String {
    format!("{:.2}", value)
}
