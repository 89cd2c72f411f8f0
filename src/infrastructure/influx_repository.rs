// InfluxDB repository implementation
use crate::application::metric_repository::{FieldType, MetricRepository};
use crate::domain::aggregation::{AggregatedRow, TimerStatsRow};
use crate::domain::metric::InstanceKey;
use crate::domain::plot::Point;
use crate::domain::resolution::Resolution;
use crate::domain::time_window::TimeRange;
use crate::infrastructure::config::{FieldCatalog, InfluxSettings};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::collections::HashMap;

const APP_COUNTER: &str = "app_counter";
const APP_TIMER: &str = "app_timer";
const APP_METRIC: &str = "app_metric";
const FIELD_METRIC: &str = "field_metric";

#[derive(Debug, Clone)]
pub struct InfluxRepository {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
    catalog: FieldCatalog,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    tags: Option<HashMap<String, String>>,
}

/// One result row: column 0 is time, the rest are the selected fields in order.
struct Row<'a> {
    tags: Option<&'a HashMap<String, String>>,
    time: DateTime<Utc>,
    values: &'a [serde_json::Value],
}

impl Row<'_> {
    fn tag(&self, key: &str) -> Option<&str> {
        self.tags.and_then(|t| t.get(key)).map(String::as_str)
    }

    fn number(&self, column: usize) -> Option<f64> {
        self.values.get(column).and_then(|v| v.as_f64())
    }
}

impl InfluxQLResponse {
    fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.results
            .iter()
            .filter_map(|r| r.series.as_ref())
            .flatten()
            .flat_map(|s| {
                s.values.iter().filter_map(move |values| {
                    let time = values.first()?.as_str()?;
                    let time = DateTime::parse_from_rfc3339(time).ok()?.with_timezone(&Utc);
                    Some(Row {
                        tags: s.tags.as_ref(),
                        time,
                        values,
                    })
                })
            })
    }

    fn has_values(&self) -> bool {
        self.results
            .iter()
            .filter_map(|r| r.series.as_ref())
            .flatten()
            .any(|s| !s.values.is_empty())
    }
}

impl InfluxRepository {
    pub fn new(settings: &InfluxSettings, catalog: FieldCatalog) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: settings.host.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            database: settings.database.clone(),
            retention_policy: settings.retention_policy.clone(),
            catalog,
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host,
            urlencoding::encode(&self.database),
            urlencoding::encode(&self.retention_policy),
            urlencoding::encode(query)
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        tracing::debug!("Executing InfluxQL: {}", query);
        let url = self.build_query_url(query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(error) = data.results.iter().find_map(|r| r.error.as_ref()) {
            anyhow::bail!("InfluxDB query error: {}", error);
        }

        Ok(data)
    }
}

#[async_trait]
impl MetricRepository for InfluxRepository {
    async fn counters(
        &self,
        application_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> Result<Vec<AggregatedRow<i32>>> {
        let query = Select::new(APP_COUNTER, "sum(\"count\")", "\"count\"")
            .filter("application", application_id)
            .group_by("type")
            .build(resolution, range);

        let response = self.execute_query(&query).await?;
        let rows = counter_rows(&response);
        tracing::debug!("{} counter rows for {}", rows.len(), application_id);
        Ok(rows)
    }

    async fn timers(
        &self,
        application_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> Result<Vec<AggregatedRow<String>>> {
        let query = Select::new(APP_TIMER, "max(ninety), sum(\"count\")", "ninety, \"count\"")
            .filter("application", application_id)
            .group_by("source")
            .build(resolution, range);

        let response = self.execute_query(&query).await?;
        let rows = timer_rows(&response);
        tracing::debug!("{} timer rows for {}", rows.len(), application_id);
        Ok(rows)
    }

    async fn source_timers(
        &self,
        application_id: &str,
        source_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> Result<Vec<TimerStatsRow>> {
        let query = Select::new(
            APP_TIMER,
            "mean(average), max(fifty), max(ninety)",
            "average, fifty, ninety",
        )
        .filter("application", application_id)
        .filter("source", source_id)
        .build(resolution, range);

        let response = self.execute_query(&query).await?;
        Ok(timer_stats_rows(&response))
    }

    async fn instance_metrics(
        &self,
        application_id: &str,
        type_ids: &[i32],
        resolution: Resolution,
        range: &TimeRange,
    ) -> Result<Vec<AggregatedRow<InstanceKey>>> {
        let types: Vec<String> = type_ids.iter().map(|t| t.to_string()).collect();
        let query = Select::new(APP_METRIC, "mean(value)", "value")
            .filter("application", application_id)
            .any_of("type", &types)
            .group_by("instance")
            .group_by("type")
            .build(resolution, range);

        let response = self.execute_query(&query).await?;
        let rows = instance_rows(&response);
        tracing::debug!("{} instance metric rows for {}", rows.len(), application_id);
        Ok(rows)
    }

    async fn application_type_exists(&self, application_id: &str, type_id: i32) -> Result<bool> {
        let query = format!(
            "SHOW SERIES FROM {} WHERE application = {} AND \"type\" = {} LIMIT 1",
            APP_METRIC,
            literal(application_id),
            literal(&type_id.to_string())
        );

        let response = self.execute_query(&query).await?;
        Ok(response.has_values())
    }

    async fn device_exists(&self, device_id: &str) -> Result<bool> {
        Ok(self.catalog.device_model(device_id).is_some())
    }

    async fn field_type(&self, type_id: &str) -> Result<Option<FieldType>> {
        Ok(self.catalog.field_type(type_id))
    }

    async fn device_model(&self, device_id: &str) -> Result<Option<String>> {
        Ok(self.catalog.device_model(device_id))
    }

    async fn field_threshold(&self, device_id: &str, type_id: &str) -> Result<Option<(f64, f64)>> {
        Ok(self.catalog.threshold(device_id, type_id))
    }

    async fn field_tags(&self, device_id: &str, type_id: &str) -> Result<Vec<String>> {
        Ok(self.catalog.tags(device_id, type_id))
    }

    async fn field_metrics(
        &self,
        device_id: &str,
        type_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> Result<Vec<Point>> {
        let query = Select::new(FIELD_METRIC, "mean(value)", "value")
            .filter("device", device_id)
            .filter("type", type_id)
            .build(resolution, range);

        let response = self.execute_query(&query).await?;
        Ok(point_rows(&response))
    }

    async fn latest_field_metric(&self, device_id: &str, type_id: &str) -> Result<Option<Point>> {
        let query = format!(
            "SELECT last(value) FROM {} WHERE device = {} AND \"type\" = {}",
            FIELD_METRIC,
            literal(device_id),
            literal(type_id)
        );

        let response = self.execute_query(&query).await?;
        Ok(point_rows(&response).pop())
    }
}

/// SELECT over one measurement, bucketed by time unless the resolution is full.
struct Select<'a> {
    measurement: &'a str,
    aggregated: &'a str,
    raw: &'a str,
    conditions: Vec<String>,
    tags: Vec<&'a str>,
}

impl<'a> Select<'a> {
    fn new(measurement: &'a str, aggregated: &'a str, raw: &'a str) -> Self {
        Self {
            measurement,
            aggregated,
            raw,
            conditions: Vec::new(),
            tags: Vec::new(),
        }
    }

    fn filter(mut self, tag: &str, value: &str) -> Self {
        self.conditions
            .push(format!("{} = {}", identifier(tag), literal(value)));
        self
    }

    fn any_of(mut self, tag: &str, values: &[String]) -> Self {
        let alternatives: Vec<String> = values
            .iter()
            .map(|v| format!("{} = {}", identifier(tag), literal(v)))
            .collect();
        self.conditions.push(format!("({})", alternatives.join(" OR ")));
        self
    }

    fn group_by(mut self, tag: &'a str) -> Self {
        self.tags.push(tag);
        self
    }

    fn build(self, resolution: Resolution, range: &TimeRange) -> String {
        let mut conditions = self.conditions;
        conditions.push(format!("time >= '{}'", timestamp(range.start)));
        conditions.push(format!("time <= '{}'", timestamp(range.end)));

        let tags = self.tags.iter().map(|t| identifier(t));
        let (fields, group) = match interval(resolution) {
            Some(interval) => {
                let group: Vec<String> =
                    std::iter::once(format!("time({})", interval)).chain(tags).collect();
                (
                    self.aggregated,
                    format!(" GROUP BY {} fill(none)", group.join(", ")),
                )
            }
            None => {
                let group: Vec<String> = tags.collect();
                if group.is_empty() {
                    (self.raw, String::new())
                } else {
                    (self.raw, format!(" GROUP BY {}", group.join(", ")))
                }
            }
        };

        format!(
            "SELECT {} FROM {} WHERE {}{}",
            fields,
            self.measurement,
            conditions.join(" AND "),
            group
        )
    }
}

/// InfluxQL duration literal of the resolution's bucket.
fn interval(resolution: Resolution) -> Option<String> {
    let minutes = resolution.bucket()?.num_minutes();
    if minutes % 60 == 0 {
        Some(format!("{}h", minutes / 60))
    } else {
        Some(format!("{}m", minutes))
    }
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\\\""))
}

fn counter_rows(response: &InfluxQLResponse) -> Vec<AggregatedRow<i32>> {
    response
        .rows()
        .filter_map(|row| {
            let type_id = row.tag("type")?.parse::<i32>().ok()?;
            let count = row.number(1)?;
            Some(AggregatedRow::new(type_id, row.time, count).with_count(count as i64))
        })
        .collect()
}

fn timer_rows(response: &InfluxQLResponse) -> Vec<AggregatedRow<String>> {
    response
        .rows()
        .filter_map(|row| {
            let source = row.tag("source")?.to_string();
            let ninety = row.number(1)?;
            let count = row.number(2).unwrap_or_default() as i64;
            Some(AggregatedRow::new(source, row.time, ninety).with_count(count))
        })
        .collect()
}

fn timer_stats_rows(response: &InfluxQLResponse) -> Vec<TimerStatsRow> {
    response
        .rows()
        .filter_map(|row| {
            Some(TimerStatsRow {
                time: row.time,
                average: row.number(1)?,
                fifty: row.number(2)?,
                ninety: row.number(3)?,
            })
        })
        .collect()
}

fn instance_rows(response: &InfluxQLResponse) -> Vec<AggregatedRow<InstanceKey>> {
    response
        .rows()
        .filter_map(|row| {
            let type_id = row.tag("type")?.parse::<i32>().ok()?;
            let key = InstanceKey::new(row.tag("instance")?, type_id);
            Some(AggregatedRow::new(key, row.time, row.number(1)?))
        })
        .collect()
}

fn point_rows(response: &InfluxQLResponse) -> Vec<Point> {
    response
        .rows()
        .filter_map(|row| Some(Point::new(row.time, row.number(1)?)))
        .collect()
}
