// In-memory repository for service tests
use crate::application::metric_repository::{FieldType, MetricRepository};
use crate::domain::aggregation::{AggregatedRow, TimerStatsRow};
use crate::domain::metric::InstanceKey;
use crate::domain::plot::Point;
use crate::domain::resolution::Resolution;
use crate::domain::time_window::TimeRange;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeRepository {
    pub counters: Vec<AggregatedRow<i32>>,
    pub timers: Vec<AggregatedRow<String>>,
    pub source_timers: Vec<TimerStatsRow>,
    pub instance_metrics: Vec<AggregatedRow<InstanceKey>>,
    pub known_types: Vec<(String, i32)>,
    pub devices: Vec<(String, String)>,
    pub field_types: Vec<FieldType>,
    pub thresholds: Vec<(String, String, f64, f64)>,
    pub tags: Vec<String>,
    pub field_metrics: Vec<Point>,
    pub latest: Option<Point>,
    /// Delay applied to counter queries; a delayed query records
    /// "counters finished" once it completes.
    pub counters_delay: Option<Duration>,
    pub fail_timers: bool,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MetricRepository for FakeRepository {
    async fn counters(
        &self,
        application_id: &str,
        resolution: Resolution,
        _range: &TimeRange,
    ) -> anyhow::Result<Vec<AggregatedRow<i32>>> {
        self.record(format!("counters {} {}", application_id, resolution));
        if let Some(delay) = self.counters_delay {
            tokio::time::sleep(delay).await;
            self.record("counters finished".to_string());
        }
        Ok(self.counters.clone())
    }

    async fn timers(
        &self,
        application_id: &str,
        resolution: Resolution,
        _range: &TimeRange,
    ) -> anyhow::Result<Vec<AggregatedRow<String>>> {
        self.record(format!("timers {} {}", application_id, resolution));
        if self.fail_timers {
            anyhow::bail!("connection reset");
        }
        Ok(self.timers.clone())
    }

    async fn source_timers(
        &self,
        application_id: &str,
        source_id: &str,
        resolution: Resolution,
        _range: &TimeRange,
    ) -> anyhow::Result<Vec<TimerStatsRow>> {
        self.record(format!(
            "source_timers {} {} {}",
            application_id, source_id, resolution
        ));
        Ok(self.source_timers.clone())
    }

    async fn instance_metrics(
        &self,
        application_id: &str,
        type_ids: &[i32],
        resolution: Resolution,
        _range: &TimeRange,
    ) -> anyhow::Result<Vec<AggregatedRow<InstanceKey>>> {
        self.record(format!(
            "instance_metrics {} {:?} {}",
            application_id, type_ids, resolution
        ));
        Ok(self
            .instance_metrics
            .iter()
            .filter(|r| type_ids.contains(&r.key.type_id))
            .cloned()
            .collect())
    }

    async fn application_type_exists(
        &self,
        application_id: &str,
        type_id: i32,
    ) -> anyhow::Result<bool> {
        self.record(format!("exists {} {}", application_id, type_id));
        Ok(self
            .known_types
            .iter()
            .any(|(a, t)| a == application_id && *t == type_id))
    }

    async fn device_exists(&self, device_id: &str) -> anyhow::Result<bool> {
        Ok(self.devices.iter().any(|(d, _)| d == device_id))
    }

    async fn field_type(&self, type_id: &str) -> anyhow::Result<Option<FieldType>> {
        Ok(self.field_types.iter().find(|t| t.type_id == type_id).cloned())
    }

    async fn device_model(&self, device_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .devices
            .iter()
            .find(|(d, _)| d == device_id)
            .map(|(_, m)| m.clone()))
    }

    async fn field_threshold(
        &self,
        device_id: &str,
        type_id: &str,
    ) -> anyhow::Result<Option<(f64, f64)>> {
        Ok(self
            .thresholds
            .iter()
            .find(|(d, t, _, _)| d == device_id && t == type_id)
            .map(|(_, _, lower, upper)| (*lower, *upper)))
    }

    async fn field_tags(&self, _device_id: &str, _type_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.tags.clone())
    }

    async fn field_metrics(
        &self,
        device_id: &str,
        type_id: &str,
        resolution: Resolution,
        _range: &TimeRange,
    ) -> anyhow::Result<Vec<Point>> {
        self.record(format!("field_metrics {} {} {}", device_id, type_id, resolution));
        Ok(self.field_metrics.clone())
    }

    async fn latest_field_metric(
        &self,
        _device_id: &str,
        _type_id: &str,
    ) -> anyhow::Result<Option<Point>> {
        Ok(self.latest)
    }
}
