// Repository trait for metric data access
use crate::domain::aggregation::{AggregatedRow, TimerStatsRow};
use crate::domain::metric::InstanceKey;
use crate::domain::plot::Point;
use crate::domain::resolution::Resolution;
use crate::domain::time_window::TimeRange;
use async_trait::async_trait;

/// Scale and display unit of a field metric type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    pub type_id: String,
    pub display: String,
    pub scale: f64,
}

/// Aggregated queries take a resolution and a range. The store truncates time
/// to the bucket and aggregates; for `Resolution::Full` it returns the raw
/// observations. Rows of one key always arrive ascending in time.
#[async_trait]
pub trait MetricRepository: Send + Sync {
    /// Counter sums keyed by metric type id; `count` carries the same sum.
    async fn counters(
        &self,
        application_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<AggregatedRow<i32>>>;

    /// Max 90th percentile keyed by timer source id, with the number of calls.
    async fn timers(
        &self,
        application_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<AggregatedRow<String>>>;

    /// Timer statistics of a single source.
    async fn source_timers(
        &self,
        application_id: &str,
        source_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<TimerStatsRow>>;

    /// Averaged instance metrics of the given types.
    async fn instance_metrics(
        &self,
        application_id: &str,
        type_ids: &[i32],
        resolution: Resolution,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<AggregatedRow<InstanceKey>>>;

    /// Whether the application and the metric type are both known.
    async fn application_type_exists(
        &self,
        application_id: &str,
        type_id: i32,
    ) -> anyhow::Result<bool>;

    async fn device_exists(&self, device_id: &str) -> anyhow::Result<bool>;

    async fn field_type(&self, type_id: &str) -> anyhow::Result<Option<FieldType>>;

    async fn device_model(&self, device_id: &str) -> anyhow::Result<Option<String>>;

    /// Unscaled (lower, upper) threshold for a device metric.
    async fn field_threshold(
        &self,
        device_id: &str,
        type_id: &str,
    ) -> anyhow::Result<Option<(f64, f64)>>;

    /// Tags of a device metric, sorted ascending.
    async fn field_tags(&self, device_id: &str, type_id: &str) -> anyhow::Result<Vec<String>>;

    /// Unscaled averaged device metric values.
    async fn field_metrics(
        &self,
        device_id: &str,
        type_id: &str,
        resolution: Resolution,
        range: &TimeRange,
    ) -> anyhow::Result<Vec<Point>>;

    /// Most recent raw observation, unscaled.
    async fn latest_field_metric(
        &self,
        device_id: &str,
        type_id: &str,
    ) -> anyhow::Result<Option<Point>>;
}
