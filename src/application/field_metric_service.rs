// Field metric service - Plots and exports for single device metrics
use crate::application::metric_repository::{FieldType, MetricRepository};
use crate::application::plot_drawer::PlotStyle;
use crate::domain::aggregation::{aggregate, AggregatedRow};
use crate::domain::plot::{Label, PlotModel, Point, Series};
use crate::domain::resolution::Resolution;
use crate::domain::table;
use crate::domain::time_window::{resolve_now, TimeRange, WindowProfile};
use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use std::sync::Arc;

const SERIES_COLOUR: &str = "deepskyblue";
const VALUE_COLUMN: &str = "value";

#[derive(Clone)]
pub struct FieldMetricService {
    repository: Arc<dyn MetricRepository>,
}

impl FieldMetricService {
    pub fn new(repository: Arc<dyn MetricRepository>) -> Self {
        Self { repository }
    }

    pub async fn plot_model(
        &self,
        device_id: &str,
        type_id: &str,
        resolution: Resolution,
        style: PlotStyle,
    ) -> AppResult<PlotModel> {
        if style == PlotStyle::Spark {
            return self.spark(device_id, type_id).await;
        }

        let profile = WindowProfile::FieldPlot;
        let range = resolve_now(None, None, resolution, profile)?;
        let field_type = self.lookup(device_id, type_id).await?;

        let mut plot = PlotModel::new();
        plot.set_unit(field_type.display.clone());

        if let Some((lower, upper)) = self.repository.field_threshold(device_id, type_id).await? {
            if !(lower == 0.0 && upper == 0.0) {
                plot.set_threshold(lower * field_type.scale, upper * field_type.scale);
            }
        }

        let tags = self.repository.field_tags(device_id, type_id).await?;
        plot.set_subtitle(format!("Tags: {}", tags.join(",")));

        let model = self
            .repository
            .device_model(device_id)
            .await?
            .unwrap_or_default();
        plot.set_title(format!(
            "Device: {}, Model: {}, Metric: {}",
            device_id,
            model,
            title_case(type_id)
        ));
        plot.set_x_axis(range, profile.axis_label(resolution));

        let mut points = self
            .scaled_points(device_id, &field_type, resolution, &range)
            .await?;

        // The newest raw value can differ from the last bucket average.
        if let Some(latest) = self.repository.latest_field_metric(device_id, type_id).await? {
            let latest = Point::new(latest.time, latest.value * field_type.scale);
            points.push(latest);
            plot.set_latest(latest, SERIES_COLOUR);
        }

        plot.add_series(
            Series::new(type_id.to_string(), SERIES_COLOUR.to_string(), points),
            Label::new(title_case(type_id), SERIES_COLOUR.to_string()),
        );

        Ok(plot)
    }

    /// Five minute averages over the last 12 hours, unscaled.
    pub async fn spark(&self, device_id: &str, type_id: &str) -> AppResult<PlotModel> {
        let range = TimeRange::ending_at(Utc::now(), Duration::hours(12));
        let points = self
            .repository
            .field_metrics(device_id, type_id, Resolution::FiveMinutes, &range)
            .await?;

        let mut plot = PlotModel::new();
        plot.set_x_axis(range, "12 hours");
        plot.add_series(
            Series::new(type_id.to_string(), SERIES_COLOUR.to_string(), points),
            Label::new(VALUE_COLUMN.to_string(), SERIES_COLOUR.to_string()),
        );
        Ok(plot)
    }

    /// `time,value` export with the type's scale applied.
    pub async fn csv(
        &self,
        device_id: &str,
        type_id: &str,
        resolution: Resolution,
        start: Option<&str>,
        end: Option<&str>,
    ) -> AppResult<Vec<u8>> {
        let range = resolve_now(start, end, resolution, WindowProfile::Export)?;
        let field_type = self.lookup(device_id, type_id).await?;
        let points = self
            .scaled_points(device_id, &field_type, resolution, &range)
            .await?;

        let mut plot = PlotModel::new();
        plot.add_series(
            Series::new(type_id.to_string(), SERIES_COLOUR.to_string(), points),
            Label::new(VALUE_COLUMN.to_string(), SERIES_COLOUR.to_string()),
        );

        Ok(table::render(&plot).to_csv()?)
    }

    async fn lookup(&self, device_id: &str, type_id: &str) -> AppResult<FieldType> {
        if !self.repository.device_exists(device_id).await? {
            return Err(AppError::NotFound(format!("device {}", device_id)));
        }

        self.repository
            .field_type(type_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("type {}", type_id)))
    }

    async fn scaled_points(
        &self,
        device_id: &str,
        field_type: &FieldType,
        resolution: Resolution,
        range: &TimeRange,
    ) -> AppResult<Vec<Point>> {
        let rows = self
            .repository
            .field_metrics(device_id, &field_type.type_id, resolution, range)
            .await?
            .into_iter()
            .map(|p| AggregatedRow::new((), p.time, p.value));

        let mut agg = aggregate(rows).scaled(field_type.scale);
        Ok(agg.points.remove(&()).unwrap_or_default())
    }
}

/// Upper-cases the first letter of every word. Anything but letters, digits
/// and `_` separates words: "voltage.battery" -> "Voltage.Battery".
fn title_case(value: &str) -> String {
    let mut title = String::with_capacity(value.len());
    let mut word_start = true;
    for c in value.chars() {
        if word_start {
            title.extend(c.to_uppercase());
        } else {
            title.push(c);
        }
        word_start = !(c.is_alphanumeric() || c == '_');
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake_repository::FakeRepository;
    use chrono::{DateTime, TimeZone};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, minute, 0).unwrap()
    }

    fn repository() -> FakeRepository {
        FakeRepository {
            devices: vec![("gps-1".to_string(), "Trimble NetR9".to_string())],
            field_types: vec![FieldType {
                type_id: "voltage".to_string(),
                display: "V".to_string(),
                scale: 0.001,
            }],
            thresholds: vec![("gps-1".to_string(), "voltage".to_string(), 11000.0, 14000.0)],
            tags: vec!["NZ".to_string(), "TAUP".to_string()],
            field_metrics: vec![Point::new(at(0), 12000.0), Point::new(at(1), 12500.0)],
            latest: Some(Point::new(at(1), 12600.0)),
            ..FakeRepository::new()
        }
    }

    #[tokio::test]
    async fn test_csv_applies_scale_once() {
        let svc = FieldMetricService::new(Arc::new(repository()));

        let csv = svc
            .csv("gps-1", "voltage", Resolution::Full, None, Some("2024-06-02T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "time,value\n2024/06/01 08:00:00,12.00\n2024/06/01 08:01:00,12.50\n"
        );
    }

    #[tokio::test]
    async fn test_unknown_device_or_type_is_not_found() {
        let repo = Arc::new(repository());
        let svc = FieldMetricService::new(repo.clone());

        let err = svc
            .csv("gps-9", "voltage", Resolution::Minute, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = svc
            .plot_model("gps-1", "humidity", Resolution::Minute, PlotStyle::Line)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_plot_model() {
        let svc = FieldMetricService::new(Arc::new(repository()));

        let plot = svc
            .plot_model("gps-1", "voltage", Resolution::FiveMinutes, PlotStyle::Line)
            .await
            .unwrap();

        assert_eq!(plot.title(), "Device: gps-1, Model: Trimble NetR9, Metric: Voltage");
        assert_eq!(plot.subtitle(), "Tags: NZ,TAUP");
        assert_eq!(plot.unit(), "V");
        assert_eq!(plot.threshold(), Some((11.0, 14.0)));
        assert_eq!(plot.x_axis().unwrap().width(), Duration::hours(48));
        assert_eq!(plot.x_label(), "48 hours");

        let values: Vec<_> = plot.series()[0].points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![12.0, 12.5, 12.6]);
        assert_eq!(plot.latest().unwrap().point.value, 12.6);
        assert_eq!(plot.labels().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_threshold_is_ignored() {
        let mut repo = repository();
        repo.thresholds = vec![("gps-1".to_string(), "voltage".to_string(), 0.0, 0.0)];
        let svc = FieldMetricService::new(Arc::new(repo));

        let plot = svc
            .plot_model("gps-1", "voltage", Resolution::Minute, PlotStyle::Scatter)
            .await
            .unwrap();
        assert_eq!(plot.threshold(), None);
    }

    #[tokio::test]
    async fn test_full_resolution_not_plottable() {
        let svc = FieldMetricService::new(Arc::new(repository()));
        let err = svc
            .plot_model("gps-1", "voltage", Resolution::Full, PlotStyle::Line)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidResolution(_)));
    }

    #[tokio::test]
    async fn test_spark_is_unscaled_five_minutes() {
        let repo = Arc::new(repository());
        let svc = FieldMetricService::new(repo.clone());

        let plot = svc
            .plot_model("gps-1", "voltage", Resolution::Hour, PlotStyle::Spark)
            .await
            .unwrap();

        assert_eq!(plot.series()[0].points[0].value, 12000.0);
        assert_eq!(repo.calls(), vec!["field_metrics gps-1 voltage five_minutes"]);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("voltage"), "Voltage");
        assert_eq!(title_case("disk usage"), "Disk Usage");
        assert_eq!(title_case("voltage.battery"), "Voltage.Battery");
        assert_eq!(title_case("snr_l1-mean"), "Snr_l1-Mean");
    }
}
