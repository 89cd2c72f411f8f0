// Application metric service - Builds plots for application metric groups
use crate::application::fan_in::{collect_within, fan_in};
use crate::application::metric_repository::MetricRepository;
use crate::application::plot_drawer::PlotStyle;
use crate::domain::aggregation::{aggregate, aggregate_counting_points, AggregatedRow};
use crate::domain::assembly::{ColourPolicy, KeyOrder, PlotAssembler, SeriesEntry};
use crate::domain::metric::{type_id, InstanceKey, KeyPalette, MetricGroup, MEMORY_TYPES};
use crate::domain::plot::PlotModel;
use crate::domain::ranking::{rank, top};
use crate::domain::resolution::Resolution;
use crate::domain::table;
use crate::domain::time_window::{resolve_now, TimeRange, WindowProfile};
use crate::error::{AppError, AppResult};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TIMER_SERIES_COLOUR: &str = "#e34a33";
const TIMER_LABEL_COLOUR: &str = "lightgrey";

#[derive(Debug, Clone)]
pub struct AppMetricRequest {
    pub application_id: String,
    pub group: MetricGroup,
    pub source_id: Option<String>,
    pub resolution: Resolution,
    /// Keep only the busiest timer sources.
    pub limit: Option<usize>,
}

impl AppMetricRequest {
    pub fn new(application_id: impl Into<String>, group: MetricGroup, resolution: Resolution) -> Self {
        Self {
            application_id: application_id.into(),
            group,
            source_id: None,
            resolution,
            limit: None,
        }
    }

    fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref().filter(|s| !s.is_empty())
    }
}

/// One group of the overview: a plot, or why it could not be built.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewSection {
    pub group: MetricGroup,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<PlotModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AppMetricService {
    repository: Arc<dyn MetricRepository>,
    palette: Arc<dyn KeyPalette>,
    colours: Arc<Vec<String>>,
    deadline: Duration,
}

impl AppMetricService {
    pub fn new(
        repository: Arc<dyn MetricRepository>,
        palette: Arc<dyn KeyPalette>,
        colours: Vec<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            repository,
            palette,
            colours: Arc::new(colours),
            deadline,
        }
    }

    /// Plot for the SVG entry point.
    pub async fn plot_model(
        &self,
        request: &AppMetricRequest,
        y_range: Option<&str>,
    ) -> AppResult<(PlotModel, PlotStyle)> {
        let profile = WindowProfile::AppPlot;
        let range = resolve_now(None, None, request.resolution, profile)?;
        let y_axis = y_range.filter(|y| !y.is_empty()).map(parse_y_range).transpose()?;

        let mut plot = self.load(request, &range).await?;

        plot.set_x_axis(range, profile.axis_label(request.resolution));
        if let Some((min, max)) = y_axis {
            plot.set_y_axis(min, max);
        }
        plot.set_title(self.title(request));

        let style = match request.group {
            MetricGroup::Timers => PlotStyle::Scatter,
            _ => PlotStyle::Line,
        };

        Ok((plot, style))
    }

    /// CSV export. Empty when there is no data in the window.
    pub async fn csv(
        &self,
        request: &AppMetricRequest,
        start: Option<&str>,
        end: Option<&str>,
    ) -> AppResult<Vec<u8>> {
        let range = resolve_now(start, end, request.resolution, WindowProfile::Export)?;
        let plot = self.load(request, &range).await?;
        Ok(table::render(&plot).to_csv()?)
    }

    /// Loads several groups concurrently. A group that fails is reported in
    /// its section and does not fail the others.
    pub async fn overview(
        &self,
        application_id: &str,
        groups: &[MetricGroup],
        resolution: Resolution,
        range: TimeRange,
    ) -> AppResult<Vec<OverviewSection>> {
        let mut sources = Vec::with_capacity(groups.len());
        let mut tasks = Vec::with_capacity(groups.len());

        for (index, group) in groups.iter().enumerate() {
            let (tx, rx) = mpsc::channel(1);
            let service = self.clone();
            let request = AppMetricRequest::new(application_id, *group, resolution);

            tasks.push(tokio::spawn(async move {
                let result = service.load(&request, &range).await;
                let _ = tx.send((index, request.group, result)).await;
            }));

            sources.push(rx);
        }

        let collected = collect_within(fan_in(sources), self.deadline).await;
        if collected.is_err() {
            // stop sub-queries still talking to the store
            for task in &tasks {
                task.abort();
            }
        }
        let mut results = collected?;
        results.sort_by_key(|(index, _, _)| *index);

        Ok(results
            .into_iter()
            .map(|(_, group, result)| match result {
                Ok(plot) => OverviewSection {
                    group,
                    plot: Some(plot),
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("overview section {} failed: {}", group, e);
                    OverviewSection {
                        group,
                        plot: None,
                        error: Some(e.public_message()),
                    }
                }
            })
            .collect())
    }

    /// Aggregates one group into a fresh plot.
    pub async fn load(&self, request: &AppMetricRequest, range: &TimeRange) -> AppResult<PlotModel> {
        let mut plot = PlotModel::new();
        let app = request.application_id.as_str();

        match (request.group, request.source_id()) {
            (MetricGroup::Counters, _) => self.load_counters(app, request.resolution, range, &mut plot).await?,
            (MetricGroup::Timers, Some(source)) => {
                self.load_source_timers(app, source, request.resolution, range, &mut plot)
                    .await?
            }
            (MetricGroup::Timers, None) => {
                self.load_timers(app, request.resolution, range, request.limit, &mut plot)
                    .await?
            }
            (MetricGroup::Memory, _) => self.load_memory(app, request.resolution, range, &mut plot).await?,
            (MetricGroup::Objects, _) => {
                self.load_type_metrics(app, type_id::MEM_HEAP_OBJECTS, request.resolution, range, &mut plot)
                    .await?
            }
            (MetricGroup::Routines, _) => {
                self.load_type_metrics(app, type_id::ROUTINES, request.resolution, range, &mut plot)
                    .await?
            }
        }

        tracing::debug!(
            "loaded {} for {}: {} series",
            request.group,
            app,
            plot.series().len()
        );

        Ok(plot)
    }

    async fn load_counters(
        &self,
        application_id: &str,
        resolution: Resolution,
        range: &TimeRange,
        plot: &mut PlotModel,
    ) -> AppResult<()> {
        let rows = self.repository.counters(application_id, resolution, range).await?;
        let agg = aggregate(rows);

        let mut assembler = PlotAssembler::new();
        for (key, points) in agg.points.iter() {
            assembler.insert(
                *key,
                SeriesEntry::new(self.palette.display_name(*key), agg.total(key), points.clone())
                    .with_colour(self.palette.colour(*key)),
            );
        }
        assembler.emit(KeyOrder::Ascending, ColourPolicy::Keyed, plot);

        Ok(())
    }

    async fn load_timers(
        &self,
        application_id: &str,
        resolution: Resolution,
        range: &TimeRange,
        limit: Option<usize>,
        plot: &mut PlotModel,
    ) -> AppResult<()> {
        let rows = self.repository.timers(application_id, resolution, range).await?;
        let agg = aggregate(rows);

        // busiest sources first
        let ranked = match limit {
            Some(n) => top(&agg.totals, n),
            None => rank(&agg.totals),
        };

        let mut assembler = PlotAssembler::new();
        for (key, points) in agg.points.into_iter() {
            let total = agg.totals.get(&key).copied().unwrap_or(0);
            let name = key.strip_prefix("main.").unwrap_or(key.as_str()).to_string();
            assembler.insert(key, SeriesEntry::new(name, total, points));
        }
        assembler.emit(
            KeyOrder::Ranked(ranked),
            ColourPolicy::Uniform {
                series: TIMER_SERIES_COLOUR,
                label: TIMER_LABEL_COLOUR,
            },
            plot,
        );

        Ok(())
    }

    async fn load_source_timers(
        &self,
        application_id: &str,
        source_id: &str,
        resolution: Resolution,
        range: &TimeRange,
        plot: &mut PlotModel,
    ) -> AppResult<()> {
        let rows = self
            .repository
            .source_timers(application_id, source_id, resolution, range)
            .await?;

        let stats = rows.into_iter().flat_map(|r| {
            [
                AggregatedRow::new(type_id::AVG_MEAN, r.time, r.average),
                AggregatedRow::new(type_id::MAX_FIFTY, r.time, r.fifty),
                AggregatedRow::new(type_id::MAX_NINETY, r.time, r.ninety),
            ]
        });
        let agg = aggregate_counting_points(stats);

        let mut assembler = PlotAssembler::new();
        for (key, points) in agg.points.iter() {
            assembler.insert(
                *key,
                SeriesEntry::new(self.palette.display_name(*key), agg.total(key), points.clone())
                    .with_colour(self.palette.colour(*key)),
            );
        }
        assembler.emit(KeyOrder::Ascending, ColourPolicy::Keyed, plot);

        Ok(())
    }

    async fn load_memory(
        &self,
        application_id: &str,
        resolution: Resolution,
        range: &TimeRange,
        plot: &mut PlotModel,
    ) -> AppResult<()> {
        let rows = self
            .repository
            .instance_metrics(application_id, &MEMORY_TYPES, resolution, range)
            .await?;
        let agg = aggregate_counting_points(rows);

        let mut assembler = PlotAssembler::new();
        for (key, points) in agg.points.iter() {
            let display = self.palette.display_name(key.type_id);
            let display = display.strip_prefix("Mem ").unwrap_or(display.as_str());
            assembler.insert(
                key.clone(),
                SeriesEntry::new(
                    format!("{}.{}", key.instance_id, display),
                    agg.total(key),
                    points.clone(),
                )
                .with_colour(self.palette.colour(key.type_id)),
            );
        }
        assembler.emit(KeyOrder::Ascending, ColourPolicy::Keyed, plot);

        Ok(())
    }

    /// Single metric type across instances. An unknown application/type pair
    /// is `NotFound`; a known pair without data in the window is an empty plot.
    async fn load_type_metrics(
        &self,
        application_id: &str,
        metric_type: i32,
        resolution: Resolution,
        range: &TimeRange,
        plot: &mut PlotModel,
    ) -> AppResult<()> {
        if !self
            .repository
            .application_type_exists(application_id, metric_type)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "application {} has no metric type {}",
                application_id, metric_type
            )));
        }

        let rows = self
            .repository
            .instance_metrics(application_id, &[metric_type], resolution, range)
            .await?;
        let agg = aggregate_counting_points(rows);

        let mut assembler: PlotAssembler<InstanceKey> = PlotAssembler::new();
        for (key, points) in agg.points.iter() {
            assembler.insert(
                key.clone(),
                SeriesEntry::new(
                    format!("{}.{}", key.instance_id, self.palette.display_name(key.type_id)),
                    agg.total(key),
                    points.clone(),
                ),
            );
        }
        assembler.emit(KeyOrder::Ascending, ColourPolicy::RoundRobin(self.colours.as_slice()), plot);

        Ok(())
    }

    fn title(&self, request: &AppMetricRequest) -> String {
        let app = &request.application_id;
        let per = request.resolution.title();

        match (request.group, request.source_id()) {
            (MetricGroup::Counters, _) => {
                format!("Application: {}, Metric: Counters - Sum per {}", app, per)
            }
            (MetricGroup::Timers, Some(source)) => format!(
                "Application: {}, Source: {}, Metric: Timers - 90th Percentile (ms) per {}",
                app, source, per
            ),
            (MetricGroup::Timers, None) => format!(
                "Application: {}, Metric: Timers - 90th Percentile (ms) - Max per {}",
                app, per
            ),
            (MetricGroup::Memory, _) => format!(
                "Application: {}, Metric: Memory (bytes) - Average per {}",
                app, per
            ),
            (MetricGroup::Objects, _) => format!(
                "Application: {}, Metric: Memory Heap Objects (n) - Average per {}",
                app, per
            ),
            (MetricGroup::Routines, _) => format!(
                "Application: {}, Metric: Routines (n) - Average per {}",
                app, per
            ),
        }
    }
}

/// "min,max" -> (min, max)
fn parse_y_range(value: &str) -> AppResult<(f64, f64)> {
    let invalid = || AppError::bad_input("invalid yrange query param.");

    let (min, max) = value.split_once(',').ok_or_else(invalid)?;
    let min = min.trim().parse::<f64>().map_err(|_| invalid())?;
    let max = max.trim().parse::<f64>().map_err(|_| invalid())?;
    Ok((min, max))
}
