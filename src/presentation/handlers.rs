// HTTP request handlers
use crate::application::app_metric_service::{AppMetricRequest, OverviewSection};
use crate::application::plot_drawer::PlotStyle;
use crate::domain::metric::MetricGroup;
use crate::domain::resolution::Resolution;
use crate::domain::time_window::{resolve_now, WindowProfile};
use crate::error::{AppError, AppResult};
use crate::infrastructure::http_response::{csv_response, svg_response};
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{Query, State},
    http::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct AppMetricQuery {
    #[serde(rename = "applicationID")]
    pub application_id: Option<String>,
    pub group: Option<String>,
    pub resolution: Option<String>,
    #[serde(rename = "sourceID")]
    pub source_id: Option<String>,
    pub yrange: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    #[serde(rename = "applicationID")]
    pub application_id: Option<String>,
    pub groups: Option<String>,
    pub resolution: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FieldMetricQuery {
    #[serde(rename = "deviceID")]
    pub device_id: Option<String>,
    #[serde(rename = "typeID")]
    pub type_id: Option<String>,
    pub resolution: Option<String>,
    pub plot: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn app_metric_svg(
    Query(query): Query<AppMetricQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response<Body>> {
    let request = app_request(&query)?;
    let (plot, style) = state
        .app_metric_service
        .plot_model(&request, query.yrange.as_deref())
        .await?;

    Ok(svg_response(state.drawer.draw(&plot, style)?)?)
}

pub async fn app_metric_csv(
    Query(query): Query<AppMetricQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response<Body>> {
    let request = app_request(&query)?;
    let body = state
        .app_metric_service
        .csv(&request, query.start_date.as_deref(), query.end_date.as_deref())
        .await?;

    Ok(csv_response(body)?)
}

pub async fn app_overview(
    Query(query): Query<OverviewQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<OverviewSection>>> {
    let application_id = required(query.application_id.as_deref(), "applicationID")?;
    let groups = MetricGroup::parse_list(query.groups.as_deref().unwrap_or_default())?;
    let resolution = Resolution::parse(query.resolution.as_deref().unwrap_or_default())?;
    let range = resolve_now(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        resolution,
        WindowProfile::Export,
    )?;

    let sections = state
        .app_metric_service
        .overview(application_id, &groups, resolution, range)
        .await?;

    Ok(Json(sections))
}

pub async fn field_metric_svg(
    Query(query): Query<FieldMetricQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response<Body>> {
    let device_id = required(query.device_id.as_deref(), "deviceID")?;
    let type_id = required(query.type_id.as_deref(), "typeID")?;
    let style = plot_style(query.plot.as_deref());
    let resolution = Resolution::parse(query.resolution.as_deref().unwrap_or_default())?;

    let plot = state
        .field_metric_service
        .plot_model(device_id, type_id, resolution, style)
        .await?;

    Ok(svg_response(state.drawer.draw(&plot, style)?)?)
}

pub async fn field_metric_csv(
    Query(query): Query<FieldMetricQuery>,
    State(state): State<Arc<AppState>>,
) -> AppResult<Response<Body>> {
    let device_id = required(query.device_id.as_deref(), "deviceID")?;
    let type_id = required(query.type_id.as_deref(), "typeID")?;
    let resolution = Resolution::parse(query.resolution.as_deref().unwrap_or_default())?;

    let body = state
        .field_metric_service
        .csv(
            device_id,
            type_id,
            resolution,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
        )
        .await?;

    Ok(csv_response(body)?)
}

fn app_request(query: &AppMetricQuery) -> AppResult<AppMetricRequest> {
    let application_id = required(query.application_id.as_deref(), "applicationID")?;
    let group = MetricGroup::parse(query.group.as_deref().unwrap_or_default())?;
    let resolution = Resolution::parse(query.resolution.as_deref().unwrap_or_default())?;

    let limit = match query.limit.as_deref().filter(|l| !l.is_empty()) {
        Some(limit) => Some(
            limit
                .parse::<usize>()
                .map_err(|_| AppError::bad_input("invalid value for limit"))?,
        ),
        None => None,
    };

    let mut request = AppMetricRequest::new(application_id, group, resolution);
    request.source_id = query.source_id.clone();
    request.limit = limit;
    Ok(request)
}

fn required<'a>(value: Option<&'a str>, name: &str) -> AppResult<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_input(format!("missing {}", name)))
}

/// Anything other than line or scatter draws a spark.
fn plot_style(value: Option<&str>) -> PlotStyle {
    match value.unwrap_or_default() {
        "" | "line" => PlotStyle::Line,
        "scatter" => PlotStyle::Scatter,
        _ => PlotStyle::Spark,
    }
}
