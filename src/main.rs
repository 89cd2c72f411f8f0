// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::app_metric_service::AppMetricService;
use crate::application::field_metric_service::FieldMetricService;
use crate::domain::metric::BuiltinPalette;
use crate::infrastructure::config::{load_influx_config, load_plots_config};
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::infrastructure::svg_drawer::SvgDrawer;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    app_metric_csv, app_metric_svg, app_overview, field_metric_csv, field_metric_svg, health_check,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let influx_config = load_influx_config()?;
    let plots_config = load_plots_config()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(InfluxRepository::new(
        &influx_config.influx,
        plots_config.catalog.clone(),
    ));

    // Create services (application layer)
    let app_metric_service = AppMetricService::new(
        repository.clone(),
        Arc::new(BuiltinPalette),
        plots_config.palette.clone(),
        plots_config.query.deadline(),
    );
    let field_metric_service = FieldMetricService::new(repository);

    let state = Arc::new(AppState {
        app_metric_service,
        field_metric_service,
        drawer: Arc::new(SvgDrawer::new()),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/app/metric.svg", get(app_metric_svg))
        .route("/app/metric.csv", get(app_metric_csv))
        .route("/app/overview", get(app_overview))
        .route("/field/metric.svg", get(field_metric_svg))
        .route("/field/metric.csv", get(field_metric_csv))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = plots_config.server.bind.parse()?;
    tracing::info!("Starting metric-plots service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
