// Application state for HTTP handlers
use crate::application::app_metric_service::AppMetricService;
use crate::application::field_metric_service::FieldMetricService;
use crate::application::plot_drawer::PlotDrawer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub app_metric_service: AppMetricService,
    pub field_metric_service: FieldMetricService,
    pub drawer: Arc<dyn PlotDrawer>,
}
