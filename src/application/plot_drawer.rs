// Drawing capability for plot models
use crate::domain::plot::PlotModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotStyle {
    Line,
    Scatter,
    Spark,
}

pub trait PlotDrawer: Send + Sync {
    /// Renders `plot` as an SVG document.
    fn draw(&self, plot: &PlotModel, style: PlotStyle) -> anyhow::Result<String>;
}
