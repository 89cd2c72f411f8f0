// SVG drawer - Line, scatter and spark renderings of a plot model
use crate::application::plot_drawer::{PlotDrawer, PlotStyle};
use crate::domain::plot::PlotModel;
use chrono::DateTime;
use plotters::prelude::*;

const PLOT_SIZE: (u32, u32) = (860, 360);
const SPARK_SIZE: (u32, u32) = (100, 20);
const FONT: &str = "sans-serif";

const THRESHOLD_FILL: RGBColor = RGBColor(0xe5, 0xf5, 0xe0);
const AXIS_TIME_FORMAT: &str = "%m/%d %H:%M";

#[derive(Debug, Default, Clone, Copy)]
pub struct SvgDrawer;

impl SvgDrawer {
    pub fn new() -> Self {
        Self
    }
}

impl PlotDrawer for SvgDrawer {
    fn draw(&self, plot: &PlotModel, style: PlotStyle) -> anyhow::Result<String> {
        match style {
            PlotStyle::Spark => draw_spark(plot),
            PlotStyle::Line | PlotStyle::Scatter => draw_plot(plot, style),
        }
    }
}

fn draw_plot(plot: &PlotModel, style: PlotStyle) -> anyhow::Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PLOT_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let area = root.titled(plot.title(), (FONT, 16).into_font())?;
        let area = if plot.subtitle().is_empty() {
            area
        } else {
            area.titled(plot.subtitle(), (FONT, 12).into_font())?
        };

        let (start, end) = x_bounds(plot);
        let (min, max) = y_bounds(plot);

        let mut chart = ChartBuilder::on(&area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(start..end, min..max)?;

        chart
            .configure_mesh()
            .light_line_style(WHITE)
            .x_desc(plot.x_label())
            .y_desc(plot.unit())
            .x_labels(6)
            .y_labels(6)
            .x_label_formatter(&|t| format_time(*t))
            .draw()?;

        if let Some((lower, upper)) = plot.threshold() {
            chart.draw_series(std::iter::once(Rectangle::new(
                [(start, upper), (end, lower)],
                THRESHOLD_FILL.filled(),
            )))?;
        }

        for (series, label) in plot.labeled_series() {
            let colour = rgb(&series.colour);
            let legend_colour = rgb(&label.colour);
            let coords = series.points.iter().map(|p| (p.time.timestamp(), p.value));

            let anno = match style {
                PlotStyle::Scatter => {
                    chart.draw_series(coords.map(|c| Circle::new(c, 2, colour.filled())))?
                }
                _ => chart.draw_series(LineSeries::new(coords, colour.stroke_width(1)))?,
            };
            anno.label(label.text.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 10, y + 4)], legend_colour.filled()));
        }

        if let Some(latest) = plot.latest() {
            chart.draw_series(std::iter::once(Circle::new(
                (latest.point.time.timestamp(), latest.point.value),
                4,
                rgb(&latest.colour).filled(),
            )))?;
        }

        if !plot.labels().is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .label_font((FONT, 11).into_font())
                .draw()?;
        }

        root.present()?;
    }
    Ok(svg)
}

fn draw_spark(plot: &PlotModel) -> anyhow::Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SPARK_SIZE).into_drawing_area();
        let (start, end) = x_bounds(plot);
        let (min, max) = y_bounds(plot);

        let mut chart = ChartBuilder::on(&root)
            .margin(1)
            .build_cartesian_2d(start..end, min..max)?;

        for series in plot.series().iter().filter(|s| !s.points.is_empty()) {
            let coords = series.points.iter().map(|p| (p.time.timestamp(), p.value));
            chart.draw_series(LineSeries::new(coords, rgb(&series.colour).stroke_width(1)))?;
        }

        root.present()?;
    }
    Ok(svg)
}

/// Unix seconds spanned by the x axis, or by the data when no axis is set.
fn x_bounds(plot: &PlotModel) -> (i64, i64) {
    let (start, end) = match plot.x_axis() {
        Some(range) => (range.start.timestamp(), range.end.timestamp()),
        None => {
            let mut times = plot
                .series()
                .iter()
                .flat_map(|s| s.points.iter().map(|p| p.time.timestamp()));
            match times.next() {
                Some(first) => times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))),
                None => (0, 1),
            }
        }
    };
    (start, end.max(start + 1))
}

/// Fixed y axis, else the data and threshold extent.
fn y_bounds(plot: &PlotModel) -> (f64, f64) {
    let (min, max) = match plot.y_axis() {
        Some(range) => range,
        None => {
            let mut values = plot
                .series()
                .iter()
                .flat_map(|s| s.points.iter().map(|p| p.value))
                .chain(plot.threshold().into_iter().flat_map(|(l, u)| [l, u]));
            match values.next() {
                Some(first) => values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))),
                None => (0.0, 1.0),
            }
        }
    };
    if max <= min {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn format_time(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .map(|t| t.format(AXIS_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// `#rrggbb` or one of the colour names the services hand out.
fn rgb(colour: &str) -> RGBColor {
    if let Some(hex) = colour.strip_prefix('#') {
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
        };
        if let (6, Some(r), Some(g), Some(b)) = (hex.len(), channel(0), channel(2), channel(4)) {
            return RGBColor(r, g, b);
        }
    }

    match colour {
        "deepskyblue" => RGBColor(0, 191, 255),
        "lightgrey" => RGBColor(211, 211, 211),
        "grey" => RGBColor(128, 128, 128),
        "red" => RGBColor(255, 0, 0),
        "green" => RGBColor(0, 128, 0),
        "blue" => RGBColor(0, 0, 255),
        "white" => RGBColor(255, 255, 255),
        _ => RGBColor(0, 0, 0),
    }
}
