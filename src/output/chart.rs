//! SVG rendering of grouped bar charts

use crate::error::{AppError, Result};
use crate::grouping::ChartLayout;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;

/// Pixel height of one label row above the plot
const LABEL_ROW_HEIGHT: u32 = 28;

/// Presentation settings for [`render_svg`]
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub y_desc: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            y_desc: String::new(),
            width: 1200,
            height: 700,
        }
    }
}

impl ChartOptions {
    pub fn new<T: Into<String>, Y: Into<String>>(title: T, y_desc: Y) -> Self {
        Self {
            title: title.into(),
            y_desc: y_desc.into(),
            ..Self::default()
        }
    }
}

fn render_error<E: std::fmt::Display>(error: E) -> AppError {
    AppError::render(error.to_string())
}

/// Value range of the y axis, always including zero and never empty
fn value_range(values: &[f64]) -> Range<f64> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let top = if max > 0.0 { max * 1.1 } else { 1.0 };
    let bottom = if min < 0.0 { min * 1.1 } else { 0.0 };
    bottom..top
}

/// Maps axis-relative coordinates onto the pixels of the plot area
struct AxisTransform {
    x: Range<i32>,
    y: Range<i32>,
}

impl AxisTransform {
    fn to_pixel(&self, ax: f64, ay: f64) -> (i32, i32) {
        let width = f64::from(self.x.end - self.x.start);
        let height = f64::from(self.y.end - self.y.start);
        (
            self.x.start + (ax * width).round() as i32,
            self.y.end - (ay * height).round() as i32,
        )
    }
}

/// Draw `layout` as an SVG file at `path`
pub fn render_svg(layout: &ChartLayout, options: &ChartOptions, path: &Path) -> Result<()> {
    if layout.bar_count() == 0 {
        return Err(AppError::render("there are no values to plot"));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::io(format!("Failed to create chart directory {}: {}", parent.display(), e))
        })?;
    }

    let root = SVGBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_error)?;

    let label_rows = u32::try_from(layout.rows.len()).unwrap_or(u32::MAX);
    let mut chart = ChartBuilder::on(&root)
        .caption(&options.title, ("sans-serif", 24))
        .margin(10)
        .margin_top(10 + LABEL_ROW_HEIGHT.saturating_mul(label_rows))
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(layout.xlim.0..layout.xlim.1, value_range(&layout.values))
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .y_desc(options.y_desc.as_str())
        .draw()
        .map_err(render_error)?;

    chart
        .draw_series(layout.ticks.iter().zip(&layout.values).map(|(tick, value)| {
            let x = *tick as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *value)], BLUE.mix(0.7).filled())
        }))
        .map_err(render_error)?;

    let (x, y) = chart.plotting_area().get_pixel_range();
    let axis = AxisTransform { x, y };

    // Bar labels hang below the axis, between the leaf separators
    let tick_style = TextStyle::from(("sans-serif", 13).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    for (tick, label) in layout.ticks.iter().zip(&layout.tick_labels) {
        let (px, py) = axis.to_pixel((*tick as f64 - 0.5) * layout.scale, 0.0);
        root.draw(&Text::new(label.as_str(), (px, py + 4), tick_style.clone()))
            .map_err(render_error)?;
    }
    for x in &layout.leaf_separators {
        draw_separator(&root, &axis, *x, layout.leaf_separator_y)?;
    }

    let label_style = TextStyle::from(("sans-serif", 15).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom));
    for row in &layout.rows {
        for (label, x) in &row.labels {
            let (px, py) = axis.to_pixel(*x, row.y);
            root.draw(&Text::new(label.as_str(), (px, py), label_style.clone()))
                .map_err(render_error)?;
        }
        for x in &row.separators {
            draw_separator(&root, &axis, *x, row.separator_y)?;
        }
    }

    root.present().map_err(render_error)?;
    Ok(())
}

fn draw_separator<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    axis: &AxisTransform,
    x: f64,
    (y_from, y_to): (f64, f64),
) -> Result<()> {
    let from = axis.to_pixel(x, y_from);
    let to = axis.to_pixel(x, y_to);
    root.draw(&PathElement::new(vec![from, to], BLACK))
        .map_err(render_error)
}
