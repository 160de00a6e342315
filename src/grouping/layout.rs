//! Normalized chart geometry for grouped levels
//!
//! Bars sit on integer ticks `1..=N`. Everything drawn outside the plot area
//! (separators and group labels) uses axis-relative coordinates where the plot
//! spans `0.0..=1.0` in both directions.
//!
//! Label rows start at `FIRST_ROW_Y` for the level nearest the bars and climb
//! by `ROW_STEP` towards the root, so no row is drawn inside the plot area.

use super::GroupedLevels;
use serde::Serialize;

/// Height of the leaf separators below the x axis
pub const LEAF_SEPARATOR_Y: (f64, f64) = (-0.1, 0.0);
/// Row of the group labels nearest to the bars
pub const FIRST_ROW_Y: f64 = 1.02;
/// Vertical distance between two label rows
pub const ROW_STEP: f64 = 0.1;

/// One row of group labels above the plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRow {
    /// Axis-relative height of the labels
    pub y: f64,
    /// Label text with its axis-relative centre
    pub labels: Vec<(String, f64)>,
    /// Axis-relative x of every group boundary, closing boundary included
    pub separators: Vec<f64>,
    /// Vertical extent of the separators
    pub separator_y: (f64, f64),
}

/// Everything a renderer needs to draw a grouped bar chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartLayout {
    pub ticks: Vec<usize>,
    pub tick_labels: Vec<String>,
    pub values: Vec<f64>,
    pub xlim: (f64, f64),
    /// Axis-relative width of one bar slot, `1 / N`
    pub scale: f64,
    pub leaf_separators: Vec<f64>,
    pub leaf_separator_y: (f64, f64),
    /// Label rows, nearest to the bars first
    pub rows: Vec<LabelRow>,
}

impl ChartLayout {
    pub fn bar_count(&self) -> usize {
        self.ticks.len()
    }

    /// Axis-relative height of the topmost label row
    pub fn top(&self) -> f64 {
        self.rows.last().map_or(1.0, |row| row.separator_y.1.max(row.y))
    }
}

/// Compute tick positions, separators and label rows for `grouped`
pub fn layout_coordinates(grouped: &GroupedLevels) -> ChartLayout {
    let n = grouped.leaf_count();
    let scale = if n == 0 { 0.0 } else { 1.0 / n as f64 };

    let leaf_separators = (0..=n).map(|pos| pos as f64 * scale).collect();

    let rows = grouped
        .ancestors
        .iter()
        .enumerate()
        .map(|(depth, level)| {
            let y = FIRST_ROW_Y + depth as f64 * ROW_STEP;
            let mut offset = 0usize;
            let mut labels = Vec::with_capacity(level.len());
            let mut separators = Vec::with_capacity(level.len() + 1);

            for group in &level.groups {
                labels.push((group.label.clone(), (offset as f64 + group.span as f64 / 2.0) * scale));
                separators.push(offset as f64 * scale);
                offset += group.span;
            }
            separators.push(offset as f64 * scale);

            LabelRow {
                y,
                labels,
                separators,
                separator_y: (y - 0.02, y - 0.02 + ROW_STEP),
            }
        })
        .collect();

    ChartLayout {
        ticks: (1..=n).collect(),
        tick_labels: grouped.leaves.iter().map(|(key, _)| key.clone()).collect(),
        values: grouped.leaves.iter().map(|(_, value)| *value).collect(),
        xlim: (0.5, n as f64 + 0.5),
        scale,
        leaf_separators,
        leaf_separator_y: LEAF_SEPARATOR_Y,
        rows,
    }
}
