use serde::Serialize;

use crate::aggregate::TrendPoint;
use crate::util::{mean_present, round_tenth};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
}

impl SeriesPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for SeriesPoint {
    fn from(v: (f64, f64)) -> Self {
        SeriesPoint { x: v.0, y: v.1 }
    }
}

impl From<SeriesPoint> for (f64, f64) {
    fn from(p: SeriesPoint) -> Self {
        (p.x, p.y)
    }
}

fn series_of<F>(points: &[TrendPoint], field: F) -> Vec<SeriesPoint>
where
    F: Fn(&TrendPoint) -> Option<f64>,
{
    points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| field(p).map(|y| SeriesPoint::new(i as f64, y)))
        .collect()
}

/// Mood averages indexed by position in the window; days without a mood are
/// left out so charts don't dip to zero.
pub fn mood_series(points: &[TrendPoint]) -> Vec<SeriesPoint> {
    series_of(points, |p| p.mood_avg)
}

pub fn urge_series(points: &[TrendPoint]) -> Vec<SeriesPoint> {
    series_of(points, |p| p.urge_avg)
}

/// Headline averages for a trend window, rounded to one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrendOverview {
    pub days: usize,
    pub mood_avg: Option<f64>,
    pub urge_avg: Option<f64>,
}

impl TrendOverview {
    pub fn from_points(points: &[TrendPoint]) -> Self {
        Self {
            days: points.len(),
            mood_avg: mean_present(points.iter().map(|p| p.mood_avg)).map(round_tenth),
            urge_avg: mean_present(points.iter().map(|p| p.urge_avg)).map(round_tenth),
        }
    }
}
