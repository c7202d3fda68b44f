use nourish::time_series::SeriesPoint;

/// Mood and urge are scored on 0..=5.
pub const SCORE_MAX: f64 = 5.0;

/// Upper X bound for a trend chart holding `points` active days.
pub fn compute_x_bound(points: usize) -> f64 {
    (points.saturating_sub(1) as f64).max(1.0)
}

pub fn to_tuples(series: &[SeriesPoint]) -> Vec<(f64, f64)> {
    series.iter().map(|p| (*p).into()).collect()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_x_bound() {
        assert_eq!(compute_x_bound(0), 1.0);
        assert_eq!(compute_x_bound(1), 1.0);
        assert_eq!(compute_x_bound(14), 13.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }

    #[test]
    fn test_to_tuples() {
        let s = vec![SeriesPoint::new(0.0, 3.5)];
        assert_eq!(to_tuples(&s), vec![(0.0, 3.5)]);
    }
}
