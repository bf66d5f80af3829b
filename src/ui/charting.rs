/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(wpm_coords: &[(f64, f64)], elapsed: Option<f64>) -> (f64, f64) {
    let highest_wpm = wpm_coords
        .iter()
        .map(|&(_, wpm)| wpm)
        .fold(0.0_f64, f64::max);

    let overall_duration = match wpm_coords.last() {
        Some(&(t, _)) => t.max(elapsed.unwrap_or(0.0)),
        None => elapsed.unwrap_or(1.0),
    };

    (overall_duration.max(1.0), highest_wpm.round())
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
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], Some(5.0));
        assert_eq!(x, 5.0);
        assert_eq!(y, 0.0);
        assert_eq!(compute_chart_params(&[], None), (1.0, 0.0));
    }

    #[test]
    fn test_compute_chart_params_samples() {
        let samples = [(1.0, 30.0), (2.0, 61.6), (3.0, 55.0)];
        assert_eq!(compute_chart_params(&samples, Some(3.4)), (3.4, 62.0));
        assert_eq!(compute_chart_params(&[(0.3, 12.0)], Some(0.3)), (1.0, 12.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
