//! Bar-chart view model for a prediction.

use serde::Serialize;

use crate::{PredictionResult, NUM_CLASSES};

/// One bar of the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarRow {
    /// Class label (0-9).
    pub label: u8,
    /// Bar length as a fraction of the track, in `[0, 1]`.
    pub width_fraction: f64,
    /// Whether this class is the service's pick.
    pub is_winner: bool,
}

impl BarRow {
    /// Bar length as a CSS percentage.
    #[must_use]
    pub fn width_percent(&self) -> f64 {
        self.width_fraction * 100.0
    }
}

/// Fixed-length chart, one row per class in class order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartViewModel {
    /// Rows, `rows[i].label == i`.
    pub rows: Vec<BarRow>,
}

impl ChartViewModel {
    /// The highlighted row, if any.
    #[must_use]
    pub fn winner(&self) -> Option<&BarRow> {
        self.rows.iter().find(|row| row.is_winner)
    }

    /// Rows ordered by descending width; ties keep class order.
    #[must_use]
    pub fn ranked(&self) -> Vec<BarRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| b.width_fraction.total_cmp(&a.width_fraction));
        rows
    }
}

/// Map an optional result to the chart.
///
/// Without a result every bar is empty and nothing is highlighted. Widths are
/// clamped to `[0, 1]`; absent probabilities render as empty bars.
#[must_use]
pub fn to_view_model(result: Option<&PredictionResult>) -> ChartViewModel {
    let probabilities = result.map(PredictionResult::probabilities_or_zero);
    let winner = result.map(|r| r.digit.index());

    let rows = (0..NUM_CLASSES)
        .map(|class| BarRow {
            #[allow(clippy::cast_possible_truncation)]
            label: class as u8,
            width_fraction: probabilities.map_or(0.0, |p| clamp_unit(p.get(class))),
            is_winner: winner == Some(class),
        })
        .collect();

    ChartViewModel { rows }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(digit: i64, probabilities: Option<&[f64]>) -> PredictionResult {
        PredictionResult::new(digit, probabilities).expect("valid result")
    }

    #[test]
    fn empty_chart_without_result() {
        let chart = to_view_model(None);
        assert_eq!(chart.rows.len(), NUM_CLASSES);
        assert!(chart.rows.iter().all(|r| r.width_fraction == 0.0 && !r.is_winner));
        assert!(chart.winner().is_none());
    }

    #[test]
    fn seven_wins_at_ninety_two_percent() {
        let probs = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.92, 0.05, 0.03];
        let chart = to_view_model(Some(&result(7, Some(&probs))));

        let winner = chart.winner().expect("winner");
        assert_eq!(winner.label, 7);
        assert!((winner.width_percent() - 92.0).abs() < 1e-9);
        assert!((chart.rows[8].width_fraction - 0.05).abs() < f64::EPSILON);
        assert!((chart.rows[9].width_fraction - 0.03).abs() < f64::EPSILON);
        assert_eq!(chart.rows.iter().filter(|r| r.is_winner).count(), 1);
    }

    #[test]
    fn digit_without_probabilities_has_empty_bars() {
        let chart = to_view_model(Some(&result(3, None)));
        assert_eq!(chart.winner().map(|r| r.label), Some(3));
        assert!(chart.rows.iter().all(|r| r.width_fraction == 0.0));
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        let probs = [1.5, -0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let chart = to_view_model(Some(&result(0, Some(&probs))));
        assert!((chart.rows[0].width_fraction - 1.0).abs() < f64::EPSILON);
        assert!(chart.rows[1].width_fraction.abs() < f64::EPSILON);
    }

    #[test]
    fn ranked_orders_by_width() {
        let probs = [0.1, 0.0, 0.6, 0.0, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0];
        let chart = to_view_model(Some(&result(2, Some(&probs))));
        let labels: Vec<u8> = chart.ranked().iter().take(3).map(|r| r.label).collect();
        assert_eq!(labels, vec![2, 4, 0]);
        // Ties keep class order
        assert_eq!(chart.ranked()[3].label, 1);
    }

    proptest! {
        #[test]
        fn widths_mirror_probabilities(
            probs in proptest::collection::vec(0.0f64..=1.0, NUM_CLASSES),
            digit in 0i64..10,
        ) {
            let chart = to_view_model(Some(&result(digit, Some(&probs))));
            prop_assert_eq!(chart.rows.len(), NUM_CLASSES);
            for (i, row) in chart.rows.iter().enumerate() {
                prop_assert_eq!(usize::from(row.label), i);
                prop_assert_eq!(row.width_fraction, probs[i]);
                prop_assert_eq!(row.is_winner, i64::try_from(i).ok() == Some(digit));
            }
            prop_assert_eq!(chart.rows.iter().filter(|r| r.is_winner).count(), 1);
        }
    }
}
