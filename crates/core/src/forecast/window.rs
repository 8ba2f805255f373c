use crate::forecast::linalg::ridge_least_squares;
use crate::forecast::LOOK_BACK;
use crate::market::bars::{self, DailyBar};
use ndarray::{Array1, Array2};

const RIDGE_LAMBDA: f64 = 1e-2;

/// Next-day closing-price estimate from an autoregressive fit over
/// min-max-scaled closes: every run of `LOOK_BACK` consecutive closes
/// predicts the one after it. Needs at least `LOOK_BACK + 1` bars; fewer
/// yields `None` rather than an error.
pub fn next_close_forecast(bars: &[DailyBar]) -> Option<f64> {
    if bars.len() <= LOOK_BACK {
        return None;
    }

    let closes = bars::closes(bars);
    let (scaled, min, range) = min_max_scale(&closes)?;
    if range < 1e-12 {
        // Flat series: nothing to regress on, the last close is the forecast.
        return closes.last().copied();
    }

    let rows = scaled.len() - LOOK_BACK;
    let mut x = Array2::zeros((rows, LOOK_BACK));
    let mut y = Array1::zeros(rows);
    for i in 0..rows {
        for j in 0..LOOK_BACK {
            x[[i, j]] = scaled[i + j];
        }
        y[i] = scaled[i + LOOK_BACK];
    }

    let weights = ridge_least_squares(&x, &y, RIDGE_LAMBDA)?;

    let last_window = &scaled[scaled.len() - LOOK_BACK..];
    let predicted_scaled: f64 = last_window
        .iter()
        .zip(weights.iter())
        .map(|(a, b)| a * b)
        .sum();

    let predicted = predicted_scaled * range + min;
    predicted.is_finite().then_some(predicted)
}

fn min_max_scale(values: &[f64]) -> Option<(Vec<f64>, f64, f64)> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    let range = max - min;
    let scaled = if range < 1e-12 {
        vec![0.0; values.len()]
    } else {
        values.iter().map(|v| (v - min) / range).collect()
    };
    Some((scaled, min, range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::bars::synthetic_series;

    #[test]
    fn short_history_yields_the_sentinel() {
        let bars = synthetic_series(LOOK_BACK);
        assert!(next_close_forecast(&bars).is_none());
        assert!(next_close_forecast(&[]).is_none());
    }

    #[test]
    fn minimum_history_yields_a_finite_estimate() {
        let bars = synthetic_series(LOOK_BACK + 1);
        let predicted = next_close_forecast(&bars).unwrap();
        assert!(predicted.is_finite());
    }

    #[test]
    fn estimate_stays_near_a_smooth_series() {
        let bars = synthetic_series(120);
        let predicted = next_close_forecast(&bars).unwrap();
        let last = bars.last().unwrap().close;
        // A smooth drifting series should not produce a wild extrapolation.
        assert!((predicted - last).abs() < last * 0.5, "got {predicted} vs {last}");
    }

    #[test]
    fn flat_series_predicts_the_flat_price() {
        let mut bars = synthetic_series(90);
        for bar in &mut bars {
            bar.close = 250.0;
        }
        let predicted = next_close_forecast(&bars).unwrap();
        assert_eq!(predicted, 250.0);
    }
}
