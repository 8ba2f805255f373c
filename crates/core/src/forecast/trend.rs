use crate::domain::snapshot::HighForecastPoint;
use crate::forecast::linalg::ridge_least_squares;
use crate::market::bars::{self, DailyBar};
use chrono::{Datelike, Duration, NaiveDate};
use ndarray::{Array1, Array2};

const RIDGE_LAMBDA: f64 = 1e-4;
// Intercept + slope + six day-of-week offsets (Sunday is the baseline).
const FEATURES: usize = 8;

/// Next-day closing-price estimate from a linear-trend plus weekly
/// seasonality fit over the whole series. Refit on every call.
pub fn next_close_forecast(bars: &[DailyBar]) -> Option<f64> {
    let closes = bars::closes(bars);
    let fit = fit_series(bars, &closes)?;
    let last = bars.last()?;
    let value = fit.predict(bars.len(), last.date + Duration::days(1));
    value.is_finite().then_some(value)
}

/// Multi-day forecast of daily highs from the same model family. Empty
/// input or a degenerate fit yields an empty sequence.
pub fn high_forecast(bars: &[DailyBar], periods: usize) -> Vec<HighForecastPoint> {
    let highs = bars::highs(bars);
    let (Some(fit), Some(last)) = (fit_series(bars, &highs), bars.last()) else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(periods);
    for step in 1..=periods {
        let date = last.date + Duration::days(step as i64);
        let value = fit.predict(bars.len() + step - 1, date);
        if !value.is_finite() {
            return Vec::new();
        }
        out.push(HighForecastPoint { date, value });
    }
    out
}

struct TrendFit {
    weights: Array1<f64>,
}

impl TrendFit {
    fn predict(&self, t: usize, date: NaiveDate) -> f64 {
        let row = feature_row(t, date);
        row.iter()
            .zip(self.weights.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

fn fit_series(bars: &[DailyBar], values: &[f64]) -> Option<TrendFit> {
    if bars.is_empty() || bars.len() != values.len() {
        return None;
    }

    let mut x = Array2::zeros((bars.len(), FEATURES));
    for (i, bar) in bars.iter().enumerate() {
        let row = feature_row(i, bar.date);
        for (j, v) in row.iter().enumerate() {
            x[[i, j]] = *v;
        }
    }
    let y = Array1::from_vec(values.to_vec());

    let weights = ridge_least_squares(&x, &y, RIDGE_LAMBDA)?;
    Some(TrendFit { weights })
}

fn feature_row(t: usize, date: NaiveDate) -> [f64; FEATURES] {
    let mut row = [0.0; FEATURES];
    row[0] = 1.0;
    row[1] = t as f64;
    let dow = date.weekday().num_days_from_sunday() as usize;
    if dow > 0 {
        row[1 + dow] = 1.0;
    }
    row
}
