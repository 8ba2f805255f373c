use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

pub fn closes(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

pub fn highs(bars: &[DailyBar]) -> Vec<f64> {
    bars.iter().map(|b| b.high).collect()
}

pub fn last_close(bars: &[DailyBar]) -> Option<f64> {
    bars.last().map(|b| b.close)
}

#[cfg(test)]
pub fn synthetic_series(len: usize) -> Vec<DailyBar> {
    // A deterministic drifting series with a mild oscillation, for tests.
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    (0..len)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + t * 0.5 + (t * 0.7).sin() * 2.0;
            DailyBar {
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.5,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000.0 + t * 10.0,
            }
        })
        .collect()
}
